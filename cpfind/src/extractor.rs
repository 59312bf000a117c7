use crate::error::Result;
use crate::feature_bundle::FeatureBundle;
use crate::photo::Photo;

/// Detects and describes keypoints in photos.
///
/// Implementations may parallelize internally, but `extract_batch` must
/// return exactly one bundle per input photo, in input order.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, photo: &Photo) -> Result<FeatureBundle>;

    fn extract_batch(&self, photos: &[Photo]) -> Result<Vec<FeatureBundle>> {
        photos.iter().map(|photo| self.extract(photo)).collect()
    }
}
