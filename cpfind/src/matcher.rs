use crate::error::Result;
use crate::feature_bundle::FeatureBundle;

/// Finds correspondences between the keypoints of two feature bundles.
pub trait FeatureMatcher: Send + Sync {
    /// Returns `(a, b)` pairs where `a` indexes keypoints of `first` and
    /// `b` indexes keypoints of `second`.
    fn match_features(&self, first: &FeatureBundle, second: &FeatureBundle) -> Result<Vec<(usize, usize)>>;
}
