use nalgebra::{DMatrix, Point2};

use crate::error::{CpFindError, Result};

/// Keypoints, scores and descriptors detected in one image.
///
/// Keypoint coordinates are pixel positions in the original (unscaled)
/// image. Row `k` of `descriptors` describes keypoint `k`, and `scores[k]`
/// is its detection confidence. The shape is checked once in
/// [FeatureBundle::new]; a bundle is read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBundle {
    keypoints: Vec<Point2<f32>>,
    scores: Vec<f32>,
    descriptors: DMatrix<f32>,
    image_size: (u32, u32),
}

impl FeatureBundle {
    /// Validates and builds a bundle.
    ///
    /// # Errors
    /// [CpFindError::InvalidBundle] when the number of scores or descriptor
    /// rows differs from the number of keypoints, or a coordinate is not finite.
    pub fn new(
        keypoints: Vec<Point2<f32>>,
        scores: Vec<f32>,
        descriptors: DMatrix<f32>,
        image_size: (u32, u32),
    ) -> Result<Self> {
        if scores.len() != keypoints.len() {
            return Err(CpFindError::InvalidBundle(format!(
                "{} scores for {} keypoints",
                scores.len(),
                keypoints.len()
            )));
        }
        if descriptors.nrows() != keypoints.len() {
            return Err(CpFindError::InvalidBundle(format!(
                "{} descriptor rows for {} keypoints",
                descriptors.nrows(),
                keypoints.len()
            )));
        }
        if let Some(k) = keypoints.iter().position(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(CpFindError::InvalidBundle(format!(
                "keypoint {k} has a non-finite coordinate"
            )));
        }
        Ok(FeatureBundle {
            keypoints,
            scores,
            descriptors,
            image_size,
        })
    }

    pub fn keypoints(&self) -> &[Point2<f32>] {
        &self.keypoints
    }

    pub fn keypoint(&self, index: usize) -> Option<&Point2<f32>> {
        self.keypoints.get(index)
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// One row per keypoint.
    pub fn descriptors(&self) -> &DMatrix<f32> {
        &self.descriptors
    }

    pub fn descriptor_dim(&self) -> usize {
        self.descriptors.ncols()
    }

    /// `(width, height)` of the source image in pixels.
    pub fn image_size(&self) -> (u32, u32) {
        self.image_size
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}
