use nalgebra::{DMatrix, Point2};
use rayon::prelude::*;

use crate::circular_feature_descriptor::{CircularFeatureDescriptor, CIRCULAR_DESCRIPTOR_DIM};
use crate::error::Result;
use crate::extractor::FeatureExtractor;
use crate::feature_bundle::FeatureBundle;
use crate::harris_detector::HarrisDetector;
use crate::patch_descriptor::{describe_patch, PATCH_DESCRIPTOR_DIM, PATCH_HALF_EXTENT};
use crate::photo::Photo;

/// How keypoint neighbourhoods are turned into descriptor rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// Rotation-invariant color center-of-mass descriptor over a disc.
    Circular { radius: usize },
    /// Normalized 8x8 luminance patch.
    Patch,
}

impl DescriptorKind {
    pub fn dim(self) -> usize {
        match self {
            DescriptorKind::Circular { .. } => CIRCULAR_DESCRIPTOR_DIM,
            DescriptorKind::Patch => PATCH_DESCRIPTOR_DIM,
        }
    }

    /// Minimum distance from the image edge for a fully covered neighbourhood.
    pub fn border(self) -> usize {
        match self {
            DescriptorKind::Circular { radius } => radius + 1,
            DescriptorKind::Patch => PATCH_HALF_EXTENT + 1,
        }
    }
}

/// Harris keypoints combined with one of the built-in descriptors.
///
/// Photos whose longer side exceeds `max_dimension` are downscaled before
/// detection; keypoints are mapped back to pixel coordinates of the
/// original photo. Scores are responses relative to the strongest
/// keypoint, so they lie in `(0, 1]`.
#[derive(Debug, Clone)]
pub struct BuiltinExtractor {
    descriptor: DescriptorKind,
    detector: HarrisDetector,
    max_keypoints: usize,
    max_dimension: usize,
}

impl BuiltinExtractor {
    pub fn new(descriptor: DescriptorKind, max_keypoints: usize, max_dimension: usize) -> Self {
        let detector = HarrisDetector {
            border: descriptor.border(),
            ..HarrisDetector::default()
        };
        BuiltinExtractor {
            descriptor,
            detector,
            max_keypoints,
            max_dimension,
        }
    }

    /// Replaces the corner detector; its border is widened to the descriptor's if needed.
    pub fn with_detector(mut self, detector: HarrisDetector) -> Self {
        let border = detector.border.max(self.descriptor.border());
        self.detector = HarrisDetector { border, ..detector };
        self
    }

    pub fn descriptor(&self) -> DescriptorKind {
        self.descriptor
    }
}

impl FeatureExtractor for BuiltinExtractor {
    fn extract(&self, photo: &Photo) -> Result<FeatureBundle> {
        let scaled = photo.fit_within(self.max_dimension)?;
        let working = scaled.as_ref().unwrap_or(photo);
        let luma = working.luma();

        let corners = self
            .detector
            .detect(&luma, working.width, working.height, self.max_keypoints);

        let scale_x = photo.width as f32 / working.width.max(1) as f32;
        let scale_y = photo.height as f32 / working.height.max(1) as f32;
        let max_response = corners.first().map_or(1.0, |c| c.response);

        let dim = self.descriptor.dim();
        let mut keypoints = Vec::with_capacity(corners.len());
        let mut scores = Vec::with_capacity(corners.len());
        let mut rows = Vec::with_capacity(corners.len() * dim);

        for corner in &corners {
            keypoints.push(Point2::new(
                (corner.x as f32 + 0.5) * scale_x - 0.5,
                (corner.y as f32 + 0.5) * scale_y - 0.5,
            ));
            scores.push(corner.response / max_response);
            match self.descriptor {
                DescriptorKind::Circular { radius } => rows.extend(
                    CircularFeatureDescriptor::compute(working, corner.x, corner.y, radius).feature_vector(),
                ),
                DescriptorKind::Patch => rows.extend(describe_patch(
                    &luma,
                    working.width,
                    working.height,
                    corner.x,
                    corner.y,
                )),
            }
        }

        let descriptors = DMatrix::from_row_slice(corners.len(), dim, &rows);
        FeatureBundle::new(
            keypoints,
            scores,
            descriptors,
            (photo.width as u32, photo.height as u32),
        )
    }

    fn extract_batch(&self, photos: &[Photo]) -> Result<Vec<FeatureBundle>> {
        photos.par_iter().map(|photo| self.extract(photo)).collect()
    }
}
