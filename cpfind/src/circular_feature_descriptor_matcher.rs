use kd_tree::{KdPoint, KdTree};

use crate::circular_feature_descriptor::CIRCULAR_DESCRIPTOR_DIM;
use crate::error::{CpFindError, Result};
use crate::feature_bundle::FeatureBundle;
use crate::matcher::FeatureMatcher;

/// Descriptor values are scaled by this factor and rounded before being
/// placed in the kd-tree.
const QUANTIZATION: f32 = 100.0;

/// A descriptor row quantized to integers, remembering its keypoint index.
#[derive(Debug, Clone, Copy)]
struct QuantizedDescriptor {
    index: usize,
    feature_vector: [i64; CIRCULAR_DESCRIPTOR_DIM],
}

impl KdPoint for QuantizedDescriptor {
    type Scalar = i64;
    type Dim = typenum::U6;
    fn at(&self, k: usize) -> i64 {
        self.feature_vector[k]
    }
}

/// Matches circular feature descriptors between two bundles.
///
/// A [KdTree] (from the `kd_tree` crate) is built over each side. A pair
/// `(a, b)` is accepted when `b` is the nearest neighbour of `a` and `a` is
/// the nearest neighbour of `b`. Bundles must carry six-component
/// descriptors.
#[derive(Debug, Clone, Default)]
pub struct CircularFeatureDescriptorMatcher {
    /// Maximum accepted Euclidean descriptor distance, if any.
    pub max_distance: Option<f32>,
}

impl CircularFeatureDescriptorMatcher {
    pub fn new() -> Self {
        CircularFeatureDescriptorMatcher { max_distance: None }
    }

    fn quantize(bundle: &FeatureBundle) -> Result<Vec<QuantizedDescriptor>> {
        if bundle.descriptor_dim() != CIRCULAR_DESCRIPTOR_DIM {
            return Err(CpFindError::Matching(format!(
                "circular matcher needs {CIRCULAR_DESCRIPTOR_DIM}-component descriptors, got {}",
                bundle.descriptor_dim()
            )));
        }
        Ok(bundle
            .descriptors()
            .row_iter()
            .enumerate()
            .map(|(index, row)| {
                let mut feature_vector = [0i64; CIRCULAR_DESCRIPTOR_DIM];
                for (k, value) in row.iter().enumerate() {
                    feature_vector[k] = f32::round(value * QUANTIZATION) as i64;
                }
                QuantizedDescriptor {
                    index,
                    feature_vector,
                }
            })
            .collect())
    }
}

impl FeatureMatcher for CircularFeatureDescriptorMatcher {
    fn match_features(&self, first: &FeatureBundle, second: &FeatureBundle) -> Result<Vec<(usize, usize)>> {
        let first_descriptors = Self::quantize(first)?;
        let second_descriptors = Self::quantize(second)?;
        if first_descriptors.is_empty() || second_descriptors.is_empty() {
            return Ok(Vec::new());
        }

        let max_squared = self
            .max_distance
            .map(|d| ((d * QUANTIZATION) as f64).powi(2));

        let first_tree = KdTree::build(first_descriptors.clone());
        let second_tree = KdTree::build(second_descriptors);

        let mut matches = Vec::new();
        for descriptor in &first_descriptors {
            let Some(forward) = second_tree.nearest(descriptor) else {
                continue;
            };
            if let Some(limit) = max_squared {
                if forward.squared_distance as f64 > limit {
                    continue;
                }
            }
            let Some(backward) = first_tree.nearest(forward.item) else {
                continue;
            };
            if backward.item.index == descriptor.index {
                matches.push((descriptor.index, forward.item.index));
            }
        }
        Ok(matches)
    }
}
