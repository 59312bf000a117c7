use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::builtin_extractor::{BuiltinExtractor, DescriptorKind};
use crate::circular_feature_descriptor_matcher::CircularFeatureDescriptorMatcher;
use crate::extractor::FeatureExtractor;
use crate::matcher::FeatureMatcher;
use crate::mutual_nearest_matcher::MutualNearestMatcher;

/// Radius (pixels) of the disc described by the circular backend.
pub const CIRCULAR_RADIUS: usize = 10;

/// Selects a matching extractor/matcher pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureBackend {
    /// Circular color center-of-mass descriptors matched through a kd-tree.
    #[default]
    Circular,
    /// Normalized intensity patches matched by brute force with a ratio test.
    Patch,
}

impl FeatureBackend {
    pub const ALL: [FeatureBackend; 2] = [FeatureBackend::Circular, FeatureBackend::Patch];

    pub fn name(self) -> &'static str {
        match self {
            FeatureBackend::Circular => "circular",
            FeatureBackend::Patch => "patch",
        }
    }

    /// Builds the extractor and the matcher that understands its descriptors.
    pub fn build(
        self,
        max_keypoints: usize,
        max_dimension: usize,
    ) -> (Box<dyn FeatureExtractor>, Box<dyn FeatureMatcher>) {
        match self {
            FeatureBackend::Circular => (
                Box::new(BuiltinExtractor::new(
                    DescriptorKind::Circular {
                        radius: CIRCULAR_RADIUS,
                    },
                    max_keypoints,
                    max_dimension,
                )),
                Box::new(CircularFeatureDescriptorMatcher::new()),
            ),
            FeatureBackend::Patch => (
                Box::new(BuiltinExtractor::new(DescriptorKind::Patch, max_keypoints, max_dimension)),
                Box::new(MutualNearestMatcher::default()),
            ),
        }
    }
}

impl fmt::Display for FeatureBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeatureBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        FeatureBackend::ALL
            .into_iter()
            .find(|backend| backend.name() == lowered)
            .ok_or_else(|| format!("unknown feature backend '{s}' (expected circular or patch)"))
    }
}
