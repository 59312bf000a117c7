//! Run configuration.
//!
//! Everything that influences a run is carried by [CpFindConfig] and handed
//! to the components at construction time. Configuration can be loaded from
//! a TOML file; missing keys take their defaults.
//!
//! ```toml
//! backend = "patch"
//! max_keypoints = 512
//! batch_size = 4
//! pair_policy = "all-previous"
//! coordinate_precision = 3
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::backend::FeatureBackend;
use crate::control_point::DEFAULT_COORDINATE_PRECISION;
use crate::error::{CpFindError, Result};
use crate::feature_pipeline::ExtractionMode;
use crate::pair_policy::PairPolicy;

/// Upper bound on coordinate decimal places; beyond this f32 carries no information.
pub const MAX_COORDINATE_PRECISION: usize = 12;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CpFindConfig {
    /// Extractor/matcher pair.
    pub backend: FeatureBackend,
    /// Maximum number of keypoints kept per image.
    pub max_keypoints: usize,
    /// Images per extractor call; `None` extracts one image at a time.
    pub batch_size: Option<usize>,
    /// Which image pairs are matched.
    pub pair_policy: PairPolicy,
    /// Decimal places written for control point coordinates.
    pub coordinate_precision: usize,
    /// Longest image side used for detection; larger images are downscaled. 0 disables.
    pub max_image_dimension: usize,
    /// Treat a project without the control point marker as an error.
    pub require_marker: bool,
    /// Decode the images of a batch in parallel.
    pub parallel_decode: bool,
}

impl Default for CpFindConfig {
    fn default() -> Self {
        CpFindConfig {
            backend: FeatureBackend::default(),
            max_keypoints: 128,
            batch_size: None,
            pair_policy: PairPolicy::default(),
            coordinate_precision: DEFAULT_COORDINATE_PRECISION,
            max_image_dimension: 1024,
            require_marker: false,
            parallel_decode: true,
        }
    }
}

impl CpFindConfig {
    /// Loads and validates a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(CpFindError::io(path))?;
        Self::from_toml(&contents)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(toml: &str) -> Result<Self> {
        let config: CpFindConfig = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_keypoints == 0 {
            return Err(CpFindError::Config("max_keypoints must be at least 1".into()));
        }
        if self.batch_size == Some(0) {
            return Err(CpFindError::Config("batch_size must be at least 1".into()));
        }
        if self.coordinate_precision > MAX_COORDINATE_PRECISION {
            return Err(CpFindError::Config(format!(
                "coordinate_precision must be at most {MAX_COORDINATE_PRECISION}"
            )));
        }
        Ok(())
    }

    pub fn extraction_mode(&self) -> ExtractionMode {
        ExtractionMode::from_batch_size(self.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(CpFindConfig::from_toml("").unwrap(), CpFindConfig::default());
    }

    #[test]
    fn parses_all_fields() {
        let config = CpFindConfig::from_toml(
            r#"
            backend = "patch"
            max_keypoints = 512
            batch_size = 4
            pair_policy = "all-previous"
            coordinate_precision = 3
            max_image_dimension = 0
            require_marker = true
            parallel_decode = false
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, FeatureBackend::Patch);
        assert_eq!(config.max_keypoints, 512);
        assert_eq!(config.pair_policy, PairPolicy::AllPrevious);
        assert_eq!(config.coordinate_precision, 3);
        assert_eq!(config.max_image_dimension, 0);
        assert!(config.require_marker);
        assert!(!config.parallel_decode);
        assert_eq!(
            config.extraction_mode(),
            ExtractionMode::Batched(NonZeroUsize::new(4).unwrap())
        );
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            CpFindConfig::from_toml("batch_size = 0"),
            Err(CpFindError::Config(_))
        ));
        assert!(matches!(
            CpFindConfig::from_toml("max_keypoints = 0"),
            Err(CpFindError::Config(_))
        ));
        assert!(matches!(
            CpFindConfig::from_toml("coordinate_precision = 40"),
            Err(CpFindError::Config(_))
        ));
        assert!(matches!(
            CpFindConfig::from_toml("backend = \"superpoint\""),
            Err(CpFindError::Config(_))
        ));
        assert!(matches!(
            CpFindConfig::from_toml("max_keypionts = 5"),
            Err(CpFindError::Config(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let result = CpFindConfig::load(Path::new("/nonexistent/cpfind.toml"));
        assert!(matches!(result, Err(CpFindError::Io { .. })));
    }
}
