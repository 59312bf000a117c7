//! # cpfind Library
//!
//! The `cpfind` library augments line-oriented panorama project files with
//! automatically detected control points. It reads the image list from the
//! project header, extracts features from every image, matches image pairs,
//! and rewrites the project with one control point line per correspondence,
//! replacing any control points the file already had.
//!
//! ## Overview of Modules
//!
//! - **`cpfind_processor`**: Orchestrates a run: header pass, feature
//!   extraction, pairwise matching, emission and the trailer pass, with an
//!   atomic replace of the output file.
//!
//! - **`project_document`**: Streaming reader for the project format. Copies
//!   untouched lines byte for byte and recognizes image declarations, the
//!   `# control points` marker, and stale control point lines.
//!
//! - **`image_registry`**: The ordered list of declared images that assigns
//!   image indices.
//!
//! - **`feature_pipeline`**: Decodes images and runs the extractor, one image
//!   at a time or in batches, keeping bundles aligned with image indices.
//!
//! - **`matching_scheduler`** and **`pair_policy`**: Choose the image pairs
//!   to match and convert matcher output into control points.
//!
//! - **`control_point`**: The control point type and its line format.
//!
//! - **`decoder`**, **`extractor`**, **`matcher`**: The collaborator traits,
//!   with a file decoder based on the `image` crate.
//!
//! - **`builtin_extractor`**, **`harris_detector`**,
//!   **`circular_feature_descriptor`**, **`patch_descriptor`**,
//!   **`circular_feature_descriptor_matcher`**, **`mutual_nearest_matcher`**:
//!   The two built-in backends selected through **`backend`**.
//!
//! - **`config`**: Run configuration, loadable from TOML.

pub mod cpfind_processor;

pub mod backend;
pub mod builtin_extractor;
pub mod circular_feature_descriptor;
pub mod circular_feature_descriptor_matcher;
pub mod config;
pub mod control_point;
pub mod decoder;
pub mod error;
pub mod extractor;
pub mod feature_bundle;
pub mod feature_pipeline;
pub mod harris_detector;
pub mod image_registry;
pub mod matcher;
pub mod matching_scheduler;
pub mod mutual_nearest_matcher;
pub mod pair_policy;
pub mod patch_descriptor;
pub mod photo;
pub mod project_document;

pub use backend::FeatureBackend;
pub use config::CpFindConfig;
pub use control_point::ControlPoint;
pub use cpfind_processor::{find_control_points, ControlPointFinder, RunSummary};
pub use decoder::{FileDecoder, ImageDecoder};
pub use error::{CpFindError, Result};
pub use extractor::FeatureExtractor;
pub use feature_bundle::FeatureBundle;
pub use matcher::FeatureMatcher;
pub use pair_policy::PairPolicy;
pub use photo::Photo;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
