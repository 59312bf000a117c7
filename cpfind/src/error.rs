//! Error types for control point finding.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while augmenting a project file with control points.
///
/// Every variant is fatal to the run: nothing in the pipeline retries.
#[derive(Error, Debug)]
pub enum CpFindError {
    /// A file could not be opened, created or renamed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing the project stream failed.
    #[error("stream error: {0}")]
    Stream(#[from] std::io::Error),

    /// An image file could not be decoded.
    #[error("failed to decode image {}: {source}", path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A pixel buffer does not match its declared shape.
    #[error("invalid photo: {0}")]
    InvalidPhoto(String),

    /// A feature bundle failed validation at construction.
    #[error("invalid feature bundle: {0}")]
    InvalidBundle(String),

    /// The feature extractor failed.
    #[error("feature extraction failed: {0}")]
    Extraction(String),

    /// The feature matcher failed.
    #[error("matching failed: {0}")]
    Matching(String),

    /// A batched extraction returned the wrong number of bundles.
    #[error("extractor returned {actual} feature bundles for a batch of {expected} images")]
    BatchMismatch { expected: usize, actual: usize },

    /// The matcher referenced a keypoint that does not exist.
    #[error(
        "correspondence ({a}, {b}) for pair ({i}, {j}) is out of range \
         (images have {len_i} and {len_j} keypoints)"
    )]
    CorrespondenceOutOfRange {
        i: usize,
        j: usize,
        a: usize,
        b: usize,
        len_i: usize,
        len_j: usize,
    },

    /// The project file has no control point marker and one was required.
    #[error("project file has no \"# control points\" marker line")]
    MissingMarker,

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for CpFindError {
    fn from(e: toml::de::Error) -> Self {
        CpFindError::Config(e.to_string())
    }
}

impl CpFindError {
    /// Returns a closure that wraps an `std::io::Error` with the path it concerns.
    pub fn io(path: &Path) -> impl FnOnce(std::io::Error) -> CpFindError {
        let path = path.to_path_buf();
        move |source| CpFindError::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, CpFindError>;
