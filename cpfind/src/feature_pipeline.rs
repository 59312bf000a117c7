use std::num::NonZeroUsize;

use rayon::prelude::*;
use tracing::info;

use crate::decoder::ImageDecoder;
use crate::error::{CpFindError, Result};
use crate::extractor::FeatureExtractor;
use crate::feature_bundle::FeatureBundle;
use crate::image_registry::{ImageRecord, ImageRegistry};
use crate::photo::Photo;

/// How images are submitted to the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// One image per extractor call.
    Single,
    /// Up to the given number of images per call; the last batch may be smaller.
    Batched(NonZeroUsize),
}

impl ExtractionMode {
    /// `None` and `Some(1)` both mean single-image mode.
    pub fn from_batch_size(batch_size: Option<usize>) -> Self {
        match batch_size.and_then(NonZeroUsize::new) {
            Some(size) if size.get() > 1 => ExtractionMode::Batched(size),
            _ => ExtractionMode::Single,
        }
    }

    fn chunk_len(self) -> usize {
        match self {
            ExtractionMode::Single => 1,
            ExtractionMode::Batched(size) => size.get(),
        }
    }
}

/// Decodes every registered image and extracts one [FeatureBundle] per image.
///
/// Batches are issued strictly one after another. Within a batch, images
/// may be decoded in parallel; bundle order always follows registry order.
pub struct FeatureExtractionPipeline<'a> {
    decoder: &'a dyn ImageDecoder,
    extractor: &'a dyn FeatureExtractor,
    mode: ExtractionMode,
    parallel_decode: bool,
}

impl<'a> FeatureExtractionPipeline<'a> {
    pub fn new(decoder: &'a dyn ImageDecoder, extractor: &'a dyn FeatureExtractor, mode: ExtractionMode) -> Self {
        FeatureExtractionPipeline {
            decoder,
            extractor,
            mode,
            parallel_decode: false,
        }
    }

    pub fn with_parallel_decode(mut self, parallel_decode: bool) -> Self {
        self.parallel_decode = parallel_decode;
        self
    }

    /// Returns bundles index-aligned with `registry`.
    pub fn run(&self, registry: &ImageRegistry) -> Result<Vec<FeatureBundle>> {
        let mut features = Vec::with_capacity(registry.len());
        let chunk_len = self.mode.chunk_len();
        let batch_count = registry.len().div_ceil(chunk_len);

        for (batch_index, batch) in registry.records().chunks(chunk_len).enumerate() {
            match self.mode {
                ExtractionMode::Single => {
                    info!("Extracting features from {}.", batch[0].path);
                }
                ExtractionMode::Batched(_) => {
                    info!(
                        "Extracting features from batch {}/{} ({} images).",
                        batch_index + 1,
                        batch_count,
                        batch.len()
                    );
                }
            }

            let photos = self.decode_batch(batch)?;
            let bundles = match self.mode {
                ExtractionMode::Single => vec![self.extractor.extract(&photos[0])?],
                ExtractionMode::Batched(_) => self.extractor.extract_batch(&photos)?,
            };
            if bundles.len() != batch.len() {
                return Err(CpFindError::BatchMismatch {
                    expected: batch.len(),
                    actual: bundles.len(),
                });
            }
            features.extend(bundles);
        }

        Ok(features)
    }

    fn decode_batch(&self, batch: &[ImageRecord]) -> Result<Vec<Photo>> {
        if self.parallel_decode && batch.len() > 1 {
            batch
                .par_iter()
                .map(|record| self.decoder.decode(&record.path))
                .collect()
        } else {
            batch.iter().map(|record| self.decoder.decode(&record.path)).collect()
        }
    }
}
