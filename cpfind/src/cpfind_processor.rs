use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::CpFindConfig;
use crate::control_point::ControlPointEmitter;
use crate::decoder::{FileDecoder, ImageDecoder};
use crate::error::{CpFindError, Result};
use crate::extractor::FeatureExtractor;
use crate::feature_pipeline::FeatureExtractionPipeline;
use crate::matcher::FeatureMatcher;
use crate::matching_scheduler::PairwiseMatchingScheduler;
use crate::project_document::ProjectReader;

/// Counters describing a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Images declared in the header.
    pub images: usize,
    /// Whether the control point marker was found.
    pub marker_found: bool,
    /// Image pairs submitted to the matcher.
    pub pairs_matched: usize,
    /// Control point lines written.
    pub control_points: usize,
    /// Pre-existing control point lines discarded from the trailer.
    pub stale_control_points: usize,
    pub elapsed: Duration,
}

/// Manages the whole augmentation of one project file.
///
/// The process is:
/// 1. **Header pass**: copy the header to the output and collect the image list.
/// 2. **Feature extraction** for every image, in declaration order.
/// 3. **Pairwise matching** over the pairs chosen by the configured policy.
/// 4. **Emission** of the new control point lines right after the marker.
/// 5. **Trailer pass**: copy the remaining lines, dropping old control points.
///
/// [ControlPointFinder::run] writes to `<output>.temp` and renames it onto
/// the output path only when every step succeeded. On failure the temporary
/// file stays on disk and the output path is left untouched.
pub struct ControlPointFinder {
    config: CpFindConfig,
    decoder: Box<dyn ImageDecoder>,
    extractor: Box<dyn FeatureExtractor>,
    matcher: Box<dyn FeatureMatcher>,
}

impl ControlPointFinder {
    /// Constructs a finder from explicit collaborators.
    pub fn new(
        config: CpFindConfig,
        decoder: Box<dyn ImageDecoder>,
        extractor: Box<dyn FeatureExtractor>,
        matcher: Box<dyn FeatureMatcher>,
    ) -> Self {
        ControlPointFinder {
            config,
            decoder,
            extractor,
            matcher,
        }
    }

    /// Constructs a finder for `project_path` using the configured built-in
    /// backend and a [FileDecoder] rooted at the project's directory.
    pub fn for_project(config: CpFindConfig, project_path: &Path) -> Result<Self> {
        config.validate()?;
        let (extractor, matcher) = config
            .backend
            .build(config.max_keypoints, config.max_image_dimension);
        let decoder = Box::new(FileDecoder::for_project(project_path));
        Ok(Self::new(config, decoder, extractor, matcher))
    }

    pub fn config(&self) -> &CpFindConfig {
        &self.config
    }

    /// Reads `input` and atomically writes the augmented project to `output`.
    pub fn run(&self, input: &Path, output: &Path) -> Result<RunSummary> {
        let start_time = Instant::now();
        let temp_path = temp_path_for(output);

        let input_file = File::open(input).map_err(CpFindError::io(input))?;
        if same_file(input, &temp_path) {
            return Err(CpFindError::Config(format!(
                "temporary output {} would overwrite the input project",
                temp_path.display()
            )));
        }
        let temp_file = File::create(&temp_path).map_err(CpFindError::io(&temp_path))?;
        let mut writer = BufWriter::new(temp_file);

        let mut summary = match self.process(BufReader::new(input_file), &mut writer) {
            Ok(summary) => summary,
            Err(err) => {
                warn!(
                    "Run failed; partial output left at {}",
                    temp_path.display()
                );
                return Err(err);
            }
        };

        let temp_file = writer
            .into_inner()
            .map_err(|err| CpFindError::io(&temp_path)(err.into_error()))?;
        temp_file.sync_all().map_err(CpFindError::io(&temp_path))?;
        drop(temp_file);
        fs::rename(&temp_path, output).map_err(CpFindError::io(output))?;

        summary.elapsed = start_time.elapsed();
        info!("Execution time: {:.3} seconds.", summary.elapsed.as_secs_f64());
        Ok(summary)
    }

    /// Streams a project from `input` to `out`, inserting new control points.
    pub fn process<R: BufRead, W: Write>(&self, input: R, out: &mut W) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mut reader = ProjectReader::new(input);

        let header = reader.read_header(out)?;
        let registry = header.registry;
        let mut summary = RunSummary {
            images: registry.len(),
            marker_found: header.marker_found,
            ..RunSummary::default()
        };

        if !header.marker_found {
            if self.config.require_marker {
                return Err(CpFindError::MissingMarker);
            }
            warn!("No \"# control points\" marker found; the project is copied unchanged.");
            summary.elapsed = start_time.elapsed();
            return Ok(summary);
        }
        info!("Found {} images.", registry.len());
        if header.skipped_image_lines > 0 {
            warn!(
                "Ignored {} image lines without a readable path.",
                header.skipped_image_lines
            );
        }

        let features = FeatureExtractionPipeline::new(
            self.decoder.as_ref(),
            self.extractor.as_ref(),
            self.config.extraction_mode(),
        )
        .with_parallel_decode(self.config.parallel_decode)
        .run(&registry)?;

        let report = PairwiseMatchingScheduler::new(self.matcher.as_ref(), self.config.pair_policy)
            .schedule(&features)?;
        info!(
            "Found {} control points in {} image pairs.",
            report.control_points.len(),
            report.pairs_matched
        );

        summary.pairs_matched = report.pairs_matched;
        summary.control_points = ControlPointEmitter::new(self.config.coordinate_precision)
            .write_all(&report.control_points, out)?;

        let trailer = reader.copy_trailer(out)?;
        summary.stale_control_points = trailer.control_points_dropped;
        out.flush()?;

        summary.elapsed = start_time.elapsed();
        Ok(summary)
    }
}

/// Path of the temporary file written before `output` is replaced.
pub fn temp_path_for(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".temp");
    PathBuf::from(name)
}

/// Whether both paths name the same existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Augments `input` with control points found by the configured built-in
/// backend and writes the result to `output`.
pub fn find_control_points(config: CpFindConfig, input: &Path, output: &Path) -> Result<RunSummary> {
    ControlPointFinder::for_project(config, input)?.run(input, output)
}
