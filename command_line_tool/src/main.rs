use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use cpfind::config::MAX_COORDINATE_PRECISION;
use cpfind::{find_control_points, CpFindConfig, FeatureBackend, PairPolicy};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

/// Command line arguments structure.
#[derive(Parser, Debug)]
#[command(
    name = "cpfind",
    author,
    version,
    about = "Finds control points between the images of a panorama project file."
)]
struct Args {
    /// Input project file
    #[arg()]
    input_project: PathBuf,

    /// Output project file
    #[arg(short, long)]
    output: PathBuf,

    /// Feature backend (default: circular)
    #[arg(short, long, value_enum)]
    features: Option<FeaturesArg>,

    /// Maximum number of keypoints to extract from each image (default: 128)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    max_keypoints: Option<u64>,

    /// Number of images per extractor call (default: one at a time)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    batch_size: Option<u64>,

    /// Which image pairs to match (default: exclude-adjacent)
    #[arg(short, long, value_enum)]
    pair_policy: Option<PairPolicyArg>,

    /// Decimal places written for control point coordinates (default: 6)
    #[arg(long, value_parser = clap::value_parser!(u64).range(0..=MAX_COORDINATE_PRECISION as u64))]
    precision: Option<u64>,

    /// Downscale images whose longer side exceeds this many pixels before
    /// detection; 0 disables (default: 1024)
    #[arg(long)]
    max_dimension: Option<usize>,

    /// Fail when the project has no "# control points" marker
    #[arg(long)]
    require_marker: bool,

    /// TOML configuration file; explicit options take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FeaturesArg {
    Circular,
    Patch,
}

impl From<FeaturesArg> for FeatureBackend {
    fn from(value: FeaturesArg) -> Self {
        match value {
            FeaturesArg::Circular => FeatureBackend::Circular,
            FeaturesArg::Patch => FeatureBackend::Patch,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PairPolicyArg {
    /// Every earlier image except the direct predecessor
    ExcludeAdjacent,
    /// Every earlier image
    AllPrevious,
}

impl From<PairPolicyArg> for PairPolicy {
    fn from(value: PairPolicyArg) -> Self {
        match value {
            PairPolicyArg::ExcludeAdjacent => PairPolicy::ExcludeAdjacent,
            PairPolicyArg::AllPrevious => PairPolicy::AllPrevious,
        }
    }
}

impl Args {
    /// Builds the run configuration: file (if any), then explicit options.
    fn to_config(&self) -> CliResult<CpFindConfig> {
        let mut config = match &self.config {
            Some(path) => CpFindConfig::load(path)?,
            None => CpFindConfig::default(),
        };

        if let Some(features) = self.features {
            config.backend = features.into();
        }
        if let Some(max_keypoints) = self.max_keypoints {
            config.max_keypoints = usize::try_from(max_keypoints)?;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = Some(usize::try_from(batch_size)?);
        }
        if let Some(pair_policy) = self.pair_policy {
            config.pair_policy = pair_policy.into();
        }
        if let Some(precision) = self.precision {
            config.coordinate_precision = usize::try_from(precision)?;
        }
        if let Some(max_dimension) = self.max_dimension {
            config.max_image_dimension = max_dimension;
        }
        if self.require_marker {
            config.require_marker = true;
        }

        config.validate()?;
        Ok(config)
    }
}

fn run(args: Args) -> CliResult<()> {
    let config = args.to_config()?;
    tracing::info!(
        "Using {} features, {} keypoints per image, {} pairs.",
        config.backend,
        config.max_keypoints,
        config.pair_policy
    );

    let summary = find_control_points(config, &args.input_project, &args.output)?;

    tracing::info!(
        "Wrote {} control points for {} images to {}",
        summary.control_points,
        summary.images,
        args.output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_arguments_use_defaults() {
        let args = Args::try_parse_from(["cpfind", "in.pto", "-o", "out.pto"]).unwrap();
        let config = args.to_config().unwrap();
        assert_eq!(config, CpFindConfig::default());
        assert_eq!(args.input_project, PathBuf::from("in.pto"));
    }

    #[test]
    fn explicit_options_override_defaults() {
        let args = Args::try_parse_from([
            "cpfind",
            "in.pto",
            "--output",
            "out.pto",
            "-f",
            "patch",
            "-m",
            "256",
            "-b",
            "4",
            "-p",
            "all-previous",
            "--precision",
            "2",
            "--require-marker",
        ])
        .unwrap();
        let config = args.to_config().unwrap();
        assert_eq!(config.backend, FeatureBackend::Patch);
        assert_eq!(config.max_keypoints, 256);
        assert_eq!(config.batch_size, Some(4));
        assert_eq!(config.pair_policy, PairPolicy::AllPrevious);
        assert_eq!(config.coordinate_precision, 2);
        assert!(config.require_marker);
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        assert!(Args::try_parse_from(["cpfind", "in.pto"]).is_err());
        assert!(Args::try_parse_from(["cpfind", "-o", "out.pto"]).is_err());
        assert!(Args::try_parse_from(["cpfind", "in.pto", "-o", "o", "-f", "superpoint"]).is_err());
        assert!(Args::try_parse_from(["cpfind", "in.pto", "-o", "o", "-b", "0"]).is_err());
    }

    #[test]
    fn out_of_range_values_are_usage_errors() {
        for extra in [["-m", "0"], ["--precision", "40"]] {
            let err = Args::try_parse_from(["cpfind", "in.pto", "-o", "o", extra[0], extra[1]]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation, "{extra:?}");
            assert_eq!(err.exit_code(), 2, "{extra:?}");
        }
        let args = Args::try_parse_from(["cpfind", "in.pto", "-o", "o", "--precision", "12"]).unwrap();
        assert_eq!(args.to_config().unwrap().coordinate_precision, 12);
    }
}
