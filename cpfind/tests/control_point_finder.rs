use std::fs;
use std::path::{Path, PathBuf};

use cpfind::cpfind_processor::temp_path_for;
use cpfind::{
    ControlPointFinder, CpFindConfig, CpFindError, FeatureBundle, FeatureExtractor, FeatureMatcher,
    ImageDecoder, PairPolicy, Photo, Result,
};
use nalgebra::{DMatrix, Point2};
use tempfile::TempDir;

struct StubDecoder;

impl ImageDecoder for StubDecoder {
    fn decode(&self, _path: &str) -> Result<Photo> {
        Photo::new(1, 4, 4, vec![0.0; 16])
    }
}

/// Two fixed keypoints for every image.
struct StubExtractor;

impl FeatureExtractor for StubExtractor {
    fn extract(&self, photo: &Photo) -> Result<FeatureBundle> {
        FeatureBundle::new(
            vec![Point2::new(10.5, 20.25), Point2::new(30.0, 40.75)],
            vec![0.9, 0.8],
            DMatrix::zeros(2, 4),
            (photo.width as u32, photo.height as u32),
        )
    }
}

/// Always reports keypoint 0 of the first image matching keypoint 1 of the second.
struct StubMatcher;

impl FeatureMatcher for StubMatcher {
    fn match_features(&self, _first: &FeatureBundle, _second: &FeatureBundle) -> Result<Vec<(usize, usize)>> {
        Ok(vec![(0, 1)])
    }
}

struct FailingExtractor;

impl FeatureExtractor for FailingExtractor {
    fn extract(&self, _photo: &Photo) -> Result<FeatureBundle> {
        Err(CpFindError::Extraction("injected failure".into()))
    }
}

fn finder(config: CpFindConfig) -> ControlPointFinder {
    ControlPointFinder::new(
        config,
        Box::new(StubDecoder),
        Box::new(StubExtractor),
        Box::new(StubMatcher),
    )
}

const HEADER: &str = "# hugin project file\n\
#hugin_ptoversion 2\n\
p f2 w3000 h1500 v360  k0 E0 R0 n\"TIFF_m c:LZW r:CROP\"\n\
m i0\n";

const TRAILER: &str = "c n1 N0 x1 y1 X2 Y2 t0\n\
\n\
# optimized\n\
c n2 N1 x5 y5 X6 Y6 t0\n\
*\n";

fn image_lines(count: usize) -> String {
    (0..count)
        .map(|i| format!("i w640 h480 f0 v50 Ra0 r0 p0 y0 n\"img{i}.jpg\"\n"))
        .collect()
}

fn project(images: usize) -> String {
    format!("{HEADER}{}\n# control points\n{TRAILER}", image_lines(images))
}

fn trailer_without_control_points() -> String {
    TRAILER
        .lines()
        .filter(|line| !line.starts_with('c'))
        .map(|line| format!("{line}\n"))
        .collect()
}

fn write_input(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("input.pto");
    fs::write(&path, contents).unwrap();
    path
}

fn control_point_lines(output: &Path) -> Vec<String> {
    fs::read_to_string(output)
        .unwrap()
        .lines()
        .filter(|line| line.starts_with("c "))
        .map(str::to_string)
        .collect()
}

#[test]
fn three_images_with_stub_backend() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &project(3));
    let output = dir.path().join("output.pto");

    let summary = finder(CpFindConfig::default()).run(&input, &output).unwrap();

    assert_eq!(summary.images, 3);
    assert!(summary.marker_found);
    assert_eq!(summary.pairs_matched, 1);
    assert_eq!(summary.control_points, 1);
    assert_eq!(summary.stale_control_points, 2);

    let expected = format!(
        "{HEADER}{}\n# control points\n\
c n2 N0 x10.500000 y20.250000 X30.000000 Y40.750000 t0\n{}",
        image_lines(3),
        trailer_without_control_points()
    );
    assert_eq!(fs::read_to_string(&output).unwrap(), expected);
    assert!(!temp_path_for(&output).exists());
}

#[test]
fn zero_images_only_drops_stale_control_points() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &project(0));
    let output = dir.path().join("output.pto");

    let summary = finder(CpFindConfig::default()).run(&input, &output).unwrap();

    assert_eq!(summary.control_points, 0);
    let expected = format!("{HEADER}\n# control points\n{}", trailer_without_control_points());
    assert_eq!(fs::read_to_string(&output).unwrap(), expected);
}

#[test]
fn all_previous_policy_references_valid_images() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &project(4));
    let output = dir.path().join("output.pto");
    let config = CpFindConfig {
        pair_policy: PairPolicy::AllPrevious,
        ..CpFindConfig::default()
    };

    let summary = finder(config).run(&input, &output).unwrap();
    assert_eq!(summary.pairs_matched, 6);
    assert_eq!(summary.control_points, 6);

    let lines = control_point_lines(&output);
    assert_eq!(lines.len(), 6);
    for line in &lines {
        let fields: Vec<&str> = line.split(' ').collect();
        let src: usize = fields[1].trim_start_matches('n').parse().unwrap();
        let dst: usize = fields[2].trim_start_matches('N').parse().unwrap();
        assert!(src < 4 && dst < src, "{line}");
        assert_eq!(fields[7], "t0");
    }
}

#[test]
fn batched_extraction_gives_same_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &project(5));
    let single = dir.path().join("single.pto");
    let batched = dir.path().join("batched.pto");

    finder(CpFindConfig::default()).run(&input, &single).unwrap();
    let config = CpFindConfig {
        batch_size: Some(2),
        ..CpFindConfig::default()
    };
    finder(config).run(&input, &batched).unwrap();

    assert_eq!(fs::read(&single).unwrap(), fs::read(&batched).unwrap());
    assert_eq!(control_point_lines(&single).len(), 6);
}

#[test]
fn collaborator_failure_leaves_destination_untouched() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &project(3));
    let output = dir.path().join("output.pto");
    fs::write(&output, "previous content\n").unwrap();

    let failing = ControlPointFinder::new(
        CpFindConfig::default(),
        Box::new(StubDecoder),
        Box::new(FailingExtractor),
        Box::new(StubMatcher),
    );
    let result = failing.run(&input, &output);

    assert!(matches!(result, Err(CpFindError::Extraction(_))));
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous content\n");
    assert!(temp_path_for(&output).exists());

    let absent = dir.path().join("absent.pto");
    assert!(failing.run(&input, &absent).is_err());
    assert!(!absent.exists());
}

#[test]
fn missing_marker_copies_input_unchanged() {
    let dir = TempDir::new().unwrap();
    let contents = format!("{HEADER}{}c n1 N0 x1 y1 X2 Y2 t0\n", image_lines(3));
    let input = write_input(&dir, &contents);
    let output = dir.path().join("output.pto");

    let summary = finder(CpFindConfig::default()).run(&input, &output).unwrap();

    assert!(!summary.marker_found);
    assert_eq!(summary.images, 3);
    assert_eq!(summary.control_points, 0);
    assert_eq!(fs::read_to_string(&output).unwrap(), contents);
}

#[test]
fn missing_marker_can_be_fatal() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &format!("{HEADER}{}", image_lines(2)));
    let output = dir.path().join("output.pto");
    let config = CpFindConfig {
        require_marker: true,
        ..CpFindConfig::default()
    };

    let result = finder(config).run(&input, &output);
    assert!(matches!(result, Err(CpFindError::MissingMarker)));
    assert!(!output.exists());
}

#[test]
fn project_can_be_updated_in_place() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &project(3));

    finder(CpFindConfig::default()).run(&input, &input).unwrap();

    let lines = control_point_lines(&input);
    assert_eq!(lines, vec!["c n2 N0 x10.500000 y20.250000 X30.000000 Y40.750000 t0"]);
}

#[test]
fn missing_input_is_reported_with_its_path() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("nope.pto");
    let output = dir.path().join("output.pto");

    match finder(CpFindConfig::default()).run(&input, &output) {
        Err(CpFindError::Io { path, .. }) => assert_eq!(path, input),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn coordinate_precision_is_configurable() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &project(3));
    let output = dir.path().join("output.pto");
    let config = CpFindConfig {
        coordinate_precision: 2,
        ..CpFindConfig::default()
    };

    finder(config).run(&input, &output).unwrap();
    assert_eq!(
        control_point_lines(&output),
        vec!["c n2 N0 x10.50 y20.25 X30.00 Y40.75 t0"]
    );
}

#[test]
fn temporary_path_colliding_with_input_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("a.pto.temp");
    let contents = project(3);
    fs::write(&input, &contents).unwrap();
    let output = dir.path().join("a.pto");
    assert_eq!(temp_path_for(&output), input);

    let result = finder(CpFindConfig::default()).run(&input, &output);

    assert!(matches!(result, Err(CpFindError::Config(_))));
    assert_eq!(fs::read_to_string(&input).unwrap(), contents);
    assert!(!output.exists());
}

#[test]
fn non_utf8_lines_pass_through_unchanged() {
    let dir = TempDir::new().unwrap();
    let mut contents = Vec::new();
    contents.extend_from_slice(b"# caf\xe9 project\n");
    contents.extend_from_slice(image_lines(2).as_bytes());
    contents.extend_from_slice(b"i w640 h480 n\"bad\xff.jpg\"\n");
    contents.extend_from_slice(image_lines(1).as_bytes());
    contents.extend_from_slice(b"# control points\nc n1 N0 x1 y1 X2 Y2 t0\n# note \xfe\xff\n*\n");
    let input = dir.path().join("input.pto");
    fs::write(&input, &contents).unwrap();
    let output = dir.path().join("output.pto");

    let summary = finder(CpFindConfig::default()).run(&input, &output).unwrap();

    // The undecodable image line gets no index, so three images remain.
    assert_eq!(summary.images, 3);
    assert_eq!(summary.control_points, 1);

    let mut expected = Vec::new();
    expected.extend_from_slice(b"# caf\xe9 project\n");
    expected.extend_from_slice(image_lines(2).as_bytes());
    expected.extend_from_slice(b"i w640 h480 n\"bad\xff.jpg\"\n");
    expected.extend_from_slice(image_lines(1).as_bytes());
    expected.extend_from_slice(b"# control points\n");
    expected.extend_from_slice(b"c n2 N0 x10.500000 y20.250000 X30.000000 Y40.750000 t0\n");
    expected.extend_from_slice(b"# note \xfe\xff\n*\n");
    assert_eq!(fs::read(&output).unwrap(), expected);
}
