use tracing::{debug, info};

use crate::control_point::ControlPoint;
use crate::error::{CpFindError, Result};
use crate::feature_bundle::FeatureBundle;
use crate::matcher::FeatureMatcher;
use crate::pair_policy::PairPolicy;

/// Control points gathered over all scheduled pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchReport {
    pub control_points: Vec<ControlPoint>,
    pub pairs_matched: usize,
}

/// Runs the matcher over the image pairs chosen by a [PairPolicy] and turns
/// keypoint correspondences into [ControlPoint]s.
pub struct PairwiseMatchingScheduler<'a> {
    matcher: &'a dyn FeatureMatcher,
    policy: PairPolicy,
}

impl<'a> PairwiseMatchingScheduler<'a> {
    pub fn new(matcher: &'a dyn FeatureMatcher, policy: PairPolicy) -> Self {
        PairwiseMatchingScheduler { matcher, policy }
    }

    /// Matches every scheduled pair of `features`.
    ///
    /// For a pair `(i, j)` and a correspondence `(a, b)`, the control point
    /// goes from keypoint `a` of image `i` to keypoint `b` of image `j`.
    /// A correspondence naming a keypoint that does not exist aborts the run.
    pub fn schedule(&self, features: &[FeatureBundle]) -> Result<MatchReport> {
        let mut report = MatchReport::default();
        info!(
            "Matching {} image pairs ({}).",
            self.policy.pair_count(features.len()),
            self.policy
        );

        for (i, j) in self.policy.pairs(features.len()) {
            let (first, second) = (&features[i], &features[j]);
            let correspondences = self.matcher.match_features(first, second)?;
            debug!("Pair ({i}, {j}): {} correspondences", correspondences.len());

            report.control_points.reserve(correspondences.len());
            for (a, b) in correspondences {
                let (Some(src), Some(dst)) = (first.keypoint(a), second.keypoint(b)) else {
                    return Err(CpFindError::CorrespondenceOutOfRange {
                        i,
                        j,
                        a,
                        b,
                        len_i: first.len(),
                        len_j: second.len(),
                    });
                };
                report.control_points.push(ControlPoint {
                    src_image: i,
                    dst_image: j,
                    src_x: src.x,
                    src_y: src.y,
                    dst_x: dst.x,
                    dst_y: dst.y,
                });
            }
            report.pairs_matched += 1;
        }

        Ok(report)
    }
}
