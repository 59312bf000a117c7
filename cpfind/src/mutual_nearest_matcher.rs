use crate::error::{CpFindError, Result};
use crate::feature_bundle::FeatureBundle;
use crate::matcher::FeatureMatcher;

/// Brute-force matcher for real-valued descriptors.
///
/// All pairwise squared distances are computed from one matrix product.
/// A pair `(a, b)` is accepted when `b` is the nearest neighbour of `a`,
/// `a` is the nearest neighbour of `b`, and the nearest distance is below
/// `ratio` times the second-nearest one (Lowe's ratio test).
#[derive(Debug, Clone)]
pub struct MutualNearestMatcher {
    pub ratio: f32,
}

impl Default for MutualNearestMatcher {
    fn default() -> Self {
        MutualNearestMatcher { ratio: 0.8 }
    }
}

impl MutualNearestMatcher {
    pub fn new(ratio: f32) -> Self {
        MutualNearestMatcher { ratio }
    }
}

impl FeatureMatcher for MutualNearestMatcher {
    fn match_features(&self, first: &FeatureBundle, second: &FeatureBundle) -> Result<Vec<(usize, usize)>> {
        if first.descriptor_dim() != second.descriptor_dim() {
            return Err(CpFindError::Matching(format!(
                "descriptor dimensions differ: {} vs {}",
                first.descriptor_dim(),
                second.descriptor_dim()
            )));
        }
        if first.is_empty() || second.is_empty() {
            return Ok(Vec::new());
        }

        let a = first.descriptors();
        let b = second.descriptors();
        let cross = a * b.transpose();
        let a_norms: Vec<f32> = a.row_iter().map(|r| r.norm_squared()).collect();
        let b_norms: Vec<f32> = b.row_iter().map(|r| r.norm_squared()).collect();
        let distance = |i: usize, j: usize| (a_norms[i] + b_norms[j] - 2.0 * cross[(i, j)]).max(0.0);

        // Nearest row of `first` for every row of `second`.
        let backward: Vec<usize> = (0..b.nrows())
            .map(|j| {
                (0..a.nrows())
                    .min_by(|&x, &y| distance(x, j).total_cmp(&distance(y, j)))
                    .unwrap_or(0)
            })
            .collect();

        let ratio_squared = self.ratio * self.ratio;
        let mut matches = Vec::new();
        for i in 0..a.nrows() {
            let mut best = (usize::MAX, f32::INFINITY);
            let mut second_best = f32::INFINITY;
            for j in 0..b.nrows() {
                let d = distance(i, j);
                if d < best.1 {
                    second_best = best.1;
                    best = (j, d);
                } else if d < second_best {
                    second_best = d;
                }
            }
            let (j, d) = best;
            if j == usize::MAX || backward[j] != i {
                continue;
            }
            if second_best.is_finite() && d >= ratio_squared * second_best {
                continue;
            }
            matches.push((i, j));
        }
        Ok(matches)
    }
}
