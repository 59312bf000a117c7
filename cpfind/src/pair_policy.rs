use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Rule deciding which image pairs are submitted to the matcher.
///
/// Every policy yields pairs `(i, j)` with `j < i`, ordered by `i` and then
/// by `j`, so the source image of a control point always has the larger
/// index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairPolicy {
    /// Each image against every earlier image except its direct predecessor
    /// (`0 <= j < i - 1`). Reproduces the historical behaviour of the tool,
    /// which never matches neighbouring images.
    #[default]
    ExcludeAdjacent,
    /// Each image against every earlier image (`0 <= j < i`).
    AllPrevious,
}

impl PairPolicy {
    pub const ALL: [PairPolicy; 2] = [PairPolicy::ExcludeAdjacent, PairPolicy::AllPrevious];

    pub fn name(self) -> &'static str {
        match self {
            PairPolicy::ExcludeAdjacent => "exclude-adjacent",
            PairPolicy::AllPrevious => "all-previous",
        }
    }

    /// Number of earlier images skipped directly before each image.
    fn skipped_predecessors(self) -> usize {
        match self {
            PairPolicy::ExcludeAdjacent => 1,
            PairPolicy::AllPrevious => 0,
        }
    }

    /// Iterates the pairs for `image_count` images.
    pub fn pairs(self, image_count: usize) -> impl Iterator<Item = (usize, usize)> {
        let skip = self.skipped_predecessors();
        (0..image_count).flat_map(move |i| (0..i.saturating_sub(skip)).map(move |j| (i, j)))
    }

    /// Number of pairs [PairPolicy::pairs] yields.
    pub fn pair_count(self, image_count: usize) -> usize {
        let skip = self.skipped_predecessors();
        (0..image_count).map(|i| i.saturating_sub(skip)).sum()
    }
}

impl fmt::Display for PairPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PairPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        PairPolicy::ALL
            .into_iter()
            .find(|policy| policy.name() == lowered)
            .ok_or_else(|| format!("unknown pair policy '{s}' (expected exclude-adjacent or all-previous)"))
    }
}
