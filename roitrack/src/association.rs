//! Cross-frame bounding box association by keypoint votes
//!
//! Every keypoint correspondence whose previous endpoint falls inside a
//! previous-frame box and whose current endpoint falls inside a current-frame
//! box casts one vote for that (current, previous) pair. The resulting tally
//! matrix is then turned into an association map by one of two strategies:
//! - `GreedyMaxTally`: each current box independently takes its best
//!   previous box. Two current boxes may claim the same previous box.
//! - `Bipartite`: maximum total votes under a one-to-one constraint.

use crate::hungarian::HungarianSolver;
use crate::roi::{BoxId, LabeledRoi, OverlapTieBreak};
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Pixel positions of one correspondence: (previous endpoint, current endpoint)
pub type EndpointPair = ([f64; 2], [f64; 2]);

/// Vote counts between current-frame rows and previous-frame columns
#[derive(Debug, Clone, PartialEq)]
pub struct TallyMatrix {
    pub counts: Array2<u32>,
    pub current_ids: Vec<BoxId>,
    pub previous_ids: Vec<BoxId>,
    /// Correspondences that found a box in both frames
    pub voting: usize,
}

impl TallyMatrix {
    /// Count votes for every (current box, previous box) pair.
    ///
    /// Each endpoint is attributed to at most one box per frame, chosen by
    /// `tie_break` when rectangles overlap.
    pub fn build(
        current: &[LabeledRoi],
        previous: &[LabeledRoi],
        endpoints: &[EndpointPair],
        tie_break: OverlapTieBreak,
    ) -> Self {
        let mut counts = Array2::zeros((current.len(), previous.len()));

        let votes: Vec<(usize, usize)> = endpoints
            .par_iter()
            .filter_map(|(prev_pt, curr_pt)| {
                let row = tie_break.resolve(current, curr_pt[0], curr_pt[1])?;
                let col = tie_break.resolve(previous, prev_pt[0], prev_pt[1])?;
                Some((row, col))
            })
            .collect();

        for &(row, col) in &votes {
            counts[[row, col]] += 1;
        }

        Self {
            counts,
            current_ids: current.iter().map(|r| r.id).collect(),
            previous_ids: previous.iter().map(|r| r.id).collect(),
            voting: votes.len(),
        }
    }

    /// Votes linking the given current and previous box identifiers
    pub fn count(&self, current_id: BoxId, previous_id: BoxId) -> Option<u32> {
        let row = self.current_ids.iter().position(|&id| id == current_id)?;
        let col = self.previous_ids.iter().position(|&id| id == previous_id)?;
        Some(self.counts[[row, col]])
    }

    pub fn nrows(&self) -> usize {
        self.counts.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.counts.ncols()
    }
}

/// How the tally matrix is turned into an association map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationStrategy {
    /// Per current box, the previous box with the most votes (lowest id on ties)
    #[default]
    GreedyMaxTally,
    /// One-to-one maximum-weight assignment (Kuhn-Munkres)
    Bipartite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationConfig {
    pub strategy: AssociationStrategy,
    pub tie_break: OverlapTieBreak,
    /// Greedy only: leave a current box unassociated when no previous box
    /// received any of its votes. Bipartite never pairs zero-vote boxes.
    pub require_support: bool,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            strategy: AssociationStrategy::GreedyMaxTally,
            tie_break: OverlapTieBreak::SmallestArea,
            require_support: false,
        }
    }
}

/// A current-frame box linked to a previous-frame box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxAssociation {
    pub current_id: BoxId,
    pub previous_id: BoxId,
    /// Number of correspondences voting for this pair
    pub support: u32,
}

/// Current box id -> chosen previous box
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationMap {
    entries: BTreeMap<BoxId, BoxAssociation>,
}

impl AssociationMap {
    pub fn insert(&mut self, association: BoxAssociation) {
        self.entries.insert(association.current_id, association);
    }

    pub fn get(&self, current_id: BoxId) -> Option<&BoxAssociation> {
        self.entries.get(&current_id)
    }

    pub fn previous_of(&self, current_id: BoxId) -> Option<BoxId> {
        self.get(current_id).map(|a| a.previous_id)
    }

    /// Associations in ascending current-id order
    pub fn iter(&self) -> impl Iterator<Item = &BoxAssociation> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Previous ids claimed by more than one current box
    pub fn previous_claims(&self) -> Vec<BoxId> {
        let mut seen = BTreeSet::new();
        let mut shared = BTreeSet::new();
        for a in self.entries.values() {
            if !seen.insert(a.previous_id) {
                shared.insert(a.previous_id);
            }
        }
        shared.into_iter().collect()
    }
}

/// Common interface for association strategies
pub trait BoxAssociator: Send + Sync {
    fn associate(&self, tally: &TallyMatrix) -> AssociationMap;
}

/// Independent per-row maximum; not injective
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyAssociator {
    pub require_support: bool,
}

impl BoxAssociator for GreedyAssociator {
    fn associate(&self, tally: &TallyMatrix) -> AssociationMap {
        let mut map = AssociationMap::default();

        for (row, &current_id) in tally.current_ids.iter().enumerate() {
            // Highest count first, then lowest previous id
            let best = tally
                .previous_ids
                .iter()
                .enumerate()
                .map(|(col, &previous_id)| (tally.counts[[row, col]], previous_id))
                .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

            let Some((support, previous_id)) = best else {
                continue;
            };
            if support == 0 && self.require_support {
                continue;
            }

            map.insert(BoxAssociation {
                current_id,
                previous_id,
                support,
            });
        }

        map
    }
}

/// One-to-one maximum total support
#[derive(Debug, Clone, Copy, Default)]
pub struct BipartiteAssociator;

impl BoxAssociator for BipartiteAssociator {
    fn associate(&self, tally: &TallyMatrix) -> AssociationMap {
        let result = HungarianSolver::solve_max(tally.counts.view());
        let mut map = AssociationMap::default();

        for (row, col) in result.assignments {
            map.insert(BoxAssociation {
                current_id: tally.current_ids[row],
                previous_id: tally.previous_ids[col],
                support: tally.counts[[row, col]],
            });
        }

        map
    }
}

impl AssociationConfig {
    pub fn associator(&self) -> Box<dyn BoxAssociator> {
        match self.strategy {
            AssociationStrategy::GreedyMaxTally => Box::new(GreedyAssociator {
                require_support: self.require_support,
            }),
            AssociationStrategy::Bipartite => Box::new(BipartiteAssociator),
        }
    }

    /// Build the tally and resolve it with the configured strategy
    pub fn associate(
        &self,
        current: &[LabeledRoi],
        previous: &[LabeledRoi],
        endpoints: &[EndpointPair],
    ) -> (TallyMatrix, AssociationMap) {
        let tally = TallyMatrix::build(current, previous, endpoints, self.tie_break);
        let map = self.associator().associate(&tally);

        log::debug!(
            "Associated {}/{} current boxes from {} voting correspondences ({:?})",
            map.len(),
            current.len(),
            tally.voting,
            self.strategy
        );

        (tally, map)
    }
}
