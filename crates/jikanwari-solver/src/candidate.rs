//! Candidate timetables and diversity ranking.

use serde::{Deserialize, Serialize};

use jikanwari_core::{PenaltyScore, PlacementSet};

/// One complete timetable proposal.
///
/// Anything the solver returns has a zero hard level; the soft level
/// ranks competing candidates. `diversity` is the placement distance to
/// the nearest higher-ranked candidate, filled in during final ranking
/// so the host's pattern-comparison view can show how different each
/// alternative really is.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimetableCandidate {
    pub placements: PlacementSet,
    pub score: PenaltyScore,
    pub diversity: usize,
}

impl TimetableCandidate {
    pub fn new(placements: PlacementSet, score: PenaltyScore) -> Self {
        TimetableCandidate {
            placements,
            score,
            diversity: 0,
        }
    }

    /// Number of occurrences placed differently between two candidates.
    pub fn distance(&self, other: &TimetableCandidate) -> usize {
        let mut distance = 0;
        for placement in self.placements.iter() {
            match other.placements.get(placement.occurrence) {
                Some(theirs) if theirs.slot == placement.slot => {}
                _ => distance += 1,
            }
        }
        for placement in other.placements.iter() {
            if self.placements.get(placement.occurrence).is_none() {
                distance += 1;
            }
        }
        distance
    }
}

/// Orders candidates best-score-first, breaking score ties in favor of
/// the candidate farthest from everything already selected, so the top-K
/// are not near-duplicates. Returns at most `max` candidates.
///
/// `candidates` must arrive in discovery order; that order is the final
/// deterministic tie-break.
pub fn rank_with_diversity(
    mut candidates: Vec<TimetableCandidate>,
    max: usize,
) -> Vec<TimetableCandidate> {
    let mut ranked: Vec<TimetableCandidate> = Vec::with_capacity(max.min(candidates.len()));

    while ranked.len() < max && !candidates.is_empty() {
        let mut best_index = 0;
        let mut best_key = selection_key(&candidates[0], &ranked);
        for (index, candidate) in candidates.iter().enumerate().skip(1) {
            let key = selection_key(candidate, &ranked);
            if key > best_key {
                best_key = key;
                best_index = index;
            }
        }
        let mut chosen = candidates.remove(best_index);
        // The leader has nothing ranked above it to differ from.
        chosen.diversity = if ranked.is_empty() { 0 } else { best_key.1 };
        ranked.push(chosen);
    }
    ranked
}

/// (score, min distance to already-ranked). Score dominates; diversity
/// only separates equally-scored candidates. `remove`-stable iteration
/// keeps discovery order as the last resort.
fn selection_key(
    candidate: &TimetableCandidate,
    ranked: &[TimetableCandidate],
) -> (PenaltyScore, usize) {
    let min_distance = ranked
        .iter()
        .map(|selected| candidate.distance(selected))
        .min()
        .unwrap_or(usize::MAX);
    (candidate.score, min_distance)
}
