//! Constructive chronological backtracking.
//!
//! Occurrences are assigned most-constrained-first: the occurrence with
//! the fewest legal remaining slots is placed next, ties broken by the
//! largest participant set and then id order. Candidate slots are
//! filtered through the director's hard-constraint check before they are
//! ever tried, ordered by soft-score impact with a seeded random
//! tie-break (the restart perturbation), and unwound chronologically on
//! dead ends.

use rand::Rng;
use smallvec::SmallVec;

use jikanwari_core::{LessonBlock, OccurrenceId, PenaltyScore, Placement, PlacementSet};
use jikanwari_scoring::{ConstraintEvaluator, TimetableDirector};

use crate::scope::SearchScope;
use crate::termination::Termination;

/// Result of one restart.
pub enum AttemptOutcome {
    /// Every occurrence is placed; no hard constraint is violated.
    Complete(PlacementSet, PenaltyScore),
    /// The search space was exhausted without a complete assignment.
    /// Chronological backtracking is systematic, so this proves
    /// infeasibility regardless of the perturbation seed.
    Exhausted,
    /// Termination fired mid-search.
    Halted,
}

type Candidates = SmallVec<[Placement; 8]>;

struct Frame {
    position: usize,
    candidates: Candidates,
    /// Index one past the candidate currently placed.
    next: usize,
}

/// Runs one full backtracking attempt over all occurrences.
pub(crate) fn run_attempt<T: Termination>(
    evaluator: &ConstraintEvaluator<'_>,
    scope: &mut SearchScope,
    termination: &T,
) -> AttemptOutcome {
    let domain = evaluator.domain();
    let occurrences: Vec<(OccurrenceId, &LessonBlock)> = domain.occurrences().collect();
    let mut director = evaluator.director();
    let mut assigned = vec![false; occurrences.len()];
    let mut stack: Vec<Frame> = Vec::new();

    'search: loop {
        if termination.is_terminated(scope) {
            return AttemptOutcome::Halted;
        }
        scope.count_step();

        let Some((position, candidates)) =
            select_most_constrained(&director, &occurrences, &assigned)
        else {
            // All occurrences placed.
            let placements = director.placements().clone();
            debug_assert!(
                director.scan_violations().is_empty(),
                "search produced a hard-violating timetable"
            );
            return AttemptOutcome::Complete(placements, director.score());
        };

        if !candidates.is_empty() {
            let (_, block) = occurrences[position];
            let candidates = order_candidates(&mut director, block, candidates, scope);
            director.place(block, &candidates[0]);
            assigned[position] = true;
            stack.push(Frame {
                position,
                candidates,
                next: 1,
            });
            continue 'search;
        }

        // Dead end: unwind to the most recent choice point with an
        // untried alternative.
        loop {
            let Some(mut frame) = stack.pop() else {
                return AttemptOutcome::Exhausted;
            };
            let (_, block) = occurrences[frame.position];
            director.unplace(block, &frame.candidates[frame.next - 1]);
            assigned[frame.position] = false;

            if frame.next < frame.candidates.len() {
                if termination.is_terminated(scope) {
                    return AttemptOutcome::Halted;
                }
                scope.count_step();
                director.place(block, &frame.candidates[frame.next]);
                assigned[frame.position] = true;
                frame.next += 1;
                stack.push(frame);
                continue 'search;
            }
        }
    }
}

/// Picks the unassigned occurrence with the fewest legal placements.
///
/// Returns `None` when everything is assigned; an empty candidate list
/// means the chosen occurrence is a dead end.
fn select_most_constrained(
    director: &TimetableDirector<'_>,
    occurrences: &[(OccurrenceId, &LessonBlock)],
    assigned: &[bool],
) -> Option<(usize, Candidates)> {
    let mut best: Option<(usize, Candidates, usize)> = None;

    for (position, (occurrence, block)) in occurrences.iter().enumerate() {
        if assigned[position] {
            continue;
        }
        let candidates = legal_placements(director, *occurrence, block);
        let participants = block.participant_count();

        let better = match &best {
            None => true,
            Some((_, current, current_participants)) => {
                candidates.len() < current.len()
                    || (candidates.len() == current.len() && participants > *current_participants)
            }
        };
        if better {
            // A dead end cannot be beaten; fail fast to the backtracker.
            if candidates.is_empty() {
                return Some((position, candidates));
            }
            best = Some((position, candidates, participants));
        }
    }

    best.map(|(position, candidates, _)| (position, candidates))
}

/// All placements of `block` the hard constraints currently allow.
fn legal_placements(
    director: &TimetableDirector<'_>,
    occurrence: OccurrenceId,
    block: &LessonBlock,
) -> Candidates {
    let calendar = director.calendar();
    let span = block.kind.span();
    let mut legal = Candidates::new();
    for slot in calendar.slots() {
        if !calendar.span_fits(slot, span) {
            continue;
        }
        let placement = Placement::new(occurrence, slot, span);
        if director.try_place(block, &placement).is_none() {
            legal.push(placement);
        }
    }
    legal
}

/// Orders candidates by soft-score impact (best first). Equal impacts
/// are separated by a per-candidate random draw, which is what makes
/// each restart explore a different region; slot order is the final
/// deterministic tie-break.
fn order_candidates(
    director: &mut TimetableDirector<'_>,
    block: &LessonBlock,
    candidates: Candidates,
    scope: &mut SearchScope,
) -> Candidates {
    let mut weighted: SmallVec<[(Placement, PenaltyScore, u32); 8]> = candidates
        .into_iter()
        .map(|placement| {
            director.place(block, &placement);
            let score = director.score();
            director.unplace(block, &placement);
            (placement, score, scope.rng().random::<u32>())
        })
        .collect();

    weighted.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then(a.2.cmp(&b.2))
            .then(a.0.slot.cmp(&b.0.slot))
    });
    weighted.into_iter().map(|(placement, _, _)| placement).collect()
}
