//! Reschedule-slot proposals for a cancelled lesson.

use serde::Serialize;

use jikanwari_core::{
    ConstraintConfig, DomainSnapshot, EngineError, OccurrenceId, Placement, PlacementSet, Result,
    Slot,
};
use jikanwari_scoring::ConstraintEvaluator;

use crate::scorer::{rank, Feature, ScoredCandidate};

/// A placed occurrence that must move to a different slot.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct RescheduleRequest {
    pub occurrence: OccurrenceId,
}

/// One candidate target slot for the move.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct RescheduleProposal {
    pub slot: Slot,
    feasible: bool,
    /// Soft-score change of the whole timetable if the lesson moves
    /// here. Positive is an improvement (e.g. a closed gap).
    pub soft_delta: f64,
}

/// Ranks candidate (day, period) slots for moving a placed lesson.
///
/// Slots where any participant is double-booked or unavailable are
/// excluded; the rest are ordered by the soft-score impact of the move,
/// which folds in conflict penalties and schedule-gap changes.
pub fn propose_reschedule(
    domain: &DomainSnapshot,
    constraints: &ConstraintConfig,
    timetable: &PlacementSet,
    request: &RescheduleRequest,
) -> Result<Vec<ScoredCandidate<RescheduleProposal>>> {
    let evaluator = ConstraintEvaluator::new(domain, constraints)?;
    let current = *timetable.get(request.occurrence).ok_or_else(|| {
        EngineError::InvalidInput(format!("{} is not placed", request.occurrence))
    })?;
    let block = domain.block(request.occurrence.block).ok_or_else(|| {
        EngineError::InvalidInput(format!("unknown {}", request.occurrence.block))
    })?;

    // Rebuild the week without the lesson being moved.
    let mut director = evaluator.director();
    for placement in timetable.iter() {
        if placement.occurrence == request.occurrence {
            continue;
        }
        let placed_block = domain.block(placement.occurrence.block).ok_or_else(|| {
            EngineError::InvalidInput(format!(
                "timetable references unknown {}",
                placement.occurrence.block
            ))
        })?;
        director.place(placed_block, placement);
    }

    let baseline = {
        director.place(block, &current);
        let score = director.score();
        director.unplace(block, &current);
        score
    };

    let calendar = domain.calendar();
    let mut proposals = Vec::new();
    for slot in calendar.slots() {
        if slot == current.slot || !calendar.span_fits(slot, current.span) {
            continue;
        }
        let candidate = Placement::new(request.occurrence, slot, current.span);
        let feasible = director.try_place(block, &candidate).is_none();
        let soft_delta = if feasible {
            director.place(block, &candidate);
            let score = director.score();
            director.unplace(block, &candidate);
            score.soft() - baseline.soft()
        } else {
            0.0
        };
        proposals.push(RescheduleProposal {
            slot,
            feasible,
            soft_delta,
        });
    }

    let features = vec![
        Feature::gate("移動可能", |p: &RescheduleProposal| p.feasible),
        Feature::graded("時間割への影響", 1.0, |p: &RescheduleProposal| p.soft_delta),
    ];

    let ranked = rank(proposals, &features);
    tracing::debug!(
        occurrence = %request.occurrence,
        from = %current.slot,
        candidates = ranked.len(),
        "ranked reschedule proposals"
    );
    Ok(ranked)
}
