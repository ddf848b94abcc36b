//! Exam-supervisor assignment.

use std::collections::BTreeMap;

use serde::Serialize;

use jikanwari_core::{
    DomainSnapshot, EngineError, PlacementSet, Result, Slot, SubjectId, TeacherId,
};

use crate::context::teacher_workload;
use crate::scorer::{rank, Feature, ScoredCandidate};

/// One exam slot in need of a supervising teacher.
#[derive(Clone, Debug, Serialize)]
pub struct SupervisorRequest {
    pub slot: Slot,
    /// The subject being examined.
    pub subject: SubjectId,
    /// Supervision duties already assigned across the exam period, for
    /// load balancing. Engine state stays request-scoped: this comes
    /// from the host, not from a previous `rank` call.
    pub existing_assignments: BTreeMap<TeacherId, u32>,
}

/// One candidate supervisor.
#[derive(Clone, Debug, Serialize)]
pub struct SupervisorCandidate {
    pub teacher: TeacherId,
    pub name: String,
    available: bool,
    same_subject: bool,
    subject_teacher: bool,
    supervision_count: u32,
}

/// Ranks teachers for an exam slot. Unavailable teachers (marked so, or
/// already teaching then) are excluded from the ranking.
pub fn suggest_supervisors(
    domain: &DomainSnapshot,
    timetable: &PlacementSet,
    request: &SupervisorRequest,
) -> Result<Vec<ScoredCandidate<SupervisorCandidate>>> {
    if domain.subject(request.subject).is_none() {
        return Err(EngineError::InvalidInput(format!(
            "supervisor request references unknown {}",
            request.subject
        )));
    }
    if !domain.calendar().contains(request.slot) {
        return Err(EngineError::InvalidInput(format!(
            "supervisor request slot {} is outside the calendar",
            request.slot
        )));
    }

    let workload = teacher_workload(domain, timetable)?;
    let candidates: Vec<SupervisorCandidate> = domain
        .teachers()
        .map(|teacher| SupervisorCandidate {
            teacher: teacher.id,
            name: teacher.name.clone(),
            available: teacher.availability.is_available(request.slot)
                && !workload.is_busy(teacher.id, request.slot),
            same_subject: teacher.teaches(request.subject),
            subject_teacher: !teacher.subjects.is_empty(),
            supervision_count: request
                .existing_assignments
                .get(&teacher.id)
                .copied()
                .unwrap_or(0),
        })
        .collect();

    let features = vec![
        Feature::gate("対応可能", |c: &SupervisorCandidate| c.available),
        Feature::graded("同教科", 3.0, |c: &SupervisorCandidate| {
            if c.same_subject { 1.0 } else { 0.0 }
        }),
        Feature::graded("教科担当", 1.0, |c: &SupervisorCandidate| {
            if c.subject_teacher { 1.0 } else { 0.0 }
        }),
        Feature::graded("監督回数", -1.0, |c: &SupervisorCandidate| {
            c.supervision_count as f64
        }),
    ];

    let ranked = rank(candidates, &features);
    tracing::debug!(
        slot = %request.slot,
        subject = %request.subject,
        candidates = ranked.len(),
        "ranked supervisor suggestions"
    );
    Ok(ranked)
}
