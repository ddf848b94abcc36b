//! Substitute-teacher suggestion.

use std::collections::BTreeSet;

use serde::Serialize;

use jikanwari_core::{
    ClassId, DomainSnapshot, EngineError, PlacementSet, Result, Slot, SubjectId, TeacherId,
};

use crate::context::teacher_workload;
use crate::scorer::{rank, Feature, ScoredCandidate};

/// A cancelled lesson occurrence in need of a stand-in teacher.
#[derive(Clone, Debug, Serialize)]
pub struct SubstituteRequest {
    pub slot: Slot,
    pub subject: SubjectId,
    pub classes: Vec<ClassId>,
    pub absent_teacher: TeacherId,
    /// Teachers who covered a recent cancellation; mildly penalized so
    /// substitution duty rotates.
    pub recent_substitutes: BTreeSet<TeacherId>,
}

/// One candidate stand-in, with the facts the features grade.
#[derive(Clone, Debug, Serialize)]
pub struct SubstituteCandidate {
    pub teacher: TeacherId,
    pub name: String,
    teaches_subject: bool,
    available: bool,
    load: u32,
    same_grade: bool,
    recent: bool,
}

/// Ranks every other teacher as a stand-in for the cancelled lesson.
///
/// Teachers who do not teach the subject, are unavailable at the slot,
/// or already teach then are excluded, not penalized.
pub fn suggest_substitutes(
    domain: &DomainSnapshot,
    timetable: &PlacementSet,
    request: &SubstituteRequest,
) -> Result<Vec<ScoredCandidate<SubstituteCandidate>>> {
    if domain.subject(request.subject).is_none() {
        return Err(EngineError::InvalidInput(format!(
            "substitute request references unknown {}",
            request.subject
        )));
    }
    if domain.teacher(request.absent_teacher).is_none() {
        return Err(EngineError::InvalidInput(format!(
            "substitute request references unknown {}",
            request.absent_teacher
        )));
    }
    if !domain.calendar().contains(request.slot) {
        return Err(EngineError::InvalidInput(format!(
            "substitute request slot {} is outside the calendar",
            request.slot
        )));
    }

    let workload = teacher_workload(domain, timetable)?;
    let grades: BTreeSet<_> = request
        .classes
        .iter()
        .filter_map(|class| domain.class(*class).map(|c| c.grade))
        .collect();

    let candidates: Vec<SubstituteCandidate> = domain
        .teachers()
        .filter(|teacher| teacher.id != request.absent_teacher)
        .map(|teacher| SubstituteCandidate {
            teacher: teacher.id,
            name: teacher.name.clone(),
            teaches_subject: teacher.teaches(request.subject),
            available: teacher.availability.is_available(request.slot)
                && !workload.is_busy(teacher.id, request.slot),
            load: workload.load(teacher.id),
            same_grade: grades.iter().any(|g| workload.teaches_grade(teacher.id, *g)),
            recent: request.recent_substitutes.contains(&teacher.id),
        })
        .collect();

    let features = vec![
        Feature::gate("同教科", |c: &SubstituteCandidate| c.teaches_subject),
        Feature::gate("対応可能", |c: &SubstituteCandidate| c.available),
        Feature::graded("現在の負荷", -0.5, |c: &SubstituteCandidate| c.load as f64),
        Feature::graded("学年近接", 1.0, |c: &SubstituteCandidate| {
            if c.same_grade { 1.0 } else { 0.0 }
        }),
        Feature::graded("直近の代行", -1.0, |c: &SubstituteCandidate| {
            if c.recent { 1.0 } else { 0.0 }
        }),
    ];

    let ranked = rank(candidates, &features);
    tracing::debug!(
        slot = %request.slot,
        subject = %request.subject,
        candidates = ranked.len(),
        "ranked substitute suggestions"
    );
    Ok(ranked)
}
