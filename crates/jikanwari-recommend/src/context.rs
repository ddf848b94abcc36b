//! Per-teacher workload derived from the current timetable.

use std::collections::{BTreeMap, BTreeSet};

use jikanwari_core::{DomainSnapshot, EngineError, GradeId, PlacementSet, Result, Slot, TeacherId};

/// What each teacher is currently doing, extracted once per request so
/// feature closures stay cheap and `'static`.
#[derive(Debug, Default)]
pub(crate) struct TeacherWorkload {
    busy: BTreeMap<TeacherId, BTreeSet<Slot>>,
    load: BTreeMap<TeacherId, u32>,
    grades: BTreeMap<TeacherId, BTreeSet<GradeId>>,
}

impl TeacherWorkload {
    pub fn is_busy(&self, teacher: TeacherId, slot: Slot) -> bool {
        self.busy.get(&teacher).is_some_and(|slots| slots.contains(&slot))
    }

    pub fn load(&self, teacher: TeacherId) -> u32 {
        self.load.get(&teacher).copied().unwrap_or(0)
    }

    pub fn teaches_grade(&self, teacher: TeacherId, grade: GradeId) -> bool {
        self.grades.get(&teacher).is_some_and(|grades| grades.contains(&grade))
    }
}

pub(crate) fn teacher_workload(
    domain: &DomainSnapshot,
    timetable: &PlacementSet,
) -> Result<TeacherWorkload> {
    let mut workload = TeacherWorkload::default();
    for placement in timetable.iter() {
        let block = domain.block(placement.occurrence.block).ok_or_else(|| {
            EngineError::InvalidInput(format!(
                "timetable references unknown {}",
                placement.occurrence.block
            ))
        })?;
        for teacher in block.teacher_ids() {
            let entry = workload.busy.entry(teacher).or_default();
            for slot in placement.covered_slots() {
                entry.insert(slot);
            }
            *workload.load.entry(teacher).or_insert(0) += placement.span as u32;
            let grades = workload.grades.entry(teacher).or_default();
            for class in &block.classes {
                if let Some(class) = domain.class(*class) {
                    grades.insert(class.grade);
                }
            }
        }
    }
    Ok(workload)
}
