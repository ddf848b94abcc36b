//! Read-only domain snapshot consumed by every engine entry point.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::{
    BlockId, BlockKind, CalendarShape, ClassId, ClassInfo, Grade, GradeId, LessonBlock,
    OccurrenceId, Room, RoomId, Subject, SubjectId, Teacher, TeacherId,
};

/// Immutable per-invocation snapshot of the timetable source data.
///
/// The host loads entities once per solver invocation; the engine treats
/// them as read-only for the whole run. All lookups are keyed by id and
/// iterate in id order, which keeps every downstream component
/// deterministic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DomainSnapshot {
    calendar: CalendarShape,
    subjects: BTreeMap<SubjectId, Subject>,
    teachers: BTreeMap<TeacherId, Teacher>,
    rooms: BTreeMap<RoomId, Room>,
    classes: BTreeMap<ClassId, ClassInfo>,
    grades: BTreeMap<GradeId, Grade>,
    blocks: BTreeMap<BlockId, LessonBlock>,
}

impl DomainSnapshot {
    pub fn new(calendar: CalendarShape) -> Self {
        DomainSnapshot {
            calendar,
            subjects: BTreeMap::new(),
            teachers: BTreeMap::new(),
            rooms: BTreeMap::new(),
            classes: BTreeMap::new(),
            grades: BTreeMap::new(),
            blocks: BTreeMap::new(),
        }
    }

    pub fn with_subjects(mut self, subjects: impl IntoIterator<Item = Subject>) -> Self {
        self.subjects.extend(subjects.into_iter().map(|s| (s.id, s)));
        self
    }

    pub fn with_teachers(mut self, teachers: impl IntoIterator<Item = Teacher>) -> Self {
        self.teachers.extend(teachers.into_iter().map(|t| (t.id, t)));
        self
    }

    pub fn with_rooms(mut self, rooms: impl IntoIterator<Item = Room>) -> Self {
        self.rooms.extend(rooms.into_iter().map(|r| (r.id, r)));
        self
    }

    pub fn with_classes(mut self, classes: impl IntoIterator<Item = ClassInfo>) -> Self {
        self.classes.extend(classes.into_iter().map(|c| (c.id, c)));
        self
    }

    pub fn with_grades(mut self, grades: impl IntoIterator<Item = Grade>) -> Self {
        self.grades.extend(grades.into_iter().map(|g| (g.id, g)));
        self
    }

    pub fn with_blocks(mut self, blocks: impl IntoIterator<Item = LessonBlock>) -> Self {
        self.blocks.extend(blocks.into_iter().map(|b| (b.id, b)));
        self
    }

    pub fn calendar(&self) -> CalendarShape {
        self.calendar
    }

    pub fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.get(&id)
    }

    pub fn teacher(&self, id: TeacherId) -> Option<&Teacher> {
        self.teachers.get(&id)
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn class(&self, id: ClassId) -> Option<&ClassInfo> {
        self.classes.get(&id)
    }

    pub fn grade(&self, id: GradeId) -> Option<&Grade> {
        self.grades.get(&id)
    }

    pub fn block(&self, id: BlockId) -> Option<&LessonBlock> {
        self.blocks.get(&id)
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.values()
    }

    pub fn teachers(&self) -> impl Iterator<Item = &Teacher> {
        self.teachers.values()
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.values()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &LessonBlock> {
        self.blocks.values()
    }

    pub fn teacher_count(&self) -> usize {
        self.teachers.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Every schedulable occurrence, expanded from block repeat counts,
    /// in (block, index) order.
    pub fn occurrences(&self) -> impl Iterator<Item = (OccurrenceId, &LessonBlock)> {
        self.blocks.values().flat_map(|block| {
            (0..block.repeat).map(move |index| (OccurrenceId::new(block.id, index), block))
        })
    }

    pub fn occurrence_count(&self) -> usize {
        self.blocks.values().map(|b| b.repeat as usize).sum()
    }

    /// Checks internal consistency before any search work is performed.
    ///
    /// Rejects dangling id references, blocks without classes or
    /// teachers, zero repeat counts, and consecutive spans that cannot
    /// fit into a single day.
    pub fn validate(&self) -> Result<()> {
        for class in self.classes.values() {
            if !self.grades.contains_key(&class.grade) {
                return Err(invalid(format!(
                    "{} references unknown {}",
                    class.id, class.grade
                )));
            }
        }
        for teacher in self.teachers.values() {
            for subject in &teacher.subjects {
                if !self.subjects.contains_key(subject) {
                    return Err(invalid(format!(
                        "{} references unknown {}",
                        teacher.id, subject
                    )));
                }
            }
        }
        for block in self.blocks.values() {
            if !self.subjects.contains_key(&block.subject) {
                return Err(invalid(format!(
                    "{} references unknown {}",
                    block.id, block.subject
                )));
            }
            if block.classes.is_empty() {
                return Err(invalid(format!("{} has no participating class", block.id)));
            }
            if block.teachers.is_empty() {
                return Err(invalid(format!("{} has no teacher", block.id)));
            }
            if block.repeat == 0 {
                return Err(invalid(format!("{} has repeat 0", block.id)));
            }
            for class in &block.classes {
                if !self.classes.contains_key(class) {
                    return Err(invalid(format!("{} references unknown {}", block.id, class)));
                }
            }
            for teacher in block.teacher_ids() {
                if !self.teachers.contains_key(&teacher) {
                    return Err(invalid(format!(
                        "{} references unknown {}",
                        block.id, teacher
                    )));
                }
            }
            for room in &block.rooms {
                if !self.rooms.contains_key(room) {
                    return Err(invalid(format!("{} references unknown {}", block.id, room)));
                }
            }
            if let BlockKind::Consecutive(span) = block.kind {
                if span < 2 {
                    return Err(invalid(format!(
                        "{} is consecutive with span {}, need at least 2",
                        block.id, span
                    )));
                }
                if span > self.calendar.periods_per_day() {
                    return Err(invalid(format!(
                        "{} spans {} periods but the day only has {}",
                        block.id,
                        span,
                        self.calendar.periods_per_day()
                    )));
                }
            }
        }
        Ok(())
    }
}

fn invalid(message: String) -> EngineError {
    EngineError::InvalidInput(message)
}
