//! Domain model for weekly school timetabling.
//!
//! Entities are immutable reference data for the duration of a solver
//! invocation. Collections iterate in id order so every engine component
//! is deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`Subject`].
    SubjectId, "subject-"
);
entity_id!(
    /// Identifier of a [`Teacher`].
    TeacherId, "teacher-"
);
entity_id!(
    /// Identifier of a [`Room`].
    RoomId, "room-"
);
entity_id!(
    /// Identifier of a [`ClassInfo`].
    ClassId, "class-"
);
entity_id!(
    /// Identifier of a [`Grade`].
    GradeId, "grade-"
);
entity_id!(
    /// Identifier of a [`LessonBlock`].
    BlockId, "block-"
);

/// A (day, period) coordinate in the weekly calendar.
///
/// Slots order day-major: all of Monday before all of Tuesday.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Slot {
    pub day: u8,
    pub period: u8,
}

impl Slot {
    pub const fn new(day: u8, period: u8) -> Self {
        Slot { day, period }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {} period {}", self.day + 1, self.period + 1)
    }
}

/// Shape of the weekly calendar: how many days and periods exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarShape {
    days_per_week: u8,
    periods_per_day: u8,
}

impl CalendarShape {
    /// Upper bound on days per week.
    pub const MAX_DAYS: u8 = 6;

    /// Upper bound on periods per day.
    pub const MAX_PERIODS: u8 = 8;

    /// Creates a calendar shape, rejecting empty or oversized weeks.
    pub fn new(days_per_week: u8, periods_per_day: u8) -> crate::Result<Self> {
        if days_per_week == 0 || days_per_week > Self::MAX_DAYS {
            return Err(crate::EngineError::InvalidInput(format!(
                "days_per_week must be 1..={}, got {}",
                Self::MAX_DAYS,
                days_per_week
            )));
        }
        if periods_per_day == 0 || periods_per_day > Self::MAX_PERIODS {
            return Err(crate::EngineError::InvalidInput(format!(
                "periods_per_day must be 1..={}, got {}",
                Self::MAX_PERIODS,
                periods_per_day
            )));
        }
        Ok(CalendarShape {
            days_per_week,
            periods_per_day,
        })
    }

    pub fn days_per_week(&self) -> u8 {
        self.days_per_week
    }

    pub fn periods_per_day(&self) -> u8 {
        self.periods_per_day
    }

    /// Total number of slots in the week.
    pub fn slot_count(&self) -> usize {
        self.days_per_week as usize * self.periods_per_day as usize
    }

    /// True when the slot lies inside this calendar.
    pub fn contains(&self, slot: Slot) -> bool {
        slot.day < self.days_per_week && slot.period < self.periods_per_day
    }

    /// True when a placement of `span` periods starting at `slot` stays
    /// within the slot's day.
    pub fn span_fits(&self, slot: Slot, span: u8) -> bool {
        self.contains(slot) && slot.period as u16 + span as u16 <= self.periods_per_day as u16
    }

    /// All slots of the week in day-major order.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        (0..self.days_per_week).flat_map(move |day| {
            (0..self.periods_per_day).map(move |period| Slot::new(day, period))
        })
    }
}

/// Per-slot availability of a teacher or room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Available,
    Unavailable,
    Preferred,
}

/// Weekly availability map. Slots not explicitly marked are available.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityMap {
    marks: BTreeMap<Slot, Availability>,
}

impl AvailabilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks one slot. `Available` marks are dropped since that is the
    /// default.
    pub fn mark(&mut self, slot: Slot, availability: Availability) {
        if availability == Availability::Available {
            self.marks.remove(&slot);
        } else {
            self.marks.insert(slot, availability);
        }
    }

    /// Builder form of [`mark`](Self::mark).
    pub fn with(mut self, slot: Slot, availability: Availability) -> Self {
        self.mark(slot, availability);
        self
    }

    pub fn status(&self, slot: Slot) -> Availability {
        self.marks.get(&slot).copied().unwrap_or_default()
    }

    pub fn is_available(&self, slot: Slot) -> bool {
        self.status(slot) != Availability::Unavailable
    }

    pub fn is_preferred(&self, slot: Slot) -> bool {
        self.status(slot) == Availability::Preferred
    }
}

/// Category of a subject.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectCategory {
    #[default]
    General,
    Reserve,
    /// School-affair time (assemblies, staff meetings). Placements never
    /// overlap slots reserved for these.
    SchoolAffair,
}

/// A taught subject. Immutable reference data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub short_name: String,
    /// Display color, as the host's hex string (e.g. "#4a90d9").
    pub color: String,
    pub category: SubjectCategory,
}

impl Subject {
    pub fn new(id: SubjectId, name: impl Into<String>) -> Self {
        let name = name.into();
        let short_name = name.chars().take(2).collect();
        Subject {
            id,
            name,
            short_name,
            color: String::new(),
            category: SubjectCategory::General,
        }
    }

    pub fn with_category(mut self, category: SubjectCategory) -> Self {
        self.category = category;
        self
    }
}

/// A teacher, with the subjects they can teach and weekly availability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    pub subjects: BTreeSet<SubjectId>,
    #[serde(default)]
    pub availability: AvailabilityMap,
}

impl Teacher {
    pub fn new(id: TeacherId, name: impl Into<String>) -> Self {
        Teacher {
            id,
            name: name.into(),
            subjects: BTreeSet::new(),
            availability: AvailabilityMap::new(),
        }
    }

    pub fn with_subjects(mut self, subjects: impl IntoIterator<Item = SubjectId>) -> Self {
        self.subjects.extend(subjects);
        self
    }

    pub fn with_availability(mut self, availability: AvailabilityMap) -> Self {
        self.availability = availability;
        self
    }

    pub fn teaches(&self, subject: SubjectId) -> bool {
        self.subjects.contains(&subject)
    }
}

/// A room. Exclusive by default; `shared_capacity` rooms (gym, courtyard)
/// may host overlapping placements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub shared_capacity: bool,
}

impl Room {
    pub fn new(id: RoomId, name: impl Into<String>) -> Self {
        Room {
            id,
            name: name.into(),
            shared_capacity: false,
        }
    }

    pub fn shared(mut self) -> Self {
        self.shared_capacity = true;
        self
    }
}

/// A school grade (year level).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub id: GradeId,
    pub name: String,
    pub year: u8,
}

impl Grade {
    pub fn new(id: GradeId, name: impl Into<String>, year: u8) -> Self {
        Grade {
            id,
            name: name.into(),
            year,
        }
    }
}

/// A class of students, member of one grade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub id: ClassId,
    pub name: String,
    pub grade: GradeId,
}

impl ClassInfo {
    pub fn new(id: ClassId, name: impl Into<String>, grade: GradeId) -> Self {
        ClassInfo {
            id,
            name: name.into(),
            grade,
        }
    }
}

/// Role of a teacher inside a lesson block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeacherRole {
    #[default]
    Main,
    Sub,
}

/// Shape of a lesson block's occurrences.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// One period per occurrence.
    #[default]
    Normal,
    /// `n` contiguous periods on the same day, placed atomically.
    Consecutive(u8),
}

impl BlockKind {
    /// Number of adjacent periods one occurrence spans.
    pub fn span(&self) -> u8 {
        match self {
            BlockKind::Normal => 1,
            BlockKind::Consecutive(n) => *n,
        }
    }
}

/// A unit of scheduling demand ("koma"): one subject taught to a set of
/// classes by a set of teachers in a set of rooms, `repeat` times a week.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonBlock {
    pub id: BlockId,
    pub subject: SubjectId,
    #[serde(default)]
    pub kind: BlockKind,
    pub classes: Vec<ClassId>,
    pub teachers: Vec<(TeacherId, TeacherRole)>,
    #[serde(default)]
    pub rooms: Vec<RoomId>,
    /// Weekly occurrence count.
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

fn default_repeat() -> u32 {
    1
}

impl LessonBlock {
    pub fn new(id: BlockId, subject: SubjectId) -> Self {
        LessonBlock {
            id,
            subject,
            kind: BlockKind::Normal,
            classes: Vec::new(),
            teachers: Vec::new(),
            rooms: Vec::new(),
            repeat: 1,
        }
    }

    pub fn consecutive(mut self, periods: u8) -> Self {
        self.kind = BlockKind::Consecutive(periods);
        self
    }

    pub fn with_classes(mut self, classes: impl IntoIterator<Item = ClassId>) -> Self {
        self.classes.extend(classes);
        self
    }

    pub fn with_teacher(mut self, teacher: TeacherId, role: TeacherRole) -> Self {
        self.teachers.push((teacher, role));
        self
    }

    pub fn with_rooms(mut self, rooms: impl IntoIterator<Item = RoomId>) -> Self {
        self.rooms.extend(rooms);
        self
    }

    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }

    /// Number of participating classes, teachers and rooms; the solver's
    /// secondary ordering key.
    pub fn participant_count(&self) -> usize {
        self.classes.len() + self.teachers.len() + self.rooms.len()
    }

    pub fn teacher_ids(&self) -> impl Iterator<Item = TeacherId> + '_ {
        self.teachers.iter().map(|(id, _)| *id)
    }
}

/// One schedulable occurrence of a lesson block.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct OccurrenceId {
    pub block: BlockId,
    pub index: u32,
}

impl OccurrenceId {
    pub const fn new(block: BlockId, index: u32) -> Self {
        OccurrenceId { block, index }
    }
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.block, self.index)
    }
}

/// Assignment of one occurrence to a slot. `span` periods are covered,
/// starting at `slot.period`, all on `slot.day`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub occurrence: OccurrenceId,
    pub slot: Slot,
    pub span: u8,
}

impl Placement {
    pub fn new(occurrence: OccurrenceId, slot: Slot, span: u8) -> Self {
        Placement {
            occurrence,
            slot,
            span,
        }
    }

    /// The slots this placement covers, in period order.
    pub fn covered_slots(&self) -> impl Iterator<Item = Slot> + '_ {
        (0..self.span).map(move |offset| Slot::new(self.slot.day, self.slot.period + offset))
    }

    /// True when both placements share a covered slot.
    pub fn overlaps(&self, other: &Placement) -> bool {
        self.slot.day == other.slot.day
            && self.slot.period < other.slot.period + other.span
            && other.slot.period < self.slot.period + self.span
    }
}

/// A complete or partial mapping from occurrences to placements.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementSet {
    placements: BTreeMap<OccurrenceId, Placement>,
}

impl PlacementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a placement, returning the one it replaced, if any.
    pub fn insert(&mut self, placement: Placement) -> Option<Placement> {
        self.placements.insert(placement.occurrence, placement)
    }

    pub fn remove(&mut self, occurrence: OccurrenceId) -> Option<Placement> {
        self.placements.remove(&occurrence)
    }

    pub fn get(&self, occurrence: OccurrenceId) -> Option<&Placement> {
        self.placements.get(&occurrence)
    }

    /// Placements in occurrence-id order.
    pub fn iter(&self) -> impl Iterator<Item = &Placement> {
        self.placements.values()
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

impl FromIterator<Placement> for PlacementSet {
    fn from_iter<I: IntoIterator<Item = Placement>>(iter: I) -> Self {
        let mut set = PlacementSet::new();
        for placement in iter {
            set.insert(placement);
        }
        set
    }
}
