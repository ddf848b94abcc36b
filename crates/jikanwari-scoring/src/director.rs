//! Incremental occupancy ledger.
//!
//! The solver visits thousands of search nodes per second; re-scanning the
//! whole placement set at each node would dominate the runtime. The
//! director keeps per-entity slot occupancy counters that `place` and
//! `unplace` update in O(span × participants), and answers the two
//! questions the search asks:
//!
//! - `try_place`: would this placement violate a hard-leveled constraint?
//! - `score`: what is the current weighted soft score?

use std::collections::BTreeMap;

use smallvec::SmallVec;

use jikanwari_core::{
    Availability, CalendarShape, ClassId, ConstraintConfig, ConstraintFamily, ConstraintLevel,
    DomainSnapshot, LessonBlock, PenaltyScore, Placement, PlacementSet, RoomId, Slot,
    SubjectCategory, SubjectId, TeacherId,
};

use crate::violation::{EntityRef, Violation};

/// Incremental evaluator state for one search (or one `evaluate` call).
///
/// Counters iterate in entity-id order (the index maps are built from the
/// snapshot's sorted collections), so violation reports and scores are
/// deterministic for identical inputs.
pub struct TimetableDirector<'a> {
    domain: &'a DomainSnapshot,
    config: &'a ConstraintConfig,
    calendar: CalendarShape,

    class_ids: Vec<ClassId>,
    teacher_ids: Vec<TeacherId>,
    room_ids: Vec<RoomId>,
    class_index: BTreeMap<ClassId, usize>,
    teacher_index: BTreeMap<TeacherId, usize>,
    room_index: BTreeMap<RoomId, usize>,

    /// Occupancy count per entity per slot, slot-major inside one entity.
    class_slots: Vec<Vec<u32>>,
    teacher_slots: Vec<Vec<u32>>,
    room_slots: Vec<Vec<u32>>,

    teacher_load: Vec<u32>,
    room_load: Vec<u32>,
    rooms_used: usize,

    /// (class index, day, subject) -> occurrence count.
    subject_daily: BTreeMap<(usize, u8, SubjectId), u32>,

    /// Covered (teacher, slot) pairs marked preferred.
    preferred_hits: i64,

    /// Penalty units from violations of families configured `soft`.
    soft_violation_units: f64,

    /// Slots reserved for school affairs, dense by slot index.
    excluded_slots: Vec<bool>,

    placements: PlacementSet,
}

impl<'a> TimetableDirector<'a> {
    pub fn new(domain: &'a DomainSnapshot, config: &'a ConstraintConfig) -> Self {
        let calendar = domain.calendar();
        let slot_count = calendar.slot_count();

        let class_ids: Vec<ClassId> = domain.classes().map(|c| c.id).collect();
        let teacher_ids: Vec<TeacherId> = domain.teachers().map(|t| t.id).collect();
        let room_ids: Vec<RoomId> = domain.rooms().map(|r| r.id).collect();

        let class_index: BTreeMap<ClassId, usize> =
            class_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let teacher_index: BTreeMap<TeacherId, usize> =
            teacher_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let room_index: BTreeMap<RoomId, usize> =
            room_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut excluded_slots = vec![false; slot_count];
        for slot in &config.school_affair_slots {
            if calendar.contains(*slot) {
                excluded_slots[slot_index(calendar, *slot)] = true;
            }
        }

        TimetableDirector {
            domain,
            config,
            calendar,
            class_slots: vec![vec![0; slot_count]; class_ids.len()],
            teacher_slots: vec![vec![0; slot_count]; teacher_ids.len()],
            room_slots: vec![vec![0; slot_count]; room_ids.len()],
            teacher_load: vec![0; teacher_ids.len()],
            room_load: vec![0; room_ids.len()],
            rooms_used: 0,
            class_ids,
            teacher_ids,
            room_ids,
            class_index,
            teacher_index,
            room_index,
            subject_daily: BTreeMap::new(),
            preferred_hits: 0,
            soft_violation_units: 0.0,
            excluded_slots,
            placements: PlacementSet::new(),
        }
    }

    pub fn placements(&self) -> &PlacementSet {
        &self.placements
    }

    pub fn calendar(&self) -> CalendarShape {
        self.calendar
    }

    fn level(&self, family: ConstraintFamily) -> Option<ConstraintLevel> {
        self.config.level_of(family)
    }

    fn is_hard(&self, family: ConstraintFamily) -> bool {
        self.level(family) == Some(ConstraintLevel::Hard)
    }

    fn is_soft(&self, family: ConstraintFamily) -> bool {
        self.level(family) == Some(ConstraintLevel::Soft)
    }

    /// Covered slots that lie inside the calendar, with their dense
    /// indices. Out-of-calendar periods are simply not tracked; the
    /// shape scan reports them.
    fn covered_indices(&self, placement: &Placement) -> SmallVec<[(Slot, usize); 4]> {
        placement
            .covered_slots()
            .filter(|slot| self.calendar.contains(*slot))
            .map(|slot| (slot, slot_index(self.calendar, slot)))
            .collect()
    }

    /// Checks whether placing would violate a hard-leveled constraint,
    /// without mutating any state. Returns the first violation found, in
    /// a fixed check order, so identical inputs prune identically.
    pub fn try_place(&self, block: &LessonBlock, placement: &Placement) -> Option<Violation> {
        // Shape first. A placement running off the day's end is rejected
        // regardless of the configured level: the ledger cannot even
        // represent it.
        if !self.calendar.span_fits(placement.slot, placement.span) {
            return Some(
                Violation::new(
                    ConstraintFamily::ConsecutiveAdjacency,
                    format!("{} does not fit at {}", block.id, placement.slot),
                )
                .at(placement.slot)
                .involving(EntityRef::Block(block.id)),
            );
        }
        if self.is_hard(ConstraintFamily::ConsecutiveAdjacency) && placement.span != block.kind.span()
        {
            return Some(
                Violation::new(
                    ConstraintFamily::ConsecutiveAdjacency,
                    format!(
                        "{} spans {} periods but was placed over {}",
                        block.id,
                        block.kind.span(),
                        placement.span
                    ),
                )
                .at(placement.slot)
                .involving(EntityRef::Block(block.id)),
            );
        }

        if self.is_hard(ConstraintFamily::SchoolAffairExclusion) && !self.is_school_affair(block) {
            for slot in placement.covered_slots() {
                if self.calendar.contains(slot) && self.excluded_slots[slot_index(self.calendar, slot)]
                {
                    return Some(
                        Violation::new(
                            ConstraintFamily::SchoolAffairExclusion,
                            format!("{} is reserved for school affairs", slot),
                        )
                        .at(slot)
                        .involving(EntityRef::Block(block.id)),
                    );
                }
            }
        }

        if self.is_hard(ConstraintFamily::TeacherAvailability) {
            for teacher_id in block.teacher_ids() {
                let Some(teacher) = self.domain.teacher(teacher_id) else {
                    continue;
                };
                let ti = self.teacher_index[&teacher_id];
                for slot in placement.covered_slots() {
                    if !teacher.availability.is_available(slot) {
                        return Some(
                            Violation::new(
                                ConstraintFamily::TeacherAvailability,
                                format!("{} is unavailable at {}", teacher.name, slot),
                            )
                            .at(slot)
                            .involving(EntityRef::Teacher(teacher_id)),
                        );
                    }
                    if self.teacher_slots[ti][slot_index(self.calendar, slot)] > 0 {
                        return Some(
                            Violation::new(
                                ConstraintFamily::TeacherAvailability,
                                format!("{} is already teaching at {}", teacher.name, slot),
                            )
                            .at(slot)
                            .involving(EntityRef::Teacher(teacher_id)),
                        );
                    }
                }
            }
        }

        if self.is_hard(ConstraintFamily::ClassConflict) {
            for class_id in &block.classes {
                let ci = self.class_index[class_id];
                for slot in placement.covered_slots() {
                    if self.class_slots[ci][slot_index(self.calendar, slot)] > 0 {
                        let name = self
                            .domain
                            .class(*class_id)
                            .map(|c| c.name.as_str())
                            .unwrap_or("?");
                        return Some(
                            Violation::new(
                                ConstraintFamily::ClassConflict,
                                format!("class {} already has a lesson at {}", name, slot),
                            )
                            .at(slot)
                            .involving(EntityRef::Class(*class_id)),
                        );
                    }
                }
            }
        }

        if self.is_hard(ConstraintFamily::RoomConflict) {
            for room_id in &block.rooms {
                let Some(room) = self.domain.room(*room_id) else {
                    continue;
                };
                if room.shared_capacity {
                    continue;
                }
                let ri = self.room_index[room_id];
                for slot in placement.covered_slots() {
                    if self.room_slots[ri][slot_index(self.calendar, slot)] > 0 {
                        return Some(
                            Violation::new(
                                ConstraintFamily::RoomConflict,
                                format!("room {} is double-booked at {}", room.name, slot),
                            )
                            .at(slot)
                            .involving(EntityRef::Room(*room_id)),
                        );
                    }
                }
            }
        }

        if self.is_hard(ConstraintFamily::SubjectDistribution) {
            let limit = self.config.max_subject_per_day as u32;
            for class_id in &block.classes {
                let ci = self.class_index[class_id];
                let key = (ci, placement.slot.day, block.subject);
                let current = self.subject_daily.get(&key).copied().unwrap_or(0);
                if current >= limit {
                    return Some(
                        Violation::new(
                            ConstraintFamily::SubjectDistribution,
                            format!(
                                "{} already occurs {} times for {} on day {}",
                                block.subject,
                                current,
                                class_id,
                                placement.slot.day + 1
                            ),
                        )
                        .at(placement.slot)
                        .involving(EntityRef::Subject(block.subject)),
                    );
                }
            }
        }

        None
    }

    /// Records a placement, updating every counter. No constraint check
    /// happens here: `evaluate` places conflicting host-built sets on
    /// purpose and reports the conflicts afterwards.
    pub fn place(&mut self, block: &LessonBlock, placement: &Placement) {
        self.apply(block, placement, 1);
        self.placements.insert(*placement);
    }

    /// Reverses a [`place`](Self::place).
    pub fn unplace(&mut self, block: &LessonBlock, placement: &Placement) {
        self.placements.remove(placement.occurrence);
        self.apply(block, placement, -1);
    }

    fn apply(&mut self, block: &LessonBlock, placement: &Placement, direction: i64) {
        let indices = self.covered_indices(placement);
        let span = placement.span as u32;
        let soft_class = self.is_soft(ConstraintFamily::ClassConflict);
        let soft_teacher = self.is_soft(ConstraintFamily::TeacherAvailability);
        let soft_room = self.is_soft(ConstraintFamily::RoomConflict);
        let soft_affair = self.is_soft(ConstraintFamily::SchoolAffairExclusion);
        let soft_shape = self.is_soft(ConstraintFamily::ConsecutiveAdjacency);

        for class_id in &block.classes {
            let ci = self.class_index[class_id];
            for &(_, si) in &indices {
                let overlapped = bump(&mut self.class_slots[ci][si], direction);
                if soft_class && overlapped {
                    self.soft_violation_units += direction as f64;
                }
            }
        }

        let domain = self.domain;
        for teacher_id in block.teacher_ids() {
            let Some(ti) = self.teacher_index.get(&teacher_id).copied() else {
                continue;
            };
            let teacher = domain.teacher(teacher_id);
            for &(slot, si) in &indices {
                let overlapped = bump(&mut self.teacher_slots[ti][si], direction);
                if soft_teacher && overlapped {
                    self.soft_violation_units += direction as f64;
                }
                if let Some(teacher) = teacher {
                    match teacher.availability.status(slot) {
                        Availability::Preferred => self.preferred_hits += direction,
                        Availability::Unavailable if soft_teacher => {
                            self.soft_violation_units += direction as f64;
                        }
                        _ => {}
                    }
                }
            }
            if direction > 0 {
                self.teacher_load[ti] += span;
            } else {
                self.teacher_load[ti] = self.teacher_load[ti].saturating_sub(span);
            }
        }

        for room_id in &block.rooms {
            let ri = self.room_index[room_id];
            let exclusive = !domain.room(*room_id).map(|r| r.shared_capacity).unwrap_or(false);
            for &(_, si) in &indices {
                let overlapped = bump(&mut self.room_slots[ri][si], direction);
                if soft_room && exclusive && overlapped {
                    self.soft_violation_units += direction as f64;
                }
            }
            if direction > 0 {
                if self.room_load[ri] == 0 {
                    self.rooms_used += 1;
                }
                self.room_load[ri] += span;
            } else {
                self.room_load[ri] = self.room_load[ri].saturating_sub(span);
                if self.room_load[ri] == 0 {
                    self.rooms_used = self.rooms_used.saturating_sub(1);
                }
            }
        }

        if soft_affair && !self.is_school_affair(block) {
            for &(_, si) in &indices {
                if self.excluded_slots[si] {
                    self.soft_violation_units += direction as f64;
                }
            }
        }

        if soft_shape
            && (placement.span != block.kind.span()
                || !self.calendar.span_fits(placement.slot, placement.span))
        {
            self.soft_violation_units += direction as f64;
        }

        for class_id in &block.classes {
            let ci = self.class_index[class_id];
            let key = (ci, placement.slot.day, block.subject);
            let entry = self.subject_daily.entry(key).or_insert(0);
            if direction > 0 {
                *entry += 1;
            } else {
                *entry = entry.saturating_sub(1);
                if *entry == 0 {
                    self.subject_daily.remove(&key);
                }
            }
        }
    }

    fn is_school_affair(&self, block: &LessonBlock) -> bool {
        self.domain
            .subject(block.subject)
            .map(|s| s.category == SubjectCategory::SchoolAffair)
            .unwrap_or(false)
    }

    /// The current weighted soft score (higher is better). Includes the
    /// configured penalty components and one unit per violation of a
    /// family configured `soft`.
    pub fn score(&self) -> PenaltyScore {
        let w = &self.config.weights;
        let mut penalty = self.soft_violation_units;

        if w.teacher_load_balance > 0.0 && self.teacher_load.len() > 1 {
            let max = *self.teacher_load.iter().max().unwrap_or(&0);
            let min = *self.teacher_load.iter().min().unwrap_or(&0);
            penalty += (max - min) as f64 * w.teacher_load_balance;
        }

        if w.subject_distribution > 0.0 && self.is_soft(ConstraintFamily::SubjectDistribution) {
            let limit = self.config.max_subject_per_day as u32;
            let excess: u32 = self
                .subject_daily
                .values()
                .map(|count| count.saturating_sub(limit))
                .sum();
            penalty += excess as f64 * w.subject_distribution;
        }

        if w.room_utilization > 0.0 {
            penalty += self.rooms_used as f64 * w.room_utilization;
        }

        if w.class_gap_penalty > 0.0 {
            penalty += self.total_class_gaps() as f64 * w.class_gap_penalty;
        }

        let bonus = self.preferred_hits as f64 * w.preferred_slot_bonus;
        PenaltyScore::of_soft(bonus - penalty)
    }

    /// Idle periods between each class's first and last lesson per day.
    fn total_class_gaps(&self) -> u32 {
        let periods = self.calendar.periods_per_day() as usize;
        let mut gaps = 0u32;
        for class_slots in &self.class_slots {
            for day in 0..self.calendar.days_per_week() as usize {
                let day_slots = &class_slots[day * periods..(day + 1) * periods];
                let first = day_slots.iter().position(|&c| c > 0);
                let last = day_slots.iter().rposition(|&c| c > 0);
                if let (Some(first), Some(last)) = (first, last) {
                    let occupied = day_slots.iter().filter(|&&c| c > 0).count();
                    gaps += (last - first + 1 - occupied) as u32;
                }
            }
        }
        gaps
    }

    /// Full scan for violations of hard-leveled families. Used by
    /// `evaluate` on host-built placement sets; the solver only calls it
    /// as a debug assertion since `try_place` already pruned.
    pub fn scan_violations(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        if self.is_hard(ConstraintFamily::ClassConflict) {
            for (ci, slots) in self.class_slots.iter().enumerate() {
                for (si, &count) in slots.iter().enumerate() {
                    if count > 1 {
                        let class_id = self.class_ids[ci];
                        let slot = slot_at(self.calendar, si);
                        let name = self.domain.class(class_id).map(|c| c.name.as_str()).unwrap_or("?");
                        violations.push(
                            Violation::new(
                                ConstraintFamily::ClassConflict,
                                format!("class {} has {} lessons at {}", name, count, slot),
                            )
                            .at(slot)
                            .involving(EntityRef::Class(class_id)),
                        );
                    }
                }
            }
        }

        if self.is_hard(ConstraintFamily::TeacherAvailability) {
            for (ti, slots) in self.teacher_slots.iter().enumerate() {
                let teacher_id = self.teacher_ids[ti];
                let teacher = self.domain.teacher(teacher_id);
                for (si, &count) in slots.iter().enumerate() {
                    let slot = slot_at(self.calendar, si);
                    let name = teacher.map(|t| t.name.as_str()).unwrap_or("?");
                    if count > 1 {
                        violations.push(
                            Violation::new(
                                ConstraintFamily::TeacherAvailability,
                                format!("{} teaches {} lessons at {}", name, count, slot),
                            )
                            .at(slot)
                            .involving(EntityRef::Teacher(teacher_id)),
                        );
                    }
                    if count > 0
                        && teacher.map(|t| !t.availability.is_available(slot)).unwrap_or(false)
                    {
                        violations.push(
                            Violation::new(
                                ConstraintFamily::TeacherAvailability,
                                format!("{} is unavailable at {}", name, slot),
                            )
                            .at(slot)
                            .involving(EntityRef::Teacher(teacher_id)),
                        );
                    }
                }
            }
        }

        if self.is_hard(ConstraintFamily::RoomConflict) {
            for (ri, slots) in self.room_slots.iter().enumerate() {
                let room_id = self.room_ids[ri];
                let Some(room) = self.domain.room(room_id) else {
                    continue;
                };
                if room.shared_capacity {
                    continue;
                }
                for (si, &count) in slots.iter().enumerate() {
                    if count > 1 {
                        let slot = slot_at(self.calendar, si);
                        violations.push(
                            Violation::new(
                                ConstraintFamily::RoomConflict,
                                format!("room {} hosts {} lessons at {}", room.name, count, slot),
                            )
                            .at(slot)
                            .involving(EntityRef::Room(room_id)),
                        );
                    }
                }
            }
        }

        for placement in self.placements.iter() {
            let Some(block) = self.domain.block(placement.occurrence.block) else {
                continue;
            };
            if self.is_hard(ConstraintFamily::ConsecutiveAdjacency)
                && (placement.span != block.kind.span()
                    || !self.calendar.span_fits(placement.slot, placement.span))
            {
                violations.push(
                    Violation::new(
                        ConstraintFamily::ConsecutiveAdjacency,
                        format!(
                            "{} must occupy {} adjacent periods on one day",
                            block.id,
                            block.kind.span()
                        ),
                    )
                    .at(placement.slot)
                    .involving(EntityRef::Block(block.id)),
                );
            }
            if self.is_hard(ConstraintFamily::SchoolAffairExclusion) && !self.is_school_affair(block)
            {
                for slot in placement.covered_slots() {
                    if self.calendar.contains(slot)
                        && self.excluded_slots[slot_index(self.calendar, slot)]
                    {
                        violations.push(
                            Violation::new(
                                ConstraintFamily::SchoolAffairExclusion,
                                format!("{} overlaps the school-affair slot {}", block.id, slot),
                            )
                            .at(slot)
                            .involving(EntityRef::Block(block.id)),
                        );
                    }
                }
            }
        }

        if self.is_hard(ConstraintFamily::SubjectDistribution) {
            let limit = self.config.max_subject_per_day as u32;
            for (&(ci, day, subject), &count) in &self.subject_daily {
                if count > limit {
                    violations.push(
                        Violation::new(
                            ConstraintFamily::SubjectDistribution,
                            format!(
                                "{} occurs {} times for {} on day {} (limit {})",
                                subject,
                                count,
                                self.class_ids[ci],
                                day + 1,
                                limit
                            ),
                        )
                        .involving(EntityRef::Subject(subject)),
                    );
                }
            }
        }

        violations
    }
}

/// Increments or decrements a counter, reporting whether the slot was
/// (or remains) multiply occupied from the perspective of this change.
fn bump(counter: &mut u32, direction: i64) -> bool {
    if direction > 0 {
        let overlapped = *counter > 0;
        *counter += 1;
        overlapped
    } else {
        *counter = counter.saturating_sub(1);
        *counter > 0
    }
}

fn slot_index(calendar: CalendarShape, slot: Slot) -> usize {
    slot.day as usize * calendar.periods_per_day() as usize + slot.period as usize
}

fn slot_at(calendar: CalendarShape, index: usize) -> Slot {
    let periods = calendar.periods_per_day() as usize;
    Slot::new((index / periods) as u8, (index % periods) as u8)
}
