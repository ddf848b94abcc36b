//! Constraint definitions and soft-constraint weights.
//!
//! Constraint *families* are the built-in rule kinds the evaluator knows.
//! Each family runs at a configurable level: `hard` rules must never be
//! violated in an accepted timetable, `soft` rules contribute weighted
//! penalties. Weights are configuration inputs, never hard-coded, so
//! policy can be tuned without touching the evaluator.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::error::{EngineError, Result};

/// Enforcement level of a constraint rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintLevel {
    Hard,
    Soft,
}

/// Built-in constraint families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintFamily {
    /// A teacher must not be placed on a slot marked unavailable.
    TeacherAvailability,
    /// At most one placement per class per slot.
    ClassConflict,
    /// At most one placement per exclusive room per slot.
    RoomConflict,
    /// No placement may overlap a school-affair reservation.
    SchoolAffairExclusion,
    /// A subject may appear at most N times per class per day.
    SubjectDistribution,
    /// Consecutive blocks occupy adjacent periods of one day.
    ConsecutiveAdjacency,
}

impl ConstraintFamily {
    /// The level a family runs at when the configuration does not say
    /// otherwise.
    pub fn default_level(&self) -> ConstraintLevel {
        match self {
            ConstraintFamily::SubjectDistribution => ConstraintLevel::Soft,
            _ => ConstraintLevel::Hard,
        }
    }

    /// Stable name used in violation reasons and logs.
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintFamily::TeacherAvailability => "teacher availability",
            ConstraintFamily::ClassConflict => "class conflict",
            ConstraintFamily::RoomConflict => "room conflict",
            ConstraintFamily::SchoolAffairExclusion => "school-affair exclusion",
            ConstraintFamily::SubjectDistribution => "subject distribution",
            ConstraintFamily::ConsecutiveAdjacency => "consecutive adjacency",
        }
    }

    const ALL: [ConstraintFamily; 6] = [
        ConstraintFamily::TeacherAvailability,
        ConstraintFamily::ClassConflict,
        ConstraintFamily::RoomConflict,
        ConstraintFamily::SchoolAffairExclusion,
        ConstraintFamily::SubjectDistribution,
        ConstraintFamily::ConsecutiveAdjacency,
    ];
}

/// One configured constraint rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRule {
    pub family: ConstraintFamily,
    pub level: ConstraintLevel,
}

impl ConstraintRule {
    pub fn new(family: ConstraintFamily, level: ConstraintLevel) -> Self {
        ConstraintRule { family, level }
    }
}

/// Weights of the soft-constraint penalty components.
///
/// All weights are non-negative multipliers; a weight of zero disables
/// the component.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SoftWeights {
    /// Spread between the most- and least-loaded teacher.
    pub teacher_load_balance: f64,
    /// Same subject repeated within one class-day beyond the limit.
    pub subject_distribution: f64,
    /// Breadth of room usage across the week.
    pub room_utilization: f64,
    /// Idle periods between a class's first and last lesson of a day.
    pub class_gap_penalty: f64,
    /// Bonus (negative penalty) for landing on teacher-preferred slots.
    pub preferred_slot_bonus: f64,
}

impl Default for SoftWeights {
    fn default() -> Self {
        SoftWeights {
            teacher_load_balance: 1.0,
            subject_distribution: 2.0,
            room_utilization: 0.5,
            class_gap_penalty: 1.0,
            preferred_slot_bonus: 0.5,
        }
    }
}

impl SoftWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// All components disabled.
    pub fn none() -> Self {
        SoftWeights {
            teacher_load_balance: 0.0,
            subject_distribution: 0.0,
            room_utilization: 0.0,
            class_gap_penalty: 0.0,
            preferred_slot_bonus: 0.0,
        }
    }

    pub fn with_teacher_load_balance(mut self, weight: f64) -> Self {
        self.teacher_load_balance = weight;
        self
    }

    pub fn with_subject_distribution(mut self, weight: f64) -> Self {
        self.subject_distribution = weight;
        self
    }

    pub fn with_room_utilization(mut self, weight: f64) -> Self {
        self.room_utilization = weight;
        self
    }

    pub fn with_class_gap_penalty(mut self, weight: f64) -> Self {
        self.class_gap_penalty = weight;
        self
    }

    pub fn with_preferred_slot_bonus(mut self, weight: f64) -> Self {
        self.preferred_slot_bonus = weight;
        self
    }

    fn validate(&self) -> Result<()> {
        let components = [
            ("teacher_load_balance", self.teacher_load_balance),
            ("subject_distribution", self.subject_distribution),
            ("room_utilization", self.room_utilization),
            ("class_gap_penalty", self.class_gap_penalty),
            ("preferred_slot_bonus", self.preferred_slot_bonus),
        ];
        for (name, weight) in components {
            if !weight.is_finite() || weight < 0.0 {
                return Err(EngineError::InvalidInput(format!(
                    "soft weight {name} must be finite and non-negative, got {weight}"
                )));
            }
        }
        Ok(())
    }
}

/// Enumerated constraint configuration, supplied by the host's
/// processing-conditions editor.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ConstraintConfig {
    pub rules: Vec<ConstraintRule>,
    /// Daily per-class limit used by `SubjectDistribution`.
    pub max_subject_per_day: u8,
    /// Slots reserved for school affairs (assemblies, staff meetings).
    /// `SchoolAffairExclusion` keeps general lessons out of them.
    pub school_affair_slots: Vec<crate::model::Slot>,
    pub weights: SoftWeights,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        ConstraintConfig {
            rules: ConstraintFamily::ALL
                .iter()
                .map(|family| ConstraintRule::new(*family, family.default_level()))
                .collect(),
            max_subject_per_day: 2,
            school_affair_slots: Vec::new(),
            weights: SoftWeights::default(),
        }
    }
}

impl ConstraintConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(mut self, weights: SoftWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_max_subject_per_day(mut self, limit: u8) -> Self {
        self.max_subject_per_day = limit;
        self
    }

    pub fn with_school_affair_slots(
        mut self,
        slots: impl IntoIterator<Item = crate::model::Slot>,
    ) -> Self {
        self.school_affair_slots.extend(slots);
        self
    }

    /// Replaces the level of one family's rule.
    pub fn with_level(mut self, family: ConstraintFamily, level: ConstraintLevel) -> Self {
        match self.rules.iter_mut().find(|rule| rule.family == family) {
            Some(rule) => rule.level = level,
            None => self.rules.push(ConstraintRule::new(family, level)),
        }
        self
    }

    /// The configured level of a family, or `None` when the family is
    /// not enabled at all.
    pub fn level_of(&self, family: ConstraintFamily) -> Option<ConstraintLevel> {
        self.rules
            .iter()
            .find(|rule| rule.family == family)
            .map(|rule| rule.level)
    }

    /// Parses a configuration from TOML. Unknown constraint families fail
    /// here, before any search work is performed.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Validates levels and weights before search.
    pub fn validate(&self) -> Result<()> {
        let mut seen: Vec<ConstraintFamily> = Vec::new();
        for rule in &self.rules {
            if seen.contains(&rule.family) {
                return Err(EngineError::InvalidInput(format!(
                    "duplicate constraint rule for family '{}'",
                    rule.family.name()
                )));
            }
            seen.push(rule.family);
        }
        if self.max_subject_per_day == 0 {
            return Err(EngineError::InvalidInput(
                "max_subject_per_day must be at least 1".into(),
            ));
        }
        self.weights.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ConstraintConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.level_of(ConstraintFamily::ClassConflict),
            Some(ConstraintLevel::Hard)
        );
        assert_eq!(
            config.level_of(ConstraintFamily::SubjectDistribution),
            Some(ConstraintLevel::Soft)
        );
    }

    #[test]
    fn duplicate_family_is_rejected() {
        let mut config = ConstraintConfig::default();
        config.rules.push(ConstraintRule::new(
            ConstraintFamily::ClassConflict,
            ConstraintLevel::Soft,
        ));
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_weight_is_rejected() {
        let config =
            ConstraintConfig::default().with_weights(SoftWeights::none().with_class_gap_penalty(-1.0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_round_trip() {
        let config = ConstraintConfig::from_toml_str(
            r#"
            max_subject_per_day = 3

            [[rules]]
            family = "teacher_availability"
            level = "hard"

            [weights]
            class_gap_penalty = 4.0
        "#,
        )
        .unwrap();
        assert_eq!(config.max_subject_per_day, 3);
        assert_eq!(config.weights.class_gap_penalty, 4.0);
        assert_eq!(config.rules.len(), 1);
    }

    #[test]
    fn unknown_family_fails_at_parse_time() {
        let parsed = ConstraintConfig::from_toml_str(
            r#"
            [[rules]]
            family = "lunch_break"
            level = "hard"
        "#,
        );
        assert!(parsed.is_err());
    }
}
