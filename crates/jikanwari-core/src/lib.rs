//! Jikanwari Core - Domain model and shared types for the scheduling engine
//!
//! This crate provides the fundamental types shared by every engine
//! component:
//! - The weekly calendar shape, slots and availability maps
//! - Reference entities (subjects, teachers, rooms, classes, grades)
//! - Lesson blocks and placements (the demand and supply of scheduling)
//! - The two-level `PenaltyScore`
//! - Constraint and solver configuration
//! - The engine error taxonomy

pub mod config;
pub mod constraint;
pub mod error;
pub mod model;
pub mod score;
pub mod snapshot;

pub use config::{ConfigError, SolverConfig};
pub use constraint::{ConstraintConfig, ConstraintFamily, ConstraintLevel, ConstraintRule, SoftWeights};
pub use error::{EngineError, Result};
pub use model::{
    Availability, AvailabilityMap, BlockId, BlockKind, CalendarShape, ClassId, ClassInfo, Grade,
    GradeId, LessonBlock, OccurrenceId, Placement, PlacementSet, RoomId, Room, Slot, Subject,
    SubjectCategory, SubjectId, Teacher, TeacherId, TeacherRole,
};
pub use score::PenaltyScore;
pub use snapshot::DomainSnapshot;
