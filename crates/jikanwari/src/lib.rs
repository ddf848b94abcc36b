//! Jikanwari - School Timetabling Engine
//!
//! Turns a declarative set of lesson requirements and constraints into
//! concrete day/period placements, and powers three structurally
//! identical recommendation problems plus elective grouping. Four call
//! contracts, all synchronous, stateless and deterministic for a seed:
//!
//! - [`TimetableSolver::solve`] - ranked candidate timetables under a
//!   wall-clock budget
//! - [`ConstraintEvaluator::evaluate`] - hard violations and weighted
//!   soft penalty for any placement set
//! - [`suggest_substitutes`] / [`suggest_supervisors`] /
//!   [`propose_reschedule`] - ranked candidates with reasons
//! - [`group`] - elective course grouping
//!
//! # Example
//!
//! ```
//! use jikanwari::prelude::*;
//!
//! let domain = DomainSnapshot::new(CalendarShape::new(5, 6).unwrap());
//! let solver = TimetableSolver::new(
//!     SolverConfig::new().with_timeout_ms(1_000).with_random_seed(42),
//! );
//! let report = solver.solve(&domain, &ConstraintConfig::default()).unwrap();
//! assert!(report.candidates[0].score.is_feasible());
//! ```

// Core domain and configuration
pub use jikanwari_core::{
    Availability, AvailabilityMap, BlockId, BlockKind, CalendarShape, ClassId, ClassInfo,
    ConfigError, ConstraintConfig, ConstraintFamily, ConstraintLevel, ConstraintRule,
    DomainSnapshot, EngineError, Grade, GradeId, LessonBlock, OccurrenceId, PenaltyScore,
    Placement, PlacementSet, Result, Room, RoomId, Slot, SoftWeights, SolverConfig, Subject,
    SubjectCategory, SubjectId, Teacher, TeacherId, TeacherRole,
};

// Constraint evaluation
pub use jikanwari_scoring::{ConstraintEvaluator, EntityRef, Evaluation, TimetableDirector, Violation};

// Timetable solving
pub use jikanwari_solver::{
    CancelFlag, SearchOutcome, SolveReport, TimetableCandidate, TimetableSolver,
};

// Recommendations and elective grouping
pub use jikanwari_recommend::{
    group, propose_reschedule, rank, suggest_substitutes, suggest_supervisors, ElectiveGroup,
    ElectiveOffering, ElectiveResult, ElectiveStudent, Feature, FeatureValue, RescheduleRequest,
    ScoredCandidate, SubstituteRequest, SupervisorRequest,
};

pub mod prelude {
    pub use jikanwari_core::{
        Availability, AvailabilityMap, BlockId, BlockKind, CalendarShape, ClassId, ClassInfo,
        ConstraintConfig, ConstraintFamily, ConstraintLevel, DomainSnapshot, Grade, GradeId,
        LessonBlock, OccurrenceId, PenaltyScore, Placement, PlacementSet, Room, RoomId, Slot,
        SoftWeights, SolverConfig, Subject, SubjectCategory, SubjectId, Teacher, TeacherId,
        TeacherRole,
    };
    pub use jikanwari_recommend::{
        group, propose_reschedule, suggest_substitutes, suggest_supervisors, ElectiveOffering,
        ElectiveStudent, RescheduleRequest, SubstituteRequest, SupervisorRequest,
    };
    pub use jikanwari_scoring::ConstraintEvaluator;
    pub use jikanwari_solver::{CancelFlag, SearchOutcome, TimetableSolver};
}
