//! Recommendation engines built on one weighted multi-reason scorer.
//!
//! Three structurally identical problems share the generic core in
//! [`scorer`]: substitute-teacher suggestion, exam-supervisor assignment
//! and reschedule-slot proposals. Each builds a feature set (hard gates
//! plus graded contributions), ranks a finite candidate list and returns
//! scores with human-readable reasons for the host's suggestion panels.
//!
//! The elective grouping optimizer lives here too: same request-scoped,
//! stateless shape, different algorithm (greedy bin packing with a
//! bounded swap pass).

mod context;

pub mod elective;
pub mod reschedule;
pub mod scorer;
pub mod substitute;
pub mod supervisor;

pub use elective::{group, ElectiveGroup, ElectiveOffering, ElectiveResult, ElectiveStudent};
pub use reschedule::{propose_reschedule, RescheduleRequest};
pub use scorer::{rank, Feature, FeatureValue, ScoredCandidate};
pub use substitute::{suggest_substitutes, SubstituteRequest};
pub use supervisor::{suggest_supervisors, SupervisorRequest};
