//! Constraint evaluation for the jikanwari scheduling engine.
//!
//! This crate provides:
//! - `ConstraintEvaluator` - the pure `evaluate` contract over a
//!   placement set (hard violations + weighted soft penalty)
//! - `TimetableDirector` - the incremental occupancy ledger the solver
//!   uses to prune candidate slots without full re-scans per search node
//! - `Violation`/`EntityRef` - typed, human-readable violation records
//!   surfaced to the suggestion panels
//!
//! Everything here is a pure function of (placements, domain snapshot,
//! constraint configuration): reentrant, side-effect-free, safe to call
//! concurrently from independent search branches.

pub mod director;
pub mod evaluator;
pub mod violation;

pub use director::TimetableDirector;
pub use evaluator::{ConstraintEvaluator, Evaluation};
pub use violation::{EntityRef, Violation};
