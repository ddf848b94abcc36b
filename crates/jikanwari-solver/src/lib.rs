//! Jikanwari Solver Engine
//!
//! This crate turns a declarative set of lesson blocks and constraints
//! into concrete day/period placements:
//! - Constructive chronological backtracking, most-constrained-first
//! - Restart-with-perturbation to collect multiple distinct candidates
//! - Anytime behavior under a wall-clock budget
//! - Cooperative cancellation via a shared flag
//! - Deterministic output for identical inputs and seed

pub mod candidate;
pub mod scope;
pub mod search;
pub mod solver;
pub mod termination;

pub use candidate::TimetableCandidate;
pub use solver::{SearchOutcome, SolveReport, TimetableSolver};
pub use termination::{CancelFlag, FlagTermination, OrTermination, Termination, TimeTermination};
