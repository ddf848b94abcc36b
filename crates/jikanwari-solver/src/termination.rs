//! Termination conditions for the search.
//!
//! The search consults its termination at every backtracking step and at
//! restart boundaries, so both the wall-clock budget and a user-initiated
//! stop halt it promptly with the best result found so far.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::scope::SearchScope;

/// Trait for determining when to stop searching.
pub trait Termination: Send {
    /// Returns true if the search should terminate.
    fn is_terminated(&self, scope: &SearchScope) -> bool;
}

/// Terminates after a wall-clock limit.
#[derive(Debug, Clone)]
pub struct TimeTermination {
    limit: Duration,
}

impl TimeTermination {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

impl Termination for TimeTermination {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        scope.elapsed() >= self.limit
    }
}

/// Cooperative cancellation handle.
///
/// Cloneable and thread-safe: the host hands one clone to the solver and
/// keeps another to request a stop from its UI thread.
///
/// # Example
///
/// ```
/// use jikanwari_solver::CancelFlag;
///
/// let flag = CancelFlag::new();
/// let solver_side = flag.clone();
/// flag.cancel();
/// assert!(solver_side.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests termination. Thread-safe, callable from any thread.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Terminates when a [`CancelFlag`] is set.
#[derive(Debug, Clone)]
pub struct FlagTermination {
    flag: CancelFlag,
}

impl FlagTermination {
    pub fn new(flag: CancelFlag) -> Self {
        Self { flag }
    }
}

impl Termination for FlagTermination {
    fn is_terminated(&self, _scope: &SearchScope) -> bool {
        self.flag.is_cancelled()
    }
}

/// Terminates when either of two conditions does.
#[derive(Debug, Clone)]
pub struct OrTermination<A, B> {
    a: A,
    b: B,
}

impl<A, B> OrTermination<A, B> {
    pub fn new(a: A, b: B) -> Self {
        Self { a, b }
    }
}

impl<A: Termination, B: Termination> Termination for OrTermination<A, B> {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        self.a.is_terminated(scope) || self.b.is_terminated(scope)
    }
}

/// Never terminates; used when no cancel flag is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTermination;

impl Termination for NoTermination {
    fn is_terminated(&self, _scope: &SearchScope) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_termination_fires_after_limit() {
        let scope = SearchScope::new(0);
        assert!(!TimeTermination::millis(60_000).is_terminated(&scope));
        assert!(TimeTermination::new(Duration::ZERO).is_terminated(&scope));
    }

    #[test]
    fn flag_termination_tracks_the_flag() {
        let flag = CancelFlag::new();
        let termination = FlagTermination::new(flag.clone());
        let scope = SearchScope::new(0);
        assert!(!termination.is_terminated(&scope));
        flag.cancel();
        assert!(termination.is_terminated(&scope));
    }
}
