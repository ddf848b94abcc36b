//! PenaltyScore - Two-level score separating hard and soft constraints

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};

/// A score with separate hard and soft constraint levels.
///
/// Hard constraints must be satisfied for a timetable to be feasible; the
/// hard level counts violations as negative units. Soft constraints are
/// optimization objectives; the soft level is a weighted penalty sum and
/// is therefore a float.
///
/// When comparing scores, hard levels are compared first and soft levels
/// only break ties. Higher is better.
///
/// # Examples
///
/// ```
/// use jikanwari_core::PenaltyScore;
///
/// let broken = PenaltyScore::of(-1, -10.0); // 1 hard constraint broken
/// let poor = PenaltyScore::of(0, -200.0);   // feasible but poor soft score
/// let good = PenaltyScore::of(0, -50.0);
///
/// // Feasible timetables always beat infeasible ones
/// assert!(poor > broken);
/// assert!(good > poor);
/// ```
#[derive(Clone, Copy, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct PenaltyScore {
    hard: i64,
    soft: f64,
}

impl PenaltyScore {
    /// The zero score.
    pub const ZERO: PenaltyScore = PenaltyScore { hard: 0, soft: 0.0 };

    /// One hard constraint penalty.
    pub const ONE_HARD: PenaltyScore = PenaltyScore { hard: -1, soft: 0.0 };

    /// Creates a new score from both levels.
    #[inline]
    pub const fn of(hard: i64, soft: f64) -> Self {
        PenaltyScore { hard, soft }
    }

    /// Creates a score with only a hard component.
    #[inline]
    pub const fn of_hard(hard: i64) -> Self {
        PenaltyScore { hard, soft: 0.0 }
    }

    /// Creates a score with only a soft component.
    #[inline]
    pub const fn of_soft(soft: f64) -> Self {
        PenaltyScore { hard: 0, soft }
    }

    /// Returns the hard level.
    #[inline]
    pub const fn hard(&self) -> i64 {
        self.hard
    }

    /// Returns the soft level.
    #[inline]
    pub const fn soft(&self) -> f64 {
        self.soft
    }

    /// True when no hard constraint is violated.
    #[inline]
    pub const fn is_feasible(&self) -> bool {
        self.hard >= 0
    }

    /// The soft level as a positive penalty magnitude (for ascending-
    /// penalty displays).
    #[inline]
    pub fn soft_penalty(&self) -> f64 {
        -self.soft
    }
}

impl PartialEq for PenaltyScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PenaltyScore {}

impl PartialOrd for PenaltyScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PenaltyScore {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.hard.cmp(&other.hard) {
            Ordering::Equal => self.soft.total_cmp(&other.soft),
            other => other,
        }
    }
}

impl Add for PenaltyScore {
    type Output = PenaltyScore;

    fn add(self, rhs: Self) -> Self {
        PenaltyScore::of(self.hard + rhs.hard, self.soft + rhs.soft)
    }
}

impl AddAssign for PenaltyScore {
    fn add_assign(&mut self, rhs: Self) {
        self.hard += rhs.hard;
        self.soft += rhs.soft;
    }
}

impl Sub for PenaltyScore {
    type Output = PenaltyScore;

    fn sub(self, rhs: Self) -> Self {
        PenaltyScore::of(self.hard - rhs.hard, self.soft - rhs.soft)
    }
}

impl Neg for PenaltyScore {
    type Output = PenaltyScore;

    fn neg(self) -> Self {
        PenaltyScore::of(-self.hard, -self.soft)
    }
}

impl fmt::Debug for PenaltyScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PenaltyScore({}, {})", self.hard, self.soft)
    }
}

impl fmt::Display for PenaltyScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}hard/{}soft", self.hard, self.soft)
    }
}
