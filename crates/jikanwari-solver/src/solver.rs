//! Solver entry point: restart loop, anytime collection, ranking.

use serde::{Deserialize, Serialize};

use jikanwari_core::{
    ConstraintConfig, DomainSnapshot, EngineError, Result, SolverConfig,
};
use jikanwari_scoring::ConstraintEvaluator;

use crate::candidate::{rank_with_diversity, TimetableCandidate};
use crate::scope::SearchScope;
use crate::search::{run_attempt, AttemptOutcome};
use crate::termination::{CancelFlag, FlagTermination, OrTermination, Termination, TimeTermination};

/// Seed stride between restarts; spreads restart RNG streams apart.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Upper bound on restarts relative to the requested pattern count, so a
/// generous timeout cannot be burned on duplicate-only restarts.
const RESTART_FACTOR: usize = 8;

/// How the search ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOutcome {
    /// The requested pattern count was collected, or the search space
    /// was fully explored.
    Complete,
    /// The wall-clock budget elapsed first. The returned candidates are
    /// the best found so far; a degraded-confidence success, not a
    /// failure.
    Timeout,
    /// A cooperative stop was requested. Best-so-far candidates are
    /// returned.
    Cancelled,
}

/// Ranked result of one `solve` invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolveReport {
    /// Candidates, best first, all hard-feasible, diversity-ranked.
    pub candidates: Vec<TimetableCandidate>,
    pub outcome: SearchOutcome,
    /// Search nodes visited; useful for host-side diagnostics.
    pub steps: u64,
}

/// Backtracking timetable solver.
///
/// Stateless between invocations: each `solve` call owns a private
/// snapshot reference and scope, so independent invocations may run in
/// parallel threads without any sharing.
///
/// # Example
///
/// ```no_run
/// use jikanwari_core::{ConstraintConfig, DomainSnapshot, SolverConfig, CalendarShape};
/// use jikanwari_solver::TimetableSolver;
///
/// let domain = DomainSnapshot::new(CalendarShape::new(5, 6).unwrap());
/// let solver = TimetableSolver::new(SolverConfig::new().with_random_seed(42));
/// let report = solver.solve(&domain, &ConstraintConfig::default()).unwrap();
/// println!("best: {}", report.candidates[0].score);
/// ```
pub struct TimetableSolver {
    config: SolverConfig,
    cancel: CancelFlag,
}

impl TimetableSolver {
    pub fn new(config: SolverConfig) -> Self {
        TimetableSolver {
            config,
            cancel: CancelFlag::new(),
        }
    }

    /// Attaches a cancellation handle. The flag is checked at every
    /// backtracking step and restart boundary.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Assigns every lesson-block occurrence to a slot, collecting up to
    /// `max_patterns` distinct hard-feasible timetables within the
    /// wall-clock budget.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a malformed configuration or snapshot,
    ///   before any search work
    /// - `Infeasible` when no hard-feasible timetable was found
    pub fn solve(
        &self,
        domain: &DomainSnapshot,
        constraints: &ConstraintConfig,
    ) -> Result<SolveReport> {
        self.config.validate()?;
        // The solve-time weights override the constraint configuration's,
        // so a host can re-rank without editing its stored conditions.
        let constraints = constraints.clone().with_weights(self.config.weights);
        let evaluator = ConstraintEvaluator::new(domain, &constraints)?;

        let termination = OrTermination::new(
            TimeTermination::new(self.config.time_limit()),
            FlagTermination::new(self.cancel.clone()),
        );
        let mut scope = SearchScope::new(self.config.random_seed);
        let mut found: Vec<TimetableCandidate> = Vec::new();
        let mut halted = false;

        tracing::debug!(
            occurrences = domain.occurrence_count(),
            max_patterns = self.config.max_patterns,
            timeout_ms = self.config.timeout_ms,
            "starting timetable search"
        );

        for restart in 0..self.config.max_patterns * RESTART_FACTOR {
            if termination.is_terminated(&scope) {
                halted = true;
                break;
            }
            scope.reseed(self.config.random_seed ^ (restart as u64).wrapping_mul(SEED_STRIDE));

            match run_attempt(&evaluator, &mut scope, &termination) {
                AttemptOutcome::Complete(placements, score) => {
                    let duplicate = found.iter().any(|c| c.placements == placements);
                    if !duplicate {
                        tracing::debug!(restart, %score, "collected candidate timetable");
                        found.push(TimetableCandidate::new(placements, score));
                    }
                    if found.len() >= self.config.max_patterns {
                        break;
                    }
                }
                AttemptOutcome::Exhausted => {
                    // Systematic search ran dry: no further distinct
                    // candidate exists.
                    break;
                }
                AttemptOutcome::Halted => {
                    halted = true;
                    break;
                }
            }
        }

        if found.is_empty() {
            tracing::debug!(steps = scope.steps(), "no feasible timetable");
            return Err(EngineError::Infeasible);
        }

        let outcome = if self.cancel.is_cancelled() {
            SearchOutcome::Cancelled
        } else if halted {
            SearchOutcome::Timeout
        } else {
            SearchOutcome::Complete
        };

        let candidates = rank_with_diversity(found, self.config.max_patterns);
        tracing::debug!(
            count = candidates.len(),
            ?outcome,
            steps = scope.steps(),
            "timetable search finished"
        );
        Ok(SolveReport {
            candidates,
            outcome,
            steps: scope.steps(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jikanwari_core::{
        Availability, AvailabilityMap, BlockId, BlockKind, CalendarShape, ClassId, ClassInfo,
        Grade, GradeId, LessonBlock, Room, RoomId, Slot, SoftWeights, Subject, SubjectId, Teacher,
        TeacherId, TeacherRole,
    };

    fn small_domain() -> DomainSnapshot {
        DomainSnapshot::new(CalendarShape::new(5, 6).unwrap())
            .with_grades([Grade::new(GradeId(1), "1年", 1)])
            .with_classes([ClassInfo::new(ClassId(1), "1-A", GradeId(1))])
            .with_subjects([
                Subject::new(SubjectId(1), "数学"),
                Subject::new(SubjectId(2), "国語"),
            ])
            .with_teachers([
                Teacher::new(TeacherId(1), "田中").with_subjects([SubjectId(1)]),
                Teacher::new(TeacherId(2), "鈴木").with_subjects([SubjectId(2)]),
            ])
            .with_rooms([Room::new(RoomId(1), "1-A教室").shared()])
            .with_blocks([
                LessonBlock::new(BlockId(1), SubjectId(1))
                    .with_classes([ClassId(1)])
                    .with_teacher(TeacherId(1), TeacherRole::Main)
                    .with_rooms([RoomId(1)])
                    .with_repeat(4),
                LessonBlock::new(BlockId(2), SubjectId(2))
                    .with_classes([ClassId(1)])
                    .with_teacher(TeacherId(2), TeacherRole::Main)
                    .with_rooms([RoomId(1)])
                    .with_repeat(4),
            ])
    }

    fn config() -> SolverConfig {
        SolverConfig::new()
            .with_timeout_ms(5_000)
            .with_max_patterns(3)
            .with_random_seed(7)
    }

    #[test]
    fn solve_returns_feasible_candidates() {
        let domain = small_domain();
        let report = TimetableSolver::new(config())
            .solve(&domain, &ConstraintConfig::default())
            .unwrap();

        assert!(!report.candidates.is_empty());
        for candidate in &report.candidates {
            assert!(candidate.score.is_feasible());
            assert_eq!(candidate.placements.len(), domain.occurrence_count());
        }
    }

    #[test]
    fn solve_is_deterministic_for_a_seed() {
        let domain = small_domain();
        let constraints = ConstraintConfig::default();

        let a = TimetableSolver::new(config()).solve(&domain, &constraints).unwrap();
        let b = TimetableSolver::new(config()).solve(&domain, &constraints).unwrap();

        assert_eq!(a.candidates.len(), b.candidates.len());
        for (left, right) in a.candidates.iter().zip(&b.candidates) {
            assert_eq!(left.placements, right.placements);
            assert_eq!(left.score, right.score);
        }
    }

    #[test]
    fn any_seed_yields_feasible_candidates() {
        let domain = small_domain();
        let constraints = ConstraintConfig::default();
        for seed in 0..4 {
            let report = TimetableSolver::new(config().with_random_seed(seed))
                .solve(&domain, &constraints)
                .unwrap();
            assert!(report.candidates.iter().all(|c| c.score.is_feasible()));
        }
    }

    #[test]
    fn consecutive_blocks_stay_adjacent() {
        let domain = DomainSnapshot::new(CalendarShape::new(5, 6).unwrap())
            .with_grades([Grade::new(GradeId(1), "1年", 1)])
            .with_classes([ClassInfo::new(ClassId(1), "1-A", GradeId(1))])
            .with_subjects([Subject::new(SubjectId(1), "理科")])
            .with_teachers([Teacher::new(TeacherId(1), "田中")])
            .with_blocks([LessonBlock::new(BlockId(1), SubjectId(1))
                .with_classes([ClassId(1)])
                .with_teacher(TeacherId(1), TeacherRole::Main)
                .consecutive(3)
                .with_repeat(2)]);

        let report = TimetableSolver::new(config())
            .solve(&domain, &ConstraintConfig::default())
            .unwrap();
        for candidate in &report.candidates {
            for placement in candidate.placements.iter() {
                assert_eq!(placement.span, 3);
                let last = placement.covered_slots().last().unwrap();
                assert_eq!(last.day, placement.slot.day);
                assert!(last.period < 6);
            }
        }
        let block = domain.block(BlockId(1)).unwrap();
        assert_eq!(block.kind, BlockKind::Consecutive(3));
    }

    #[test]
    fn unavailable_slots_are_never_used() {
        let domain = DomainSnapshot::new(CalendarShape::new(5, 6).unwrap())
            .with_grades([Grade::new(GradeId(1), "1年", 1)])
            .with_classes([ClassInfo::new(ClassId(1), "1-A", GradeId(1))])
            .with_subjects([Subject::new(SubjectId(1), "数学")])
            .with_teachers([Teacher::new(TeacherId(1), "田中").with_availability(
                AvailabilityMap::new()
                    .with(Slot::new(0, 0), Availability::Unavailable)
                    .with(Slot::new(0, 1), Availability::Unavailable),
            )])
            .with_blocks([LessonBlock::new(BlockId(1), SubjectId(1))
                .with_classes([ClassId(1)])
                .with_teacher(TeacherId(1), TeacherRole::Main)
                .with_repeat(6)]);

        let report = TimetableSolver::new(config())
            .solve(&domain, &ConstraintConfig::default())
            .unwrap();
        for candidate in &report.candidates {
            for placement in candidate.placements.iter() {
                assert!(!(placement.slot.day == 0 && placement.slot.period <= 1));
            }
        }
    }

    #[test]
    fn overconstrained_instance_is_infeasible() {
        // Two classes, one teacher, and only one slot: the second
        // occurrence can never be placed.
        let domain = DomainSnapshot::new(CalendarShape::new(1, 1).unwrap())
            .with_grades([Grade::new(GradeId(1), "1年", 1)])
            .with_classes([ClassInfo::new(ClassId(1), "1-A", GradeId(1))])
            .with_subjects([Subject::new(SubjectId(1), "数学")])
            .with_teachers([Teacher::new(TeacherId(1), "田中")])
            .with_blocks([LessonBlock::new(BlockId(1), SubjectId(1))
                .with_classes([ClassId(1)])
                .with_teacher(TeacherId(1), TeacherRole::Main)
                .with_repeat(2)]);

        let result = TimetableSolver::new(config()).solve(&domain, &ConstraintConfig::default());
        assert!(matches!(result, Err(EngineError::Infeasible)));
    }

    #[test]
    fn invalid_config_fails_before_search() {
        let domain = small_domain();
        let result = TimetableSolver::new(config().with_timeout_ms(0))
            .solve(&domain, &ConstraintConfig::default());
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn pre_cancelled_solver_reports_infeasible_without_searching() {
        let domain = small_domain();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = TimetableSolver::new(config())
            .with_cancel_flag(cancel)
            .solve(&domain, &ConstraintConfig::default());
        assert!(matches!(result, Err(EngineError::Infeasible)));
    }

    #[test]
    fn soft_weights_flow_into_candidate_scores() {
        let domain = small_domain();
        let report = TimetableSolver::new(
            config().with_weights(SoftWeights::none()),
        )
        .solve(&domain, &ConstraintConfig::default())
        .unwrap();
        for candidate in &report.candidates {
            assert_eq!(candidate.score.soft(), 0.0);
        }
    }
}
