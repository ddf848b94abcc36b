//! End-to-end scenarios for the four engine contracts.

use std::collections::{BTreeSet, HashMap};

use jikanwari::prelude::*;
use jikanwari::{EngineError, SearchOutcome};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// One class, five subjects, a full 30-occurrence week and one teacher
/// unavailable Monday periods 1-2.
fn full_week_domain() -> DomainSnapshot {
    let subjects: Vec<Subject> =
        (1..=5).map(|i| Subject::new(SubjectId(i), format!("教科{}", i))).collect();
    let teachers: Vec<Teacher> = (1..=5)
        .map(|i| {
            let teacher = Teacher::new(TeacherId(i), format!("教員{}", i))
                .with_subjects([SubjectId(i)]);
            if i == 1 {
                teacher.with_availability(
                    AvailabilityMap::new()
                        .with(Slot::new(0, 0), Availability::Unavailable)
                        .with(Slot::new(0, 1), Availability::Unavailable),
                )
            } else {
                teacher
            }
        })
        .collect();
    let blocks: Vec<LessonBlock> = (1..=5)
        .map(|i| {
            LessonBlock::new(BlockId(i), SubjectId(i))
                .with_classes([ClassId(1)])
                .with_teacher(TeacherId(i), TeacherRole::Main)
                .with_repeat(6)
        })
        .collect();

    DomainSnapshot::new(CalendarShape::new(5, 6).unwrap())
        .with_grades([Grade::new(GradeId(1), "1年", 1)])
        .with_classes([ClassInfo::new(ClassId(1), "1-A", GradeId(1))])
        .with_subjects(subjects)
        .with_teachers(teachers)
        .with_blocks(blocks)
}

#[test]
fn full_week_avoids_the_unavailable_slots() {
    let domain = full_week_domain();
    let config = SolverConfig::new()
        .with_timeout_ms(10_000)
        .with_max_patterns(3)
        .with_random_seed(11)
        .with_weights(SoftWeights::none());

    let report = TimetableSolver::new(config)
        .solve(&domain, &ConstraintConfig::default())
        .unwrap();

    assert!(!report.candidates.is_empty());
    for candidate in &report.candidates {
        assert_eq!(candidate.placements.len(), 30);
        assert!(candidate.score.is_feasible());
        for placement in candidate.placements.iter() {
            if placement.occurrence.block == BlockId(1) {
                assert!(
                    !(placement.slot.day == 0 && placement.slot.period <= 1),
                    "subject 1 placed into its teacher's unavailable slot"
                );
            }
        }
    }
}

#[test]
fn every_candidate_passes_independent_evaluation() {
    let domain = full_week_domain();
    let constraints = ConstraintConfig::default();
    let config = SolverConfig::new()
        .with_timeout_ms(10_000)
        .with_max_patterns(3)
        .with_random_seed(5);

    let report = TimetableSolver::new(config).solve(&domain, &constraints).unwrap();
    let evaluator = ConstraintEvaluator::new(&domain, &constraints).unwrap();
    for candidate in &report.candidates {
        let evaluation = evaluator.evaluate(&candidate.placements).unwrap();
        assert!(evaluation.is_feasible(), "{:?}", evaluation.violations);
    }
}

#[test]
fn no_entity_is_double_booked_in_any_candidate() {
    let domain = full_week_domain();
    let report = TimetableSolver::new(
        SolverConfig::new().with_timeout_ms(10_000).with_max_patterns(3).with_random_seed(3),
    )
    .solve(&domain, &ConstraintConfig::default())
    .unwrap();

    for candidate in &report.candidates {
        let mut class_slots: HashMap<(ClassId, Slot), u32> = HashMap::new();
        let mut teacher_slots: HashMap<(TeacherId, Slot), u32> = HashMap::new();
        for placement in candidate.placements.iter() {
            let block = domain.block(placement.occurrence.block).unwrap();
            for slot in placement.covered_slots() {
                for class in &block.classes {
                    *class_slots.entry((*class, slot)).or_insert(0) += 1;
                }
                for teacher in block.teacher_ids() {
                    *teacher_slots.entry((teacher, slot)).or_insert(0) += 1;
                }
            }
        }
        assert!(class_slots.values().all(|&c| c == 1));
        assert!(teacher_slots.values().all(|&c| c <= 1));
    }
}

#[test]
fn solve_is_reproducible_end_to_end() {
    let domain = full_week_domain();
    let constraints = ConstraintConfig::default();
    let config = SolverConfig::new()
        .with_timeout_ms(10_000)
        .with_max_patterns(4)
        .with_random_seed(99);

    let first = TimetableSolver::new(config.clone()).solve(&domain, &constraints).unwrap();
    let second = TimetableSolver::new(config).solve(&domain, &constraints).unwrap();

    assert_eq!(first.candidates.len(), second.candidates.len());
    for (a, b) in first.candidates.iter().zip(&second.candidates) {
        assert_eq!(a.placements, b.placements);
        assert_eq!(a.score, b.score);
        assert_eq!(a.diversity, b.diversity);
    }
}

#[test]
fn consecutive_blocks_land_adjacent_on_one_day() {
    let domain = DomainSnapshot::new(CalendarShape::new(5, 6).unwrap())
        .with_grades([Grade::new(GradeId(1), "1年", 1)])
        .with_classes([ClassInfo::new(ClassId(1), "1-A", GradeId(1))])
        .with_subjects([Subject::new(SubjectId(1), "理科"), Subject::new(SubjectId(2), "数学")])
        .with_teachers([Teacher::new(TeacherId(1), "田中"), Teacher::new(TeacherId(2), "鈴木")])
        .with_blocks([
            LessonBlock::new(BlockId(1), SubjectId(1))
                .with_classes([ClassId(1)])
                .with_teacher(TeacherId(1), TeacherRole::Main)
                .consecutive(2)
                .with_repeat(3),
            LessonBlock::new(BlockId(2), SubjectId(2))
                .with_classes([ClassId(1)])
                .with_teacher(TeacherId(2), TeacherRole::Main)
                .with_repeat(8),
        ]);

    let report = TimetableSolver::new(
        SolverConfig::new().with_timeout_ms(10_000).with_max_patterns(2).with_random_seed(1),
    )
    .solve(&domain, &ConstraintConfig::default())
    .unwrap();

    for candidate in &report.candidates {
        for placement in candidate.placements.iter() {
            if placement.occurrence.block == BlockId(1) {
                let covered: Vec<Slot> = placement.covered_slots().collect();
                assert_eq!(covered.len(), 2);
                assert_eq!(covered[0].day, covered[1].day);
                assert_eq!(covered[0].period + 1, covered[1].period);
            }
        }
    }
}

#[test]
fn tiny_budget_still_never_yields_a_hard_violation() {
    let domain = full_week_domain();
    let constraints = ConstraintConfig::default();
    let result = TimetableSolver::new(
        SolverConfig::new().with_timeout_ms(1).with_max_patterns(5).with_random_seed(2),
    )
    .solve(&domain, &constraints);

    match result {
        Ok(report) => {
            assert!(matches!(
                report.outcome,
                SearchOutcome::Timeout | SearchOutcome::Complete
            ));
            let evaluator = ConstraintEvaluator::new(&domain, &constraints).unwrap();
            for candidate in &report.candidates {
                assert!(evaluator.evaluate(&candidate.placements).unwrap().is_feasible());
            }
        }
        Err(EngineError::Infeasible) => {} // budget ran out before the first candidate
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
fn randomized_instances_stay_hard_feasible() {
    // Known-feasible construction: dedicated teachers per block, so only
    // class conflicts bind, and each class demands less than a full week.
    for instance_seed in 0..4u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(instance_seed);
        let mut blocks = Vec::new();
        let mut teachers = Vec::new();
        let mut subjects = Vec::new();
        let mut next_id = 1u32;
        for class in 1..=2u32 {
            for _ in 0..4 {
                let id = next_id;
                next_id += 1;
                subjects.push(Subject::new(SubjectId(id), format!("教科{}", id)));
                teachers.push(Teacher::new(TeacherId(id), format!("教員{}", id)));
                let repeat = rng.random_range(1..=3);
                let mut block = LessonBlock::new(BlockId(id), SubjectId(id))
                    .with_classes([ClassId(class)])
                    .with_teacher(TeacherId(id), TeacherRole::Main)
                    .with_repeat(repeat);
                if rng.random_range(0..4) == 0 {
                    block = block.consecutive(2);
                }
                blocks.push(block);
            }
        }
        let domain = DomainSnapshot::new(CalendarShape::new(5, 6).unwrap())
            .with_grades([Grade::new(GradeId(1), "1年", 1)])
            .with_classes([
                ClassInfo::new(ClassId(1), "1-A", GradeId(1)),
                ClassInfo::new(ClassId(2), "1-B", GradeId(1)),
            ])
            .with_subjects(subjects)
            .with_teachers(teachers)
            .with_blocks(blocks);

        let constraints = ConstraintConfig::default();
        let report = TimetableSolver::new(
            SolverConfig::new()
                .with_timeout_ms(10_000)
                .with_max_patterns(2)
                .with_random_seed(instance_seed),
        )
        .solve(&domain, &constraints)
        .unwrap();

        let evaluator = ConstraintEvaluator::new(&domain, &constraints).unwrap();
        for candidate in &report.candidates {
            assert_eq!(candidate.placements.len(), domain.occurrence_count());
            assert!(evaluator.evaluate(&candidate.placements).unwrap().is_feasible());
        }
    }
}

#[test]
fn substitute_scenario_returns_only_the_qualified_teacher() {
    // Teacher A: math, available. Teacher B: math, unavailable Tuesday
    // period 3. Teacher C: art. A math lesson on Tuesday period 3 is
    // cancelled (0-indexed: day 1, period 2).
    let domain = DomainSnapshot::new(CalendarShape::new(5, 6).unwrap())
        .with_grades([Grade::new(GradeId(1), "1年", 1)])
        .with_classes([ClassInfo::new(ClassId(1), "1-A", GradeId(1))])
        .with_subjects([Subject::new(SubjectId(1), "数学"), Subject::new(SubjectId(2), "美術")])
        .with_teachers([
            Teacher::new(TeacherId(1), "A").with_subjects([SubjectId(1)]),
            Teacher::new(TeacherId(2), "B").with_subjects([SubjectId(1)]).with_availability(
                AvailabilityMap::new().with(Slot::new(1, 2), Availability::Unavailable),
            ),
            Teacher::new(TeacherId(3), "C").with_subjects([SubjectId(2)]),
            Teacher::new(TeacherId(4), "欠席").with_subjects([SubjectId(1)]),
        ]);

    let request = SubstituteRequest {
        slot: Slot::new(1, 2),
        subject: SubjectId(1),
        classes: vec![ClassId(1)],
        absent_teacher: TeacherId(4),
        recent_substitutes: BTreeSet::new(),
    };
    let ranked = suggest_substitutes(&domain, &PlacementSet::new(), &request).unwrap();

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].candidate.teacher, TeacherId(1));
    assert!(ranked[0].feasible);
    assert!(ranked[0].reasons.contains(&"同教科".to_string()));
    assert!(ranked[0].reasons.contains(&"対応可能".to_string()));
}

#[test]
fn elective_scenario_fills_to_capacity_and_defers_the_rest() {
    // 10 students choosing among two electives of capacity 5, all
    // ranking subject X first.
    let x = SubjectId(1);
    let y = SubjectId(2);
    let students: Vec<ElectiveStudent> = (0..10)
        .map(|i| ElectiveStudent::new(i, format!("生徒{}", i), [x, y]))
        .collect();
    let offerings = [
        ElectiveOffering::new(x, 5),
        ElectiveOffering::new(y, 5),
    ];

    let result = group(&students, &offerings, 2).unwrap();
    assert_eq!(result.groups[0].students.len(), 5);
    assert_eq!(result.groups[1].students.len(), 5);
    assert!(result.unassigned.is_empty());

    // With single-choice submissions the overflow is deferred instead.
    let stubborn: Vec<ElectiveStudent> = (0..10)
        .map(|i| ElectiveStudent::new(i, format!("生徒{}", i), [x]))
        .collect();
    let result = group(&stubborn, &offerings, 2).unwrap();
    assert_eq!(result.groups[0].students.len(), 5);
    assert!(result.groups[1].students.is_empty());
    assert_eq!(result.unassigned.len(), 5);
}

#[test]
fn manual_edit_can_be_revalidated_without_a_full_solve() {
    // The host constructs a placement by hand (drag-and-drop) and asks
    // the evaluator instead of re-running the solver.
    let domain = full_week_domain();
    let constraints = ConstraintConfig::default();
    let evaluator = ConstraintEvaluator::new(&domain, &constraints).unwrap();

    let manual: PlacementSet = [
        Placement::new(OccurrenceId::new(BlockId(1), 0), Slot::new(0, 0), 1),
    ]
    .into_iter()
    .collect();

    let evaluation = evaluator.evaluate(&manual).unwrap();
    // Subject 1's teacher is unavailable Monday period 1.
    assert!(!evaluation.is_feasible());
    assert_eq!(evaluation.violations.len(), 1);
    assert_eq!(
        evaluation.violations[0].family,
        ConstraintFamily::TeacherAvailability
    );
}
