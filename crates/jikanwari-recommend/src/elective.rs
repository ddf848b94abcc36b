//! Elective course grouping.
//!
//! Students rank subject choices; the optimizer partitions them into
//! subject groups honoring those preferences under per-group capacity,
//! then reports the admitted lists, the unassigned pool and an overall
//! satisfaction score.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use jikanwari_core::{EngineError, Result, SubjectId, TeacherId};

/// Bounded swap passes after the greedy assignment, so local
/// reoptimization cannot thrash unboundedly.
const MAX_SWAP_PASSES: usize = 3;

/// Satisfaction lost per student left unassigned.
const UNASSIGNED_PENALTY: f64 = 0.5;

/// A student and their ordered subject choices (most preferred first).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElectiveStudent {
    pub id: u32,
    pub name: String,
    pub choices: Vec<SubjectId>,
}

impl ElectiveStudent {
    pub fn new(id: u32, name: impl Into<String>, choices: impl IntoIterator<Item = SubjectId>) -> Self {
        ElectiveStudent {
            id,
            name: name.into(),
            choices: choices.into_iter().collect(),
        }
    }

    /// 1-based preference rank of a subject, if the student listed it.
    fn rank_of(&self, subject: SubjectId) -> Option<usize> {
        self.choices.iter().position(|c| *c == subject).map(|p| p + 1)
    }
}

/// One offered elective group: a subject, its capacity and an optional
/// pre-assigned teacher.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElectiveOffering {
    pub subject: SubjectId,
    pub capacity: u32,
    pub teacher: Option<TeacherId>,
}

impl ElectiveOffering {
    pub fn new(subject: SubjectId, capacity: u32) -> Self {
        ElectiveOffering {
            subject,
            capacity,
            teacher: None,
        }
    }

    pub fn with_teacher(mut self, teacher: TeacherId) -> Self {
        self.teacher = Some(teacher);
        self
    }
}

/// One formed group.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElectiveGroup {
    pub subject: SubjectId,
    pub period: u32,
    pub teacher: Option<TeacherId>,
    /// Admitted student ids, in admission order.
    pub students: Vec<u32>,
}

/// Output of the grouping optimizer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElectiveResult {
    pub groups: Vec<ElectiveGroup>,
    /// Students no listed choice could admit.
    pub unassigned: Vec<u32>,
    /// Mean of 1/rank over assigned students, minus a penalty per
    /// unassigned student.
    pub satisfaction: f64,
}

/// Partitions students into elective groups.
///
/// Greedy pass in stable input order: each student joins the highest-
/// ranked choice with remaining capacity. Students whose every choice is
/// full are deferred, then a bounded swap pass moves an already-assigned
/// student to another of their listed choices when that frees a seat a
/// deferred student values more. Capacity is never exceeded and nobody
/// is placed into a subject they did not list.
pub fn group(
    students: &[ElectiveStudent],
    offerings: &[ElectiveOffering],
    period_count: u32,
) -> Result<ElectiveResult> {
    if period_count == 0 {
        return Err(EngineError::InvalidInput(
            "period_count must be at least 1".into(),
        ));
    }
    let mut capacity: BTreeMap<SubjectId, u32> = BTreeMap::new();
    for offering in offerings {
        if capacity.insert(offering.subject, offering.capacity).is_some() {
            return Err(EngineError::InvalidInput(format!(
                "duplicate elective offering for {}",
                offering.subject
            )));
        }
    }
    {
        let mut seen = BTreeMap::new();
        for student in students {
            if seen.insert(student.id, ()).is_some() {
                return Err(EngineError::InvalidInput(format!(
                    "duplicate student id {}",
                    student.id
                )));
            }
        }
    }

    // assignment[i] = subject of students[i], admission tracked per group.
    let mut assignment: Vec<Option<SubjectId>> = vec![None; students.len()];
    let mut admitted: BTreeMap<SubjectId, Vec<usize>> = BTreeMap::new();
    let mut remaining = capacity.clone();
    let mut deferred: Vec<usize> = Vec::new();

    for (index, student) in students.iter().enumerate() {
        let choice = student
            .choices
            .iter()
            .find(|subject| remaining.get(*subject).copied().unwrap_or(0) > 0);
        match choice {
            Some(subject) => {
                *remaining.get_mut(subject).expect("choice was checked") -= 1;
                assignment[index] = Some(*subject);
                admitted.entry(*subject).or_default().push(index);
            }
            None => deferred.push(index),
        }
    }

    // Local reoptimization: admit deferred students by relocating a
    // current member to another of their own choices, when the exchange
    // increases total satisfaction.
    for _ in 0..MAX_SWAP_PASSES {
        let mut progressed = false;
        let mut still_deferred = Vec::new();

        'students: for &index in &deferred {
            let student = &students[index];
            for subject in &student.choices {
                if !capacity.contains_key(subject) {
                    continue;
                }
                if remaining.get(subject).copied().unwrap_or(0) > 0 {
                    *remaining.get_mut(subject).expect("checked above") -= 1;
                    assignment[index] = Some(*subject);
                    admitted.entry(*subject).or_default().push(index);
                    progressed = true;
                    continue 'students;
                }
                if let Some(mover) = find_mover(students, &assignment, &admitted, &remaining, *subject, student)
                {
                    let (member_index, target) = mover;
                    relocate(&mut assignment, &mut admitted, &mut remaining, member_index, target);
                    *remaining.get_mut(subject).expect("freed above") -= 1;
                    assignment[index] = Some(*subject);
                    admitted.entry(*subject).or_default().push(index);
                    progressed = true;
                    continue 'students;
                }
            }
            still_deferred.push(index);
        }

        deferred = still_deferred;
        if !progressed || deferred.is_empty() {
            break;
        }
    }

    let assigned_count = assignment.iter().filter(|a| a.is_some()).count();
    let satisfaction_sum: f64 = students
        .iter()
        .zip(&assignment)
        .filter_map(|(student, assigned)| {
            assigned.and_then(|subject| student.rank_of(subject)).map(|rank| 1.0 / rank as f64)
        })
        .sum();
    let mean = if assigned_count > 0 {
        satisfaction_sum / assigned_count as f64
    } else {
        0.0
    };
    let satisfaction = mean - deferred.len() as f64 * UNASSIGNED_PENALTY;

    let groups = offerings
        .iter()
        .enumerate()
        .map(|(position, offering)| ElectiveGroup {
            subject: offering.subject,
            period: position as u32 % period_count,
            teacher: offering.teacher,
            students: admitted
                .get(&offering.subject)
                .map(|members| members.iter().map(|&i| students[i].id).collect())
                .unwrap_or_default(),
        })
        .collect();

    tracing::debug!(
        students = students.len(),
        unassigned = deferred.len(),
        satisfaction,
        "grouped elective choices"
    );

    Ok(ElectiveResult {
        groups,
        unassigned: deferred.iter().map(|&i| students[i].id).collect(),
        satisfaction,
    })
}

/// Finds the first member of `subject`'s group who can relocate to
/// another of their own choices with free capacity such that total
/// satisfaction increases: the incoming student's gain plus the mover's
/// change must be positive.
fn find_mover(
    students: &[ElectiveStudent],
    assignment: &[Option<SubjectId>],
    admitted: &BTreeMap<SubjectId, Vec<usize>>,
    remaining: &BTreeMap<SubjectId, u32>,
    subject: SubjectId,
    incoming: &ElectiveStudent,
) -> Option<(usize, SubjectId)> {
    let incoming_gain = 1.0 / incoming.rank_of(subject)? as f64;
    let members = admitted.get(&subject)?;

    for &member_index in members {
        let member = &students[member_index];
        debug_assert_eq!(assignment[member_index], Some(subject));
        let current_rank = member.rank_of(subject)?;
        for target in &member.choices {
            if *target == subject || remaining.get(target).copied().unwrap_or(0) == 0 {
                continue;
            }
            let target_rank = member.rank_of(*target).expect("target is a listed choice");
            let member_change = 1.0 / target_rank as f64 - 1.0 / current_rank as f64;
            if incoming_gain + member_change > 0.0 {
                return Some((member_index, *target));
            }
        }
    }
    None
}

fn relocate(
    assignment: &mut [Option<SubjectId>],
    admitted: &mut BTreeMap<SubjectId, Vec<usize>>,
    remaining: &mut BTreeMap<SubjectId, u32>,
    member_index: usize,
    target: SubjectId,
) {
    let from = assignment[member_index].expect("mover is assigned");
    if let Some(members) = admitted.get_mut(&from) {
        members.retain(|&i| i != member_index);
    }
    *remaining.get_mut(&from).expect("group exists") += 1;
    *remaining.get_mut(&target).expect("target exists") -= 1;
    assignment[member_index] = Some(target);
    admitted.entry(target).or_default().push(member_index);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn students_all_preferring(first: SubjectId, second: SubjectId, count: u32) -> Vec<ElectiveStudent> {
        (0..count)
            .map(|i| ElectiveStudent::new(i, format!("生徒{}", i), [first, second]))
            .collect()
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let students = students_all_preferring(SubjectId(1), SubjectId(2), 10);
        let offerings = [
            ElectiveOffering::new(SubjectId(1), 5),
            ElectiveOffering::new(SubjectId(2), 5),
        ];
        let result = group(&students, &offerings, 2).unwrap();

        assert_eq!(result.groups[0].students.len(), 5);
        assert_eq!(result.groups[1].students.len(), 5);
        assert!(result.unassigned.is_empty());
        // First five submitted get their first choice.
        assert_eq!(result.groups[0].students, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn students_overflow_to_the_unassigned_pool() {
        let students: Vec<ElectiveStudent> = (0..7)
            .map(|i| ElectiveStudent::new(i, format!("生徒{}", i), [SubjectId(1)]))
            .collect();
        let offerings = [ElectiveOffering::new(SubjectId(1), 5)];
        let result = group(&students, &offerings, 1).unwrap();

        assert_eq!(result.groups[0].students.len(), 5);
        assert_eq!(result.unassigned, vec![5, 6]);
        assert!(result.satisfaction < 1.0);
    }

    #[test]
    fn swap_pass_admits_a_first_choice_student() {
        // Student 0 takes subject 1's only seat but also listed
        // subject 2; student 1 wants subject 1 and nothing else. The
        // swap pass moves student 0 to their second choice so the
        // single-choice student gets in.
        let students = vec![
            ElectiveStudent::new(0, "先着", [SubjectId(1), SubjectId(2)]),
            ElectiveStudent::new(1, "一途", [SubjectId(1)]),
        ];
        let offerings = [
            ElectiveOffering::new(SubjectId(1), 1),
            ElectiveOffering::new(SubjectId(2), 1),
        ];
        let result = group(&students, &offerings, 1).unwrap();
        assert!(result.unassigned.is_empty());
        assert_eq!(result.groups[0].students, vec![1]);
        assert_eq!(result.groups[1].students, vec![0]);
        // 1/1 for the admitted first choice, 1/2 for the relocated one.
        assert_eq!(result.satisfaction, 0.75);
    }

    #[test]
    fn assigned_subject_is_always_a_listed_choice() {
        let students = vec![
            ElectiveStudent::new(0, "甲", [SubjectId(1)]),
            ElectiveStudent::new(1, "乙", [SubjectId(2)]),
        ];
        let offerings = [
            ElectiveOffering::new(SubjectId(1), 1),
            ElectiveOffering::new(SubjectId(2), 1),
            ElectiveOffering::new(SubjectId(3), 10),
        ];
        let result = group(&students, &offerings, 3).unwrap();
        // Nobody lands in subject 3 despite its free seats.
        assert!(result.groups[2].students.is_empty());
        assert!(result.unassigned.is_empty());
    }

    #[test]
    fn groups_cycle_through_periods() {
        let offerings = [
            ElectiveOffering::new(SubjectId(1), 1),
            ElectiveOffering::new(SubjectId(2), 1),
            ElectiveOffering::new(SubjectId(3), 1),
        ];
        let result = group(&[], &offerings, 2).unwrap();
        let periods: Vec<u32> = result.groups.iter().map(|g| g.period).collect();
        assert_eq!(periods, vec![0, 1, 0]);
    }

    #[test]
    fn zero_periods_is_invalid_input() {
        assert!(matches!(
            group(&[], &[], 0),
            Err(EngineError::InvalidInput(_))
        ));
    }
}
