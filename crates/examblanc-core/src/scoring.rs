//! Scoring over questions and the answer map. Pure functions, no I/O.
//!
//! Practice and exam scoring deliberately disagree on the denominator:
//! practice counts only answered questions (progress so far), while final
//! exam scoring always divides by the full part size, so unanswered
//! questions cost points.

use serde::{Deserialize, Serialize};

use crate::exam::{ExamAssembly, ExamPart, ExamQuestion};
use crate::model::{practice_key, AnswerMap, Question};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCount {
    pub correct: usize,
    pub total: usize,
}

impl ScoreCount {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64 * 100.0
        }
    }
}

/// Scores a practice module over the questions answered so far. Unanswered
/// questions stay out of the total.
pub fn practice_score(questions: &[Question], answers: &AnswerMap, module_id: u32) -> ScoreCount {
    let mut correct = 0;
    let mut total = 0;

    for question in questions {
        let key = practice_key(module_id, question.id);
        if let Some(choice) = answers.get(&key) {
            total += 1;
            if *choice == question.correct_answer {
                correct += 1;
            }
        }
    }

    ScoreCount { correct, total }
}

/// Final results of one mock exam.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExamScores {
    pub part1: ScoreCount,
    pub part2: ScoreCount,
    pub overall: ScoreCount,
    pub part1_passed: bool,
    pub part2_passed: bool,
    pub overall_passed: bool,
}

/// Scores a finished mock exam. Each part's total is its full question
/// count; passing requires reaching the threshold in both parts
/// independently.
pub fn exam_scores(assembly: &ExamAssembly, answers: &AnswerMap) -> ExamScores {
    let part1 = score_part(&assembly.part1, answers);
    let part2 = score_part(&assembly.part2, answers);
    let overall = ScoreCount {
        correct: part1.correct + part2.correct,
        total: part1.total + part2.total,
    };

    let part1_passed = part1.percentage() >= assembly.part1.pass_threshold;
    let part2_passed = part2.percentage() >= assembly.part2.pass_threshold;

    ExamScores {
        part1,
        part2,
        overall,
        part1_passed,
        part2_passed,
        overall_passed: part1_passed && part2_passed,
    }
}

fn score_part(part: &ExamPart, answers: &AnswerMap) -> ScoreCount {
    let correct = part
        .questions
        .iter()
        .filter(|q| matches!(answers.get(&q.id), Some(choice) if q.is_correct(*choice)))
        .count();
    ScoreCount {
        correct,
        total: part.questions.len(),
    }
}

/// Percentage bands for practice feedback, inclusive on each lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceLevel {
    Excellent,
    VeryGood,
    Good,
    Fair,
    NeedsImprovement,
}

impl PerformanceLevel {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Self::Excellent
        } else if percentage >= 80.0 {
            Self::VeryGood
        } else if percentage >= 70.0 {
            Self::Good
        } else if percentage >= 60.0 {
            Self::Fair
        } else {
            Self::NeedsImprovement
        }
    }
}

impl std::fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Excellent => "Excellent",
            Self::VeryGood => "Very good",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsImprovement => "Needs improvement",
        };
        f.write_str(label)
    }
}

/// Questions answered wrongly in a practice module. Unanswered questions
/// are never part of the review set.
pub fn missed_practice_questions<'a>(
    questions: &'a [Question],
    answers: &AnswerMap,
    module_id: u32,
) -> Vec<&'a Question> {
    questions
        .iter()
        .filter(|question| {
            let key = practice_key(module_id, question.id);
            matches!(answers.get(&key), Some(choice) if *choice != question.correct_answer)
        })
        .collect()
}

/// Questions answered wrongly in a mock exam.
pub fn missed_exam_questions<'a>(
    assembly: &'a ExamAssembly,
    answers: &AnswerMap,
) -> Vec<&'a ExamQuestion> {
    assembly
        .questions()
        .filter(|question| {
            matches!(answers.get(&question.id), Some(choice) if !question.is_correct(*choice))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::PASS_THRESHOLD;
    use crate::model::{Choice, OptionSet};

    fn question(id: u32, correct: Choice) -> Question {
        Question {
            id,
            theme_id: Some(1),
            theme: None,
            question: format!("Question {id}"),
            options: OptionSet::new("Un", "Deux", "Trois"),
            correct_answer: correct,
            explanation: String::new(),
            original_id: None,
        }
    }

    fn exam_part(exam_id: u64, tag: &str, part_number: u32, size: usize) -> ExamPart {
        ExamPart {
            title: format!("Partie {part_number}"),
            questions: (1..=size as u32)
                .map(|i| ExamQuestion {
                    id: format!("exam{exam_id}_{tag}_{i}"),
                    part_number,
                    theme_display: String::new(),
                    question: question(i, Choice::A),
                })
                .collect(),
            target_size: size,
            pass_threshold: PASS_THRESHOLD,
        }
    }

    fn exam(part1_size: usize, part2_size: usize) -> ExamAssembly {
        ExamAssembly {
            exam_id: 1,
            part1: exam_part(1, "env", 1, part1_size),
            part2: exam_part(1, "tech", 2, part2_size),
            total_questions: part1_size + part2_size,
            time_limit_hours: 2,
        }
    }

    /// Answers the first `correct` part-1 questions right; everything else
    /// stays unanswered.
    fn answer_part(answers: &mut AnswerMap, exam_id: u64, tag: &str, correct: usize) {
        for i in 1..=correct {
            answers.insert(format!("exam{exam_id}_{tag}_{i}"), Choice::A);
        }
    }

    #[test]
    fn practice_total_counts_only_answered_questions() {
        let questions = vec![question(1, Choice::A), question(2, Choice::B)];
        let mut answers = AnswerMap::new();
        answers.insert("1_1".into(), Choice::A);
        answers.insert("1_2".into(), Choice::C);

        let score = practice_score(&questions, &answers, 1);
        assert_eq!(score.correct, 1);
        assert_eq!(score.total, 2);
        assert!((score.percentage() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn practice_ignores_unanswered_and_foreign_keys() {
        let questions = vec![
            question(1, Choice::A),
            question(2, Choice::B),
            question(3, Choice::C),
        ];
        let mut answers = AnswerMap::new();
        answers.insert("1_2".into(), Choice::B);
        answers.insert("2_1".into(), Choice::A);
        answers.insert("exam5_env_1".into(), Choice::A);

        let score = practice_score(&questions, &answers, 1);
        assert_eq!(score, ScoreCount { correct: 1, total: 1 });
    }

    #[test]
    fn empty_answer_map_scores_zero_of_zero() {
        let questions = vec![question(1, Choice::A)];
        let score = practice_score(&questions, &AnswerMap::new(), 1);
        assert_eq!(score, ScoreCount { correct: 0, total: 0 });
        assert_eq!(score.percentage(), 0.0);
    }

    #[test]
    fn exam_denominator_is_the_full_part_size() {
        let assembly = exam(10, 10);
        let mut answers = AnswerMap::new();
        answer_part(&mut answers, 1, "env", 3);

        let scores = exam_scores(&assembly, &answers);
        assert_eq!(scores.part1, ScoreCount { correct: 3, total: 10 });
        assert_eq!(scores.part2, ScoreCount { correct: 0, total: 10 });
        assert_eq!(scores.overall, ScoreCount { correct: 3, total: 20 });
    }

    #[test]
    fn pass_boundary_is_exactly_eighty_percent() {
        let assembly = exam(1000, 10);

        let mut answers = AnswerMap::new();
        answer_part(&mut answers, 1, "env", 799);
        let scores = exam_scores(&assembly, &answers);
        assert!((scores.part1.percentage() - 79.9).abs() < 1e-9);
        assert!(!scores.part1_passed);

        answer_part(&mut answers, 1, "env", 800);
        let scores = exam_scores(&assembly, &answers);
        assert!((scores.part1.percentage() - 80.0).abs() < 1e-9);
        assert!(scores.part1_passed);
    }

    #[test]
    fn overall_pass_requires_both_parts() {
        let assembly = exam(10, 10);
        let mut answers = AnswerMap::new();
        answer_part(&mut answers, 1, "env", 9);
        answer_part(&mut answers, 1, "tech", 7);

        let scores = exam_scores(&assembly, &answers);
        assert!(scores.part1_passed);
        assert!(!scores.part2_passed);
        assert!(!scores.overall_passed);

        answer_part(&mut answers, 1, "tech", 8);
        assert!(exam_scores(&assembly, &answers).overall_passed);
    }

    #[test]
    fn performance_bands_are_inclusive_on_lower_bounds() {
        use PerformanceLevel::*;
        assert_eq!(PerformanceLevel::from_percentage(100.0), Excellent);
        assert_eq!(PerformanceLevel::from_percentage(90.0), Excellent);
        assert_eq!(PerformanceLevel::from_percentage(89.9), VeryGood);
        assert_eq!(PerformanceLevel::from_percentage(80.0), VeryGood);
        assert_eq!(PerformanceLevel::from_percentage(79.9), Good);
        assert_eq!(PerformanceLevel::from_percentage(70.0), Good);
        assert_eq!(PerformanceLevel::from_percentage(60.0), Fair);
        assert_eq!(PerformanceLevel::from_percentage(59.9), NeedsImprovement);
        assert_eq!(PerformanceLevel::from_percentage(0.0), NeedsImprovement);
    }

    #[test]
    fn review_set_excludes_unanswered_questions() {
        let questions = vec![
            question(1, Choice::A),
            question(2, Choice::B),
            question(3, Choice::C),
        ];
        let mut answers = AnswerMap::new();
        answers.insert("1_1".into(), Choice::B);
        answers.insert("1_2".into(), Choice::B);

        let missed = missed_practice_questions(&questions, &answers, 1);
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].id, 1);
    }

    #[test]
    fn exam_review_set_tracks_scoped_ids() {
        let assembly = exam(3, 2);
        let mut answers = AnswerMap::new();
        answers.insert("exam1_env_1".into(), Choice::B);
        answers.insert("exam1_env_2".into(), Choice::A);

        let missed = missed_exam_questions(&assembly, &answers);
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].id, "exam1_env_1");
    }
}
