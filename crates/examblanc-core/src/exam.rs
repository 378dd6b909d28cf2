//! Mock-exam assembly.
//!
//! An assembly is built per exam attempt from the two recognized theme
//! banks of the exam catalogue. Sampling is keyed by the exam id alone: the
//! generator is reseeded from it immediately before each draw, so a given
//! id always yields the same exam regardless of what else consumed
//! randomness in the process. Sampled records are relabeled copies; the
//! source banks are never touched.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::model::{Choice, Question};

pub const PART1_TARGET: usize = 56;
pub const PART2_TARGET: usize = 64;
pub const PASS_THRESHOLD: f64 = 80.0;
pub const TIME_LIMIT_HOURS: u32 = 2;

/// Theme names the assembler looks up in the exam catalogue.
pub const REGULATORY_THEME: &str = "Environnement réglementaire";
pub const TECHNICAL_THEME: &str = "Connaissances techniques";

const PART1_TAG: &str = "env";
const PART2_TAG: &str = "tech";

/// A sampled question carrying its exam-scoped identity. The id doubles as
/// the answer-map key, so answers from different exam instances never
/// collide even when they sample the same underlying records.
#[derive(Debug, Clone, Serialize)]
pub struct ExamQuestion {
    pub id: String,
    pub part_number: u32,
    pub theme_display: String,
    pub question: Question,
}

impl ExamQuestion {
    pub fn is_correct(&self, choice: Choice) -> bool {
        choice == self.question.correct_answer
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExamPart {
    pub title: String,
    pub questions: Vec<ExamQuestion>,
    pub target_size: usize,
    pub pass_threshold: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExamAssembly {
    pub exam_id: u64,
    pub part1: ExamPart,
    pub part2: ExamPart,
    pub total_questions: usize,
    /// Advisory only; nothing in the core enforces it.
    pub time_limit_hours: u32,
}

impl ExamAssembly {
    /// Answer-map key prefix shared by every question of this exam.
    pub fn key_prefix(&self) -> String {
        exam_key_prefix(self.exam_id)
    }

    pub fn parts(&self) -> [&ExamPart; 2] {
        [&self.part1, &self.part2]
    }

    pub fn questions(&self) -> impl Iterator<Item = &ExamQuestion> {
        self.part1.questions.iter().chain(self.part2.questions.iter())
    }
}

/// Answer-map key prefix for exam `exam_id`.
pub fn exam_key_prefix(exam_id: u64) -> String {
    format!("exam{exam_id}_")
}

/// Assembles a mock exam from the catalogue. Returns `None` when either
/// recognized theme bank is missing, which callers surface as the exam
/// corpus being unavailable.
pub fn assemble(exam_id: u64, catalog: &Catalog) -> Option<ExamAssembly> {
    let Some(regulatory) = catalog.theme_bank(REGULATORY_THEME) else {
        tracing::warn!("exam catalogue has no '{REGULATORY_THEME}' bank");
        return None;
    };
    let Some(technical) = catalog.theme_bank(TECHNICAL_THEME) else {
        tracing::warn!("exam catalogue has no '{TECHNICAL_THEME}' bank");
        return None;
    };

    let part1 = ExamPart {
        title: format!("Partie 1 - {REGULATORY_THEME}"),
        questions: sample_part(
            exam_id,
            &regulatory.questions,
            PART1_TARGET,
            PART1_TAG,
            1,
            REGULATORY_THEME,
        ),
        target_size: PART1_TARGET,
        pass_threshold: PASS_THRESHOLD,
    };
    let part2 = ExamPart {
        title: format!("Partie 2 - {TECHNICAL_THEME}"),
        questions: sample_part(
            exam_id,
            &technical.questions,
            PART2_TARGET,
            PART2_TAG,
            2,
            TECHNICAL_THEME,
        ),
        target_size: PART2_TARGET,
        pass_threshold: PASS_THRESHOLD,
    };

    let total_questions = part1.questions.len() + part2.questions.len();
    tracing::debug!(
        "assembled exam {exam_id}: {} + {} questions",
        part1.questions.len(),
        part2.questions.len()
    );

    Some(ExamAssembly {
        exam_id,
        part1,
        part2,
        total_questions,
        time_limit_hours: TIME_LIMIT_HOURS,
    })
}

/// Draws up to `target` questions from a bank without replacement and
/// relabels the copies with exam-scoped ids, positions starting at 1.
fn sample_part(
    exam_id: u64,
    bank: &[Question],
    target: usize,
    tag: &str,
    part_number: u32,
    theme_display: &str,
) -> Vec<ExamQuestion> {
    // Reseeded here, not once per assembly: reproducibility must hold for
    // each draw independently.
    let mut rng = ChaCha8Rng::seed_from_u64(exam_id);
    let amount = target.min(bank.len());

    rand::seq::index::sample(&mut rng, bank.len(), amount)
        .iter()
        .enumerate()
        .map(|(position, index)| ExamQuestion {
            id: format!("exam{exam_id}_{tag}_{}", position + 1),
            part_number,
            theme_display: theme_display.to_string(),
            question: bank[index].clone(),
        })
        .collect()
}
