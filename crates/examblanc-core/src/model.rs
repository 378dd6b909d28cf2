//! Core data model types for examblanc.
//!
//! These are the fundamental types shared by the corpus builder, the
//! loader, the mock-exam assembler, the scoring engine, and the progress
//! store: question records, their option sets, theme modules, and the
//! cumulative answer map.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the three answer labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
    C,
}

impl Choice {
    /// All labels, in display order.
    pub const ALL: [Choice; 3] = [Choice::A, Choice::B, Choice::C];
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::A => write!(f, "A"),
            Choice::B => write!(f, "B"),
            Choice::C => write!(f, "C"),
        }
    }
}

impl FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Choice::A),
            "B" | "b" => Ok(Choice::B),
            "C" | "c" => Ok(Choice::C),
            other => Err(format!("unknown answer label: {other}")),
        }
    }
}

/// The three option texts of a question, keyed by their fixed labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
}

impl OptionSet {
    pub fn new(a: impl Into<String>, b: impl Into<String>, c: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            c: c.into(),
        }
    }

    /// Option text for a label.
    pub fn get(&self, choice: Choice) -> &str {
        match choice {
            Choice::A => &self.a,
            Choice::B => &self.b,
            Choice::C => &self.c,
        }
    }

    /// Labeled texts in label order.
    pub fn entries(&self) -> [(Choice, &str); 3] {
        Choice::ALL.map(|choice| (choice, self.get(choice)))
    }

    /// True when every option text is non-empty after trimming.
    pub fn is_complete(&self) -> bool {
        self.entries().iter().all(|(_, text)| !text.trim().is_empty())
    }
}

/// A single multiple-choice question inside a theme bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Dense identifier, unique within the containing bank.
    pub id: u32,
    /// Numeric theme id (practice catalogues).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<u32>,
    /// Theme name (exam catalogues).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// The prompt, non-empty for valid records.
    pub question: String,
    /// The three option texts.
    pub options: OptionSet,
    /// Which label is correct.
    pub correct_answer: Choice,
    /// Optional free-text explanation.
    #[serde(default)]
    pub explanation: String,
    /// Identifier the record carried before dense renumbering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<u32>,
}

impl Question {
    /// The text of the correct option.
    pub fn correct_text(&self) -> &str {
        self.options.get(self.correct_answer)
    }
}

/// Catalogue module type marker for exam-theme banks.
pub const EXAM_MODULE_TYPE: &str = "exam_blanc";

/// A theme bank packaged for the catalogue: one module per theme, carrying
/// 100% of that theme's questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: u32,
    pub title: String,
    pub full_title: String,
    #[serde(default)]
    pub description: String,
    /// Theme name, present on exam-catalogue modules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub questions: Vec<Question>,
    pub total_questions: usize,
    /// `"exam_blanc"` marks modules belonging to an exam catalogue.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Module {
    /// True for exam-theme banks.
    pub fn is_exam_bank(&self) -> bool {
        self.kind.as_deref() == Some(EXAM_MODULE_TYPE)
    }
}

/// Cumulative mapping from scoped question key to the selected label.
///
/// This is the single source of truth for "what has the user answered",
/// across every module and exam ever attempted. A `BTreeMap` keeps JSON
/// serialization order stable, so repeated no-op saves differ only in their
/// timestamp fields.
pub type AnswerMap = BTreeMap<String, Choice>;

/// Scoped key for a practice-module answer: `{module_id}_{question_id}`.
///
/// Exam answers use the assembled question's composite id directly as the
/// key (see [`crate::exam`]), so the two contexts can never collide.
pub fn practice_key(module_id: u32, question_id: u32) -> String {
    format!("{module_id}_{question_id}")
}
