//! Duplicate detection for question banks.
//!
//! Two questions are duplicates when their canonical fingerprints match:
//! a SHA-256 digest over the normalized prompt and the normalized option
//! texts joined in label order. Normalization lowercases, collapses
//! whitespace runs, and strips a fixed punctuation set, so reformatted
//! copies of the same question still collide.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::model::{OptionSet, Question};

/// Punctuation stripped during normalization. Source texts vary in how they
/// punctuate otherwise identical questions.
const STRIPPED_PUNCTUATION: [char; 12] =
    ['.', ',', ';', ':', '!', '?', '"', '\'', '(', ')', '[', ']'];

/// Canonical form of a text fragment for duplicate comparison.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Content fingerprint over a prompt and its option set.
pub fn fingerprint(prompt: &str, options: &OptionSet) -> String {
    let mut canonical = normalize_text(prompt);
    for (_, text) in options.entries() {
        canonical.push('|');
        canonical.push_str(&normalize_text(text));
    }

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Removes duplicate questions from a bank, keeping the first occurrence of
/// each fingerprint in encounter order, then renumbers the survivors to a
/// dense 1..N range. Each survivor keeps its pre-renumbering id in
/// `original_id`; an id recorded by an earlier pass is left untouched.
///
/// Returns the surviving questions and the number of records removed.
pub fn dedup_questions(questions: Vec<Question>) -> (Vec<Question>, usize) {
    let initial = questions.len();
    let mut seen = HashSet::new();
    let mut kept: Vec<Question> = questions
        .into_iter()
        .filter(|q| seen.insert(fingerprint(&q.question, &q.options)))
        .collect();

    for (position, question) in kept.iter_mut().enumerate() {
        if question.original_id.is_none() {
            question.original_id = Some(question.id);
        }
        question.id = position as u32 + 1;
    }

    let removed = initial - kept.len();
    (kept, removed)
}
