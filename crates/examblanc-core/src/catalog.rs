//! Catalogue construction and JSON emission.
//!
//! A catalogue is the on-disk product of the corpus builder: a metadata
//! header plus a list of modules. Practice catalogues hold one module per
//! numbered theme block; exam catalogues hold one theme bank per recognized
//! theme name, marked with the exam module type.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::dedup::dedup_questions;
use crate::model::{Choice, Module, OptionSet, Question, EXAM_MODULE_TYPE};
use crate::parser::{ExamTheme, ParsedTheme, RawQuestion};

/// Per-theme entry of the catalogue metadata header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeSummary {
    pub title: String,
    pub question_count: usize,
}

/// Catalogue metadata header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogMetadata {
    pub total_questions: usize,
    pub total_modules: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    /// `exam_blanc` on exam catalogues, absent on practice catalogues.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub deduplication: bool,
    /// Keyed by theme id (practice) or theme name (exam).
    #[serde(default)]
    pub themes: BTreeMap<String, ThemeSummary>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A complete question catalogue as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub metadata: CatalogMetadata,
    pub modules: Vec<Module>,
}

impl Catalog {
    /// Looks up a module by id.
    pub fn module(&self, id: u32) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// Looks up an exam theme bank by its theme name.
    pub fn theme_bank(&self, theme_name: &str) -> Option<&Module> {
        self.modules
            .iter()
            .find(|m| m.theme.as_deref() == Some(theme_name))
    }

    pub fn is_exam_catalog(&self) -> bool {
        self.metadata.kind.as_deref() == Some(EXAM_MODULE_TYPE)
    }

    /// Writes the catalogue as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("failed to serialize catalogue")?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create directory {}", parent.display())
                })?;
            }
        }
        fs::write(path, json)
            .with_context(|| format!("failed to write catalogue to {}", path.display()))?;
        Ok(())
    }
}

/// Outcome of a catalogue build.
#[derive(Debug)]
pub struct BuiltCatalog {
    pub catalog: Catalog,
    /// Duplicate records dropped across all theme banks.
    pub duplicates_removed: usize,
}

/// Builds the practice catalogue from parsed theme blocks, ordered by theme
/// id. Each bank is deduplicated independently; themes left without any
/// usable question are skipped.
pub fn build_practice_catalog(themes: &[ParsedTheme], source_file: &str) -> BuiltCatalog {
    let mut modules = Vec::new();
    let mut summaries = BTreeMap::new();
    let mut duplicates_removed = 0;

    let mut ordered: Vec<&ParsedTheme> = themes.iter().collect();
    ordered.sort_by_key(|theme| theme.id);

    for theme in ordered {
        let typed = typed_questions(&theme.questions, Some(theme.id), None);
        let (unique, removed) = dedup_questions(typed);
        duplicates_removed += removed;

        if unique.is_empty() {
            tracing::warn!(
                "skipping theme {} ({}): no usable questions",
                theme.id,
                theme.title
            );
            continue;
        }

        let count = unique.len();
        summaries.insert(
            theme.id.to_string(),
            ThemeSummary {
                title: theme.title.clone(),
                question_count: count,
            },
        );
        modules.push(Module {
            id: theme.id,
            title: format!("Thème {}", theme.id),
            full_title: theme.title.clone(),
            description: format!("{count} questions - {}", truncate_chars(&theme.title, 50)),
            theme: None,
            questions: unique,
            total_questions: count,
            kind: None,
        });
    }

    let total_questions = modules.iter().map(|m| m.total_questions).sum();
    BuiltCatalog {
        catalog: Catalog {
            metadata: CatalogMetadata {
                total_questions,
                total_modules: modules.len(),
                created_date: Some(Utc::now().format("%Y-%m-%d").to_string()),
                source_file: Some(source_file.to_string()),
                kind: None,
                deduplication: false,
                themes: summaries,
            },
            modules,
        },
        duplicates_removed,
    }
}

/// Builds the exam catalogue: one theme bank per inline theme, in encounter
/// order, each marked as an exam module.
pub fn build_exam_catalog(themes: &[ExamTheme], source_file: &str) -> BuiltCatalog {
    let mut modules = Vec::new();
    let mut summaries = BTreeMap::new();
    let mut duplicates_removed = 0;

    for (index, theme) in themes.iter().enumerate() {
        let typed = typed_questions(&theme.questions, None, Some(&theme.name));
        let (unique, removed) = dedup_questions(typed);
        duplicates_removed += removed;

        if unique.is_empty() {
            tracing::warn!("skipping theme {}: no usable questions", theme.name);
            continue;
        }

        let count = unique.len();
        summaries.insert(
            theme.name.clone(),
            ThemeSummary {
                title: theme.name.clone(),
                question_count: count,
            },
        );
        modules.push(Module {
            id: index as u32 + 1,
            title: format!("Examen - {}", theme.name),
            full_title: theme.name.clone(),
            description: format!("{count} questions - {}", theme.name),
            theme: Some(theme.name.clone()),
            questions: unique,
            total_questions: count,
            kind: Some(EXAM_MODULE_TYPE.to_string()),
        });
    }

    let total_questions = modules.iter().map(|m| m.total_questions).sum();
    BuiltCatalog {
        catalog: Catalog {
            metadata: CatalogMetadata {
                total_questions,
                total_modules: modules.len(),
                created_date: Some(Utc::now().format("%Y-%m-%d").to_string()),
                source_file: Some(source_file.to_string()),
                kind: Some(EXAM_MODULE_TYPE.to_string()),
                deduplication: true,
                themes: summaries,
            },
            modules,
        },
        duplicates_removed,
    }
}

/// Converts raw scanned entries into typed records. Entries whose expected
/// answer is not a valid option label cannot be represented and are dropped
/// here; the validator has already reported them.
fn typed_questions(
    raw: &[RawQuestion],
    theme_id: Option<u32>,
    theme: Option<&str>,
) -> Vec<Question> {
    raw.iter()
        .filter_map(|entry| {
            let correct_answer = match entry.answer.parse::<Choice>() {
                Ok(choice) => choice,
                Err(_) => {
                    tracing::warn!(
                        "dropping question {}: expected answer '{}' is not an option label",
                        entry.source_id,
                        entry.answer
                    );
                    return None;
                }
            };
            Some(Question {
                id: entry.source_id,
                theme_id,
                theme: theme.map(String::from),
                question: entry.prompt.clone(),
                options: OptionSet::new(&entry.option_a, &entry.option_b, &entry.option_c),
                correct_answer,
                explanation: String::new(),
                original_id: None,
            })
        })
        .collect()
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let prefix: String = text.chars().take(limit).collect();
        format!("{prefix}...")
    }
}
