//! The `examblanc validate` command.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use examblanc_core::config::load_config;
use examblanc_core::exam::{REGULATORY_THEME, TECHNICAL_THEME};
use examblanc_core::loader::CorpusLibrary;
use examblanc_core::parser;

pub fn execute(source: Option<PathBuf>, kind: String, config: Option<PathBuf>) -> Result<()> {
    match source {
        Some(path) => validate_source(&path, &kind),
        None => validate_catalogues(config.as_deref()),
    }
}

/// Dry-runs the parse and validation a build would perform, without
/// writing anything.
fn validate_source(path: &Path, kind: &str) -> Result<()> {
    let text = parser::read_source_text(path)?;

    let (theme_count, question_count, issues) = match kind {
        "practice" => {
            let themes = parser::parse_practice_corpus(&text);
            let questions = themes.iter().map(|t| t.questions.len()).sum::<usize>();
            (themes.len(), questions, parser::validate_practice_themes(&themes))
        }
        "exam" => {
            let themes = parser::parse_exam_corpus(&text);
            let questions = themes.iter().map(|t| t.questions.len()).sum::<usize>();
            let issues =
                parser::validate_exam_themes(&themes, &[REGULATORY_THEME, TECHNICAL_THEME]);
            (themes.len(), questions, issues)
        }
        other => bail!("unknown corpus kind '{other}' (expected practice or exam)"),
    };

    println!(
        "Source: {} ({question_count} questions in {theme_count} themes)",
        path.display()
    );
    for issue in &issues {
        println!("  ISSUE: {issue}");
    }

    if issues.is_empty() {
        println!("Source is valid.");
    } else {
        println!("\n{} issue(s) found.", issues.len());
    }
    Ok(())
}

/// Checks that the built catalogues load, and that the exam catalogue can
/// actually serve mock exams.
fn validate_catalogues(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let library = CorpusLibrary::load(&config.practice_path(), &config.exam_path());

    match library.practice() {
        Ok(catalog) => println!(
            "Practice catalogue: {} questions in {} modules",
            catalog.metadata.total_questions, catalog.metadata.total_modules
        ),
        Err(err) => println!("Practice catalogue: {err}"),
    }

    match library.exam() {
        Ok(catalog) => {
            println!(
                "Exam catalogue: {} questions in {} theme banks",
                catalog.metadata.total_questions, catalog.metadata.total_modules
            );
            for name in [REGULATORY_THEME, TECHNICAL_THEME] {
                match catalog.theme_bank(name) {
                    Some(bank) => println!("  {name}: {} questions", bank.total_questions),
                    None => println!("  {name}: missing, mock exams cannot be assembled"),
                }
            }
        }
        Err(err) => println!("Exam catalogue: {err} (mock exams disabled)"),
    }

    Ok(())
}
