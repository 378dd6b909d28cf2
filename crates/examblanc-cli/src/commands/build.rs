//! The `examblanc build` command.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use examblanc_core::catalog::{build_exam_catalog, build_practice_catalog, BuiltCatalog};
use examblanc_core::config::load_config;
use examblanc_core::error::IngestError;
use examblanc_core::exam::{REGULATORY_THEME, TECHNICAL_THEME};
use examblanc_core::parser::{self, ValidationIssue};

const MAX_ISSUES_SHOWN: usize = 10;

pub fn execute(
    source: PathBuf,
    kind: String,
    output: Option<PathBuf>,
    force: bool,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let text = parser::read_source_text(&source)?;

    let built = match kind.as_str() {
        "practice" => {
            let themes = parser::parse_practice_corpus(&text);
            if themes.is_empty() {
                return Err(anyhow::Error::from(IngestError::EmptyCorpus {
                    path: source.clone(),
                })
                .context("no theme blocks found; practice sources need 'Thème N : titre' headers"));
            }
            confirm_issues(&parser::validate_practice_themes(&themes), force)?;
            build_practice_catalog(&themes, &source_name(&source))
        }
        "exam" => {
            let themes = parser::parse_exam_corpus(&text);
            if themes.is_empty() {
                return Err(anyhow::Error::from(IngestError::EmptyCorpus {
                    path: source.clone(),
                })
                .context("no question entries found; exam sources need 'Thème : nom' labels"));
            }
            let issues =
                parser::validate_exam_themes(&themes, &[REGULATORY_THEME, TECHNICAL_THEME]);
            confirm_issues(&issues, force)?;
            build_exam_catalog(&themes, &source_name(&source))
        }
        other => bail!("unknown corpus kind '{other}' (expected practice or exam)"),
    };

    let output = output.unwrap_or_else(|| match kind.as_str() {
        "exam" => config.exam_path(),
        _ => config.practice_path(),
    });
    built.catalog.save_json(&output)?;

    print_summary(&built, &output);
    Ok(())
}

/// Shows validation findings, capped for readability, and refuses to build
/// on them unless `--force` was given.
fn confirm_issues(issues: &[ValidationIssue], force: bool) -> Result<()> {
    if issues.is_empty() {
        return Ok(());
    }

    println!("{} validation issue(s) found:", issues.len());
    for issue in issues.iter().take(MAX_ISSUES_SHOWN) {
        println!("  {issue}");
    }
    if issues.len() > MAX_ISSUES_SHOWN {
        println!("  ... and {} more", issues.len() - MAX_ISSUES_SHOWN);
    }

    if !force {
        bail!("validation failed; fix the source or re-run with --force to build anyway");
    }
    println!("Proceeding despite validation issues (--force).");
    Ok(())
}

fn source_name(source: &Path) -> String {
    source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string())
}

fn print_summary(built: &BuiltCatalog, output: &Path) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Module", "Title", "Questions"]);
    for module in &built.catalog.modules {
        table.add_row(vec![
            Cell::new(module.id),
            Cell::new(&module.full_title),
            Cell::new(module.total_questions),
        ]);
    }

    println!("{table}");
    println!(
        "Catalogue written to {} ({} questions in {} modules, {} duplicate(s) removed)",
        output.display(),
        built.catalog.metadata.total_questions,
        built.catalog.metadata.total_modules,
        built.duplicates_removed
    );
}
