//! The `examblanc progress` command.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::Local;
use examblanc_core::config::load_config;
use examblanc_core::progress::ProgressStore;
use examblanc_core::session::SessionState;

pub fn execute(
    reset_module: Option<u32>,
    reset_exam: Option<u32>,
    reset_all: bool,
    yes: bool,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let store = ProgressStore::new(&config.checkpoint_dir);

    if !reset_all && reset_module.is_none() && reset_exam.is_none() {
        return show(&store);
    }

    if !yes {
        bail!("resets are destructive; re-run with --yes to confirm");
    }

    let mut session = SessionState::resume(&store, config.autosave_policy());

    if reset_all {
        match session.reset_all(&store)? {
            Some(path) => println!(
                "Progress reset; previous file archived to {}",
                path.display()
            ),
            None => println!("Progress reset; nothing to archive."),
        }
        return Ok(());
    }

    if let Some(module_id) = reset_module {
        let removed = session.reset_module(module_id);
        println!("Cleared {removed} answer(s) for module {module_id}.");
    }
    if let Some(exam_id) = reset_exam {
        let removed = session.reset_exam(exam_id);
        println!("Cleared {removed} answer(s) for exam {exam_id}.");
    }
    session.save_now(&store)?;

    Ok(())
}

fn show(store: &ProgressStore) -> Result<()> {
    use comfy_table::{Cell, Table};

    let snapshot = store.load();
    let stats = &snapshot.statistics;

    let modules = if stats.modules_with_progress.is_empty() {
        "-".to_string()
    } else {
        stats.modules_with_progress.join(", ")
    };

    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![
        Cell::new("Answers recorded"),
        Cell::new(snapshot.user_answers.len()),
    ]);
    table.add_row(vec![
        Cell::new("Sessions"),
        Cell::new(stats.total_sessions),
    ]);
    table.add_row(vec![
        Cell::new("Exam answers"),
        Cell::new(stats.exam_blanc_questions_answered),
    ]);
    table.add_row(vec![Cell::new("Modules with progress"), Cell::new(modules)]);
    table.add_row(vec![
        Cell::new("Last updated"),
        Cell::new(
            snapshot
                .last_updated
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S"),
        ),
    ]);

    println!("{table}");
    Ok(())
}
