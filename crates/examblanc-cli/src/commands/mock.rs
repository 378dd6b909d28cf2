//! The `examblanc mock` command.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use examblanc_core::config::load_config;
use examblanc_core::exam::{self, ExamAssembly};
use examblanc_core::loader::CorpusLibrary;
use examblanc_core::progress::ProgressStore;
use examblanc_core::scoring::{exam_scores, ExamScores, PerformanceLevel};

pub fn execute(
    exam_id: u64,
    questions: usize,
    score: bool,
    format: String,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let library = CorpusLibrary::load(&config.practice_path(), &config.exam_path());
    let catalog = library
        .exam()
        .context("cannot assemble a mock exam without the exam catalogue")?;

    let assembly = exam::assemble(exam_id, catalog)
        .context("the exam catalogue is missing a required theme bank")?;
    tracing::debug!(
        "assembled exam {exam_id} with {} questions",
        assembly.total_questions
    );

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&assembly)?);
            return Ok(());
        }
        "text" => {}
        other => bail!("unknown output format '{other}' (expected text or json)"),
    }

    print_parts(&assembly);
    if questions > 0 {
        print_questions(&assembly, questions);
    }

    if score {
        let store = ProgressStore::new(&config.checkpoint_dir);
        let snapshot = store.load();
        print_scores(&exam_scores(&assembly, &snapshot.user_answers));
    }

    Ok(())
}

fn print_parts(assembly: &ExamAssembly) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Part", "Questions", "Target", "Pass mark"]);
    for part in assembly.parts() {
        table.add_row(vec![
            Cell::new(&part.title),
            Cell::new(part.questions.len()),
            Cell::new(part.target_size),
            Cell::new(format!("{:.0}%", part.pass_threshold)),
        ]);
    }

    println!(
        "Exam {}: {} questions, advisory time limit {}h",
        assembly.exam_id, assembly.total_questions, assembly.time_limit_hours
    );
    println!("{table}");
}

fn print_questions(assembly: &ExamAssembly, count: usize) {
    for part in assembly.parts() {
        println!("\n{}", part.title);
        for question in part.questions.iter().take(count) {
            println!("  {}: {}", question.id, question.question.question);
            for (label, text) in question.question.options.entries() {
                println!("      {label} - {text}");
            }
        }
        if part.questions.len() > count {
            println!("  ... and {} more", part.questions.len() - count);
        }
    }
}

fn print_scores(scores: &ExamScores) {
    use comfy_table::{Cell, Table};

    let verdict = |passed: bool| if passed { "pass" } else { "fail" };

    let mut table = Table::new();
    table.set_header(vec!["Part", "Correct", "Total", "Score", "Result"]);
    for (name, count, passed) in [
        ("Part 1", scores.part1, scores.part1_passed),
        ("Part 2", scores.part2, scores.part2_passed),
        ("Overall", scores.overall, scores.overall_passed),
    ] {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(count.correct),
            Cell::new(count.total),
            Cell::new(format!("{:.1}%", count.percentage())),
            Cell::new(verdict(passed)),
        ]);
    }

    println!("\n{table}");
    println!(
        "Performance: {}",
        PerformanceLevel::from_percentage(scores.overall.percentage())
    );
}
