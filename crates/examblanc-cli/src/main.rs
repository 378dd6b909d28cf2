//! examblanc CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "examblanc", version, about = "AMF-style exam training toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a JSON catalogue from a raw corpus file
    Build {
        /// Path to the raw corpus text
        #[arg(long)]
        source: PathBuf,

        /// Corpus kind: practice, exam
        #[arg(long, default_value = "practice")]
        kind: String,

        /// Output path (defaults to the configured catalogue location)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Build even when validation reports issues
        #[arg(long)]
        force: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a raw corpus file or the built catalogues
    Validate {
        /// Path to a raw corpus text (omit to check the built catalogues)
        #[arg(long)]
        source: Option<PathBuf>,

        /// Corpus kind: practice, exam
        #[arg(long, default_value = "practice")]
        kind: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Assemble a mock exam, and optionally score recorded answers
    Mock {
        /// Exam id, which is also the sampling seed
        #[arg(long, default_value = "1")]
        exam_id: u64,

        /// Print the first N questions of each part
        #[arg(long, default_value = "0")]
        questions: usize,

        /// Score the exam against saved progress
        #[arg(long)]
        score: bool,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show saved progress, or reset parts of it
    Progress {
        /// Clear answers for one practice module
        #[arg(long)]
        reset_module: Option<u32>,

        /// Clear answers for one exam id
        #[arg(long)]
        reset_exam: Option<u32>,

        /// Archive and clear all progress
        #[arg(long)]
        reset_all: bool,

        /// Confirm a reset without prompting
        #[arg(long)]
        yes: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and sample corpus sources
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("examblanc=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build {
            source,
            kind,
            output,
            force,
            config,
        } => commands::build::execute(source, kind, output, force, config),
        Commands::Validate {
            source,
            kind,
            config,
        } => commands::validate::execute(source, kind, config),
        Commands::Mock {
            exam_id,
            questions,
            score,
            format,
            config,
        } => commands::mock::execute(exam_id, questions, score, format, config),
        Commands::Progress {
            reset_module,
            reset_exam,
            reset_all,
            yes,
            config,
        } => commands::progress::execute(reset_module, reset_exam, reset_all, yes, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
