//! examblanc-core — corpus ingestion, exam assembly, scoring, and progress.
//!
//! This crate holds the data model and the engine behind the trainer: the
//! corpus builder and catalogue loader, the seeded mock-exam assembler, the
//! scoring functions, and the file-backed progress store that carries a
//! user's answers across sessions.

pub mod catalog;
pub mod config;
pub mod dedup;
pub mod error;
pub mod exam;
pub mod loader;
pub mod model;
pub mod parser;
pub mod progress;
pub mod scoring;
pub mod session;
