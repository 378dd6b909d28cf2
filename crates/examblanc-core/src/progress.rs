//! Durable progress persistence with backup and recovery.
//!
//! The store owns one directory. Every save first rotates the current
//! primary file to the backup path, then writes a full fresh snapshot, so a
//! torn write can only ever damage the newest copy. Loading walks primary,
//! then backup, then falls back to an empty snapshot; it never fails.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::AnswerMap;

pub const SNAPSHOT_VERSION: &str = "1.0";
pub const PRIMARY_FILE: &str = "user_progress.json";
pub const BACKUP_FILE: &str = "user_progress_backup.json";

const RESET_ARCHIVE_PREFIX: &str = "progress_before_reset_";

/// The persisted form of a session's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub user_answers: AnswerMap,
    pub last_updated: DateTime<Utc>,
    pub version: String,
    #[serde(default)]
    pub statistics: ProgressStatistics,
}

impl ProgressSnapshot {
    /// An empty snapshot for first runs and unrecoverable files.
    pub fn fresh() -> Self {
        Self {
            user_answers: AnswerMap::new(),
            last_updated: Utc::now(),
            version: SNAPSHOT_VERSION.to_string(),
            statistics: ProgressStatistics::default(),
        }
    }

    /// Snapshots the given answers with freshly derived statistics.
    pub fn capture(answers: &AnswerMap, session_count: u32) -> Self {
        Self {
            user_answers: answers.clone(),
            last_updated: Utc::now(),
            version: SNAPSHOT_VERSION.to_string(),
            statistics: ProgressStatistics::compute(answers, session_count),
        }
    }
}

/// Derived summary stored alongside the answers. Recomputed on every save,
/// informational only; the answer map is the single source of truth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressStatistics {
    #[serde(default)]
    pub total_questions_answered: usize,
    #[serde(default)]
    pub total_sessions: u32,
    #[serde(default)]
    pub last_session: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modules_with_progress: Vec<String>,
    #[serde(default)]
    pub exam_blanc_questions_answered: usize,
}

impl ProgressStatistics {
    pub fn compute(answers: &AnswerMap, session_count: u32) -> Self {
        let contexts: BTreeSet<&str> = answers
            .keys()
            .filter_map(|key| key.split_once('_').map(|(context, _)| context))
            .collect();
        let exam_answers = answers.keys().filter(|k| k.starts_with("exam")).count();

        Self {
            total_questions_answered: answers.len(),
            total_sessions: session_count,
            last_session: Some(Utc::now()),
            modules_with_progress: contexts.into_iter().map(String::from).collect(),
            exam_blanc_questions_answered: exam_answers,
        }
    }
}

/// File-backed progress store rooted at a checkpoint directory.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    dir: PathBuf,
}

impl ProgressStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn primary_path(&self) -> PathBuf {
        self.dir.join(PRIMARY_FILE)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.dir.join(BACKUP_FILE)
    }

    /// Loads the most recent usable snapshot. Falls back from the primary
    /// file to the backup, then to an empty snapshot; never fails.
    pub fn load(&self) -> ProgressSnapshot {
        match read_snapshot(&self.primary_path()) {
            Ok(snapshot) => snapshot,
            Err(primary_err) => {
                tracing::warn!("primary progress file unusable ({primary_err:#}), trying backup");
                match read_snapshot(&self.backup_path()) {
                    Ok(snapshot) => snapshot,
                    Err(backup_err) => {
                        tracing::warn!(
                            "backup progress file unusable ({backup_err:#}), starting fresh"
                        );
                        ProgressSnapshot::fresh()
                    }
                }
            }
        }
    }

    /// Writes a snapshot, rotating the existing primary file to the backup
    /// path first. A failed rotation is logged but does not abort the save.
    pub fn save(&self, snapshot: &ProgressSnapshot) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::DirectoryFailed {
            path: self.dir.clone(),
            source,
        })?;

        let primary = self.primary_path();
        if primary.exists() {
            if let Err(err) = fs::rename(&primary, self.backup_path()) {
                tracing::warn!("could not rotate progress backup: {err}");
            }
        }

        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&primary, json).map_err(|source| StoreError::WriteFailed {
            path: primary.clone(),
            source,
        })?;

        tracing::debug!(
            "progress saved: {} answers",
            snapshot.user_answers.len()
        );
        Ok(())
    }

    /// Moves the current primary file to a timestamped archive that later
    /// resets never overwrite. Returns the archive path, or `None` when
    /// there was nothing to archive.
    pub fn archive_primary(&self) -> Result<Option<PathBuf>, StoreError> {
        let primary = self.primary_path();
        if !primary.exists() {
            return Ok(None);
        }

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let mut archive = self.dir.join(format!("{RESET_ARCHIVE_PREFIX}{stamp}.json"));
        let mut attempt = 1;
        while archive.exists() {
            attempt += 1;
            archive = self
                .dir
                .join(format!("{RESET_ARCHIVE_PREFIX}{stamp}_{attempt}.json"));
        }

        fs::rename(&primary, &archive).map_err(|source| StoreError::WriteFailed {
            path: archive.clone(),
            source,
        })?;
        tracing::info!("progress archived to {}", archive.display());
        Ok(Some(archive))
    }
}

/// Required keys are enforced by the typed parse: a file missing
/// `user_answers`, `last_updated`, or `version` is rejected here and the
/// caller falls through to the next source.
fn read_snapshot(path: &Path) -> anyhow::Result<ProgressSnapshot> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid progress snapshot in {}", path.display()))
}
