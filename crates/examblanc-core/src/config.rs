//! Application configuration.
//!
//! Everything has a default; a config file only needs the keys it wants to
//! change. Catalogue locations are split into a data directory plus file
//! names so one setting relocates both catalogues.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::session::AutosavePolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Directory holding the built catalogues.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_practice_catalogue")]
    pub practice_catalogue: String,
    #[serde(default = "default_exam_catalogue")]
    pub exam_catalogue: String,
    /// Directory for progress files, backups, and reset archives.
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,
    #[serde(default = "default_autosave_answer_threshold")]
    pub autosave_answer_threshold: usize,
    #[serde(default = "default_autosave_interval_secs")]
    pub autosave_interval_secs: u64,
    /// Number of exam slots shown on the dashboard.
    #[serde(default = "default_exam_slot_count")]
    pub exam_slot_count: u32,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_practice_catalogue() -> String {
    "questions.json".to_string()
}

fn default_exam_catalogue() -> String {
    "exam_questions.json".to_string()
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("checkpoint")
}

fn default_autosave_answer_threshold() -> usize {
    5
}

fn default_autosave_interval_secs() -> u64 {
    300
}

fn default_exam_slot_count() -> u32 {
    10
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            practice_catalogue: default_practice_catalogue(),
            exam_catalogue: default_exam_catalogue(),
            checkpoint_dir: default_checkpoint_dir(),
            autosave_answer_threshold: default_autosave_answer_threshold(),
            autosave_interval_secs: default_autosave_interval_secs(),
            exam_slot_count: default_exam_slot_count(),
        }
    }
}

impl TrainerConfig {
    pub fn practice_path(&self) -> PathBuf {
        self.data_dir.join(&self.practice_catalogue)
    }

    pub fn exam_path(&self) -> PathBuf {
        self.data_dir.join(&self.exam_catalogue)
    }

    pub fn autosave_policy(&self) -> AutosavePolicy {
        AutosavePolicy {
            answer_threshold: self.autosave_answer_threshold,
            max_interval: Duration::from_secs(self.autosave_interval_secs),
        }
    }
}

/// Loads configuration. An explicitly given path must exist; otherwise the
/// search is `./examblanc.toml`, then `~/.config/examblanc/config.toml`,
/// then built-in defaults. `EXAMBLANC_DATA_DIR` and
/// `EXAMBLANC_CHECKPOINT_DIR` override the directories afterwards.
pub fn load_config(explicit: Option<&Path>) -> Result<TrainerConfig> {
    let mut config = match config_file(explicit)? {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            let parsed = toml::from_str(&content)
                .with_context(|| format!("invalid config file {}", path.display()))?;
            tracing::debug!("configuration loaded from {}", path.display());
            parsed
        }
        None => TrainerConfig::default(),
    };

    if let Ok(dir) = std::env::var("EXAMBLANC_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("EXAMBLANC_CHECKPOINT_DIR") {
        config.checkpoint_dir = PathBuf::from(dir);
    }

    Ok(config)
}

fn config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("config file {} does not exist", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = Path::new("examblanc.toml");
    if local.exists() {
        return Ok(Some(local.to_path_buf()));
    }

    if let Some(home) = std::env::var_os("HOME") {
        let user = Path::new(&home)
            .join(".config")
            .join("examblanc")
            .join("config.toml");
        if user.exists() {
            return Ok(Some(user));
        }
    }

    Ok(None)
}
