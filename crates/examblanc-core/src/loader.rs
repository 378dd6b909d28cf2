//! Catalogue loading with a read-once session cache.
//!
//! Catalogues are static content, versioned by re-running the corpus
//! builder. [`CorpusLibrary::load`] reads both files exactly once and keeps
//! the outcome for the rest of the session; nothing in the API triggers a
//! second disk read.

use std::io::ErrorKind;
use std::path::Path;

use crate::catalog::Catalog;
use crate::error::CorpusError;

/// Both catalogues as loaded at session start. A missing exam catalogue
/// only disables mock exams; a missing practice catalogue makes the
/// practice views unavailable. Neither is fatal to the session.
#[derive(Debug)]
pub struct CorpusLibrary {
    practice: Result<Catalog, CorpusError>,
    exam: Result<Catalog, CorpusError>,
}

impl CorpusLibrary {
    /// Reads both catalogues from disk. This is the only disk access the
    /// library ever performs.
    pub fn load(practice_path: &Path, exam_path: &Path) -> Self {
        let practice = read_catalog(practice_path);
        if let Err(err) = &practice {
            tracing::warn!("practice catalogue unavailable: {err}");
        }

        let exam = read_catalog(exam_path);
        if let Err(err) = &exam {
            if err.is_unavailable() {
                tracing::info!("no exam catalogue at {}, mock exams disabled", exam_path.display());
            } else {
                tracing::warn!("exam catalogue unusable: {err}");
            }
        }

        Self { practice, exam }
    }

    pub fn practice(&self) -> Result<&Catalog, CorpusError> {
        self.practice.as_ref().map_err(Clone::clone)
    }

    pub fn exam(&self) -> Result<&Catalog, CorpusError> {
        self.exam.as_ref().map_err(Clone::clone)
    }

    pub fn has_exam(&self) -> bool {
        self.exam.is_ok()
    }
}

/// Reads one catalogue file, classifying failures so callers can tell a
/// missing file from a damaged one.
pub fn read_catalog(path: &Path) -> Result<Catalog, CorpusError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(CorpusError::NotFound(path.display().to_string()));
        }
        Err(err) => {
            return Err(CorpusError::Unreadable {
                path: path.display().to_string(),
                message: err.to_string(),
            });
        }
    };

    serde_json::from_str(&content).map_err(|err| CorpusError::Malformed {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}
