//! Core error types.
//!
//! Three failure families: fatal corpus-build errors, catalogue availability
//! errors at runtime, and progress-persistence errors. Validation findings
//! during a build are not errors — they are collected as
//! [`crate::parser::ValidationIssue`] lists and the build continues under
//! explicit confirmation.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures during an offline corpus build. Any of these halts the
/// build step.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The source text file could not be read at all.
    #[error("cannot read source file {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parsing found no theme blocks or question entries.
    #[error("no questions detected in {path}; check the source file format")]
    EmptyCorpus { path: PathBuf },

    /// The catalogue could not be written.
    #[error("cannot write catalogue {path}: {source}")]
    OutputFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Catalogue availability errors at runtime.
///
/// Cloneable on purpose: the loader caches one read per catalogue per
/// session and hands the same outcome to every caller.
#[derive(Debug, Clone, Error)]
pub enum CorpusError {
    /// The catalogue file does not exist. Feature-level degradation, not a
    /// crash: the practice view aborts without its catalogue, the mock-exam
    /// view reports "unavailable" without its one.
    #[error("catalogue file not found: {0}")]
    NotFound(String),

    /// The catalogue file exists but could not be read.
    #[error("cannot read catalogue {path}: {message}")]
    Unreadable { path: String, message: String },

    /// The catalogue file is not valid JSON for the expected schema.
    #[error("catalogue {path} is malformed: {message}")]
    Malformed { path: String, message: String },

    /// The exam catalogue lacks one of the two fixed theme banks.
    #[error("exam catalogue has no '{0}' theme bank")]
    MissingThemeBank(String),
}

impl CorpusError {
    /// Returns `true` for plain absence, the condition callers may degrade
    /// on instead of aborting.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CorpusError::NotFound(_))
    }
}

/// Progress persistence failures. Loading never produces these — the store
/// falls back to the backup and then to a default snapshot. Saving reports
/// them to the caller and leaves the previously backed-up file intact.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot create checkpoint directory {path}: {source}")]
    DirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write progress file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize progress snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_is_only_not_found() {
        assert!(CorpusError::NotFound("x.json".into()).is_unavailable());
        assert!(!CorpusError::Malformed {
            path: "x.json".into(),
            message: "bad".into()
        }
        .is_unavailable());
        assert!(!CorpusError::MissingThemeBank("Connaissances techniques".into())
            .is_unavailable());
    }
}
