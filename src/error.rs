//! Error taxonomy for loading and parsing review folders.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading or parsing review documents.
///
/// `Parse` is recovered per document by the folder loader; `NotFound` and
/// `NoData` end the run and are surfaced to the caller.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Invalid review document {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("Folder not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error(transparent)]
    NoData(#[from] NoDataReason),
}

/// Why a folder produced no review records.
#[derive(Debug, Error)]
pub enum NoDataReason {
    #[error("No XML files found in folder: {}", .path.display())]
    NoDocuments { path: PathBuf },

    #[error("No valid review XML files could be parsed in {} ({} attempted)", .path.display(), .attempted)]
    NoneParsed { path: PathBuf, attempted: usize },
}

impl ReviewError {
    pub fn parse(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            reason: reason.into(),
        }
    }
}
