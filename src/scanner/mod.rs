//! Review folder discovery and loading.
//!
//! The loader enumerates the review documents directly inside a folder,
//! extracts each one and collects per-document failures without aborting
//! the batch.

pub mod extractor;

use crate::error::{NoDataReason, ReviewError};
use crate::models::LoadedFolder;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use extractor::parse_review_document;

/// Extension of review documents, compared case-insensitively.
pub const REVIEW_EXTENSION: &str = "xml";

/// A candidate review document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Absolute or caller-relative path to the document.
    pub path: PathBuf,
    /// File name, used in error messages and as a fallback reviewer identity.
    pub name: String,
}

/// Loads every review document in one folder.
pub struct FolderLoader {
    folder: PathBuf,
}

impl FolderLoader {
    /// Create a loader for `folder`. Nothing is read until [`scan`](Self::scan)
    /// or [`load`](Self::load).
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    /// List candidate documents, sorted by file name.
    ///
    /// Only regular files directly inside the folder are considered.
    pub fn scan(&self) -> Result<Vec<ScannedFile>, ReviewError> {
        if !self.folder.is_dir() {
            return Err(ReviewError::NotFound {
                path: self.folder.clone(),
            });
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.folder)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Skipping unreadable entry in {}: {}", self.folder.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !is_review_document(entry.path()) {
                continue;
            }

            files.push(ScannedFile {
                path: entry.path().to_path_buf(),
                name: entry.file_name().to_string_lossy().into_owned(),
            });
        }

        Ok(files)
    }

    /// Scan the folder and extract every candidate document.
    pub fn load(&self) -> Result<LoadedFolder, ReviewError> {
        let files = self.scan()?;
        if files.is_empty() {
            return Err(NoDataReason::NoDocuments {
                path: self.folder.clone(),
            }
            .into());
        }

        let mut records = Vec::with_capacity(files.len());
        let mut parse_errors = Vec::new();

        for file in &files {
            match parse_review_document(&file.path) {
                Ok(record) => {
                    debug!("Parsed {}", file.name);
                    records.push(record);
                }
                Err(e) => {
                    warn!("Skipping {}", e);
                    parse_errors.push(e.to_string());
                }
            }
        }

        if records.is_empty() {
            return Err(NoDataReason::NoneParsed {
                path: self.folder.clone(),
                attempted: files.len(),
            }
            .into());
        }

        info!(
            "Loaded {} of {} review documents from {}",
            records.len(),
            files.len(),
            self.folder.display()
        );

        Ok(LoadedFolder {
            parsed_files: records.len(),
            candidate_files: files.len(),
            records,
            parse_errors,
        })
    }
}

/// Check whether a path has the review document extension.
pub fn is_review_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(REVIEW_EXTENSION))
}

/// Load all review documents in `folder`.
pub fn load_folder(folder: &Path) -> Result<LoadedFolder, ReviewError> {
    FolderLoader::new(folder).load()
}
