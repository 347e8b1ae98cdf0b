//! History store: the whole persisted state of CulturIA is one JSON array,
//! most recent day first, read once at startup and rewritten once per run.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::trivia::DayRecord;

/// Number of past questions fed back into the prompt for anti-repetition.
pub const MAX_CONTEXT_QUESTIONS: usize = 60;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("History file {path} is not a valid history: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Loads the history from `path`. A missing file is an empty history.
pub fn load_history(path: &Path) -> Result<Vec<DayRecord>, StorageError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("No history at {}, starting from scratch", path.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Overwrites `path` with the full history.
///
/// The JSON goes to a temp file in the same directory which is then renamed
/// over the target, so a failed write never leaves a truncated history behind.
pub fn save_history(path: &Path, history: &[DayRecord]) -> Result<(), StorageError> {
    let io_err = |source: io::Error| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    serde_json::to_writer_pretty(&mut tmp, history)?;
    tmp.write_all(b"\n").map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;

    // NamedTempFile is created 0600; keep whatever mode readers of the old file relied on
    match std::fs::metadata(path) {
        Ok(existing) => tmp
            .as_file()
            .set_permissions(existing.permissions())
            .map_err(io_err)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(e)),
    }

    tmp.persist(path).map_err(|e| io_err(e.error))?;

    debug!("Wrote {} days to {}", history.len(), path.display());
    Ok(())
}

/// Flattens question texts, most recent day first and in-day order within a
/// day, stopping at `max`.
pub fn previous_questions(history: &[DayRecord], max: usize) -> Vec<String> {
    history
        .iter()
        .flat_map(|day| day.questions.iter())
        .take(max)
        .map(|q| q.text.clone())
        .collect()
}
