//! Append-only checkpoint log for resumable runs.
//!
//! One fingerprint per line in a plain text file. The whole log is loaded
//! at run start; `append` is synchronously durable before the pipeline moves
//! on, so a crash after a successful append can never lose the record.
//! Deleting the file is the operator's way to force a full re-run.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from the checkpoint log. Any of these is fatal to a run:
/// continuing without durable resume state risks silent reprocessing.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// File system error reading or appending the log.
    #[error("checkpoint IO error at {path}: {source}")]
    Io {
        /// The log path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl CheckpointError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Durable record of successfully archived fingerprints.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    seen: HashSet<String>,
}

impl CheckpointStore {
    /// Loads the log at `path`, or starts empty when the file is absent.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError`] when the file exists but cannot be read.
    #[instrument(fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, CheckpointError> {
        let seen = match File::open(path) {
            Ok(file) => BufReader::new(file)
                .lines()
                .collect::<Result<HashSet<_>, _>>()
                .map_err(|e| CheckpointError::io(path, e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(CheckpointError::io(path, e)),
        };
        debug!(recorded = seen.len(), "checkpoint log loaded");
        Ok(Self {
            path: path.to_path_buf(),
            seen,
        })
    }

    /// Whether `fingerprint` was already archived.
    #[must_use]
    pub fn contains(&self, fingerprint: &str) -> bool {
        self.seen.contains(fingerprint)
    }

    /// Number of recorded fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether the log holds no fingerprints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Records `fingerprint`, flushing and syncing before returning.
    ///
    /// Callers must persist the archived document *first*; the
    /// persist-then-append order is what guarantees a crash leaves the item
    /// pending rather than silently dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError`] when the log cannot be appended or synced.
    #[instrument(skip(self))]
    pub fn append(&mut self, fingerprint: &str) -> Result<(), CheckpointError> {
        if self.seen.contains(fingerprint) {
            return Ok(());
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CheckpointError::io(&self.path, e))?;
        writeln!(file, "{fingerprint}").map_err(|e| CheckpointError::io(&self.path, e))?;
        file.sync_all().map_err(|e| CheckpointError::io(&self.path, e))?;

        self.seen.insert(fingerprint.to_string());
        Ok(())
    }
}
