//! On-disk configuration.
//!
//! A single `config.json` next to the capture exports drives a run. Every
//! field has a default so a minimal file (or none at all, with CLI
//! overrides) still works.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::fetch::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS};

/// Upstream origin the captured cookies belong to.
pub const DEFAULT_COOKIE_ORIGIN: &str = "https://mp.weixin.qq.com";

/// The comment retrieval endpoint.
pub const DEFAULT_COMMENT_ENDPOINT: &str = "https://mp.weixin.qq.com/mp/appmsg_comment";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File system error reading the config file.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// The config path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for the expected schema.
    #[error("invalid config {path}: {source}")]
    Invalid {
        /// The config path.
        path: PathBuf,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

/// Run configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the capture exports and the raw request file.
    pub input_dir: PathBuf,
    /// Directory receiving archived documents and the checkpoint log.
    pub output_dir: PathBuf,
    /// Filename of the raw captured request inside `input_dir`.
    pub raw_request: String,
    /// Comment endpoint URL; overridable for testing against a mock.
    pub comment_endpoint: String,
    /// Origin the captured cookies are replayed against.
    pub cookie_origin: String,
    /// Skip secondary articles that carry an origin link (promotional
    /// heuristic). Policy, not law - disable to archive everything.
    pub skip_promoted: bool,
    /// Upper bound of the randomized inter-article delay; 0 disables.
    pub max_delay_ms: u64,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            raw_request: "raw_request.txt".to_string(),
            comment_endpoint: DEFAULT_COMMENT_ENDPOINT.to_string(),
            cookie_origin: DEFAULT_COOKIE_ORIGIN.to_string(),
            skip_promoted: true,
            max_delay_ms: 5000,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or decoded.
    /// A missing file is *not* an error - defaults apply.
    #[instrument(fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };
        serde_json::from_str(&content).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Path to the raw captured request file.
    #[must_use]
    pub fn raw_request_path(&self) -> PathBuf {
        self.input_dir.join(&self.raw_request)
    }

    /// Path to the checkpoint log inside the output directory.
    #[must_use]
    pub fn checkpoint_path(&self) -> PathBuf {
        self.output_dir.join("record.txt")
    }
}
