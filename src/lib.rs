//! Archiver core library.
//!
//! This library re-fetches articles enumerated by a captured browser session
//! against the WeChat Official Account platform, enriches each article with
//! its featured comments, and persists self-contained HTML documents with
//! resumable checkpointing.
//!
//! # Architecture
//!
//! - [`auth`] - Captured-request parsing and credential extraction
//! - [`source`] - Fiddler export parsing into an ordered article stream
//! - [`fetch`] - Authenticated HTTP session and comment request building
//! - [`pipeline`] - The fetch → enrich → persist → checkpoint loop
//! - [`checkpoint`] - Append-only fingerprint log for resume
//! - [`config`] - On-disk configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod checkpoint;
pub mod config;
pub mod fetch;
pub mod pipeline;
pub mod source;

// Re-export commonly used types
pub use auth::{CapturedRequest, CredentialSet, RequestParseError, base_params, extract_credentials};
pub use checkpoint::{CheckpointError, CheckpointStore};
pub use config::{Config, ConfigError};
pub use fetch::{CommentEntry, FetchError, HttpClient, build_comment_query};
pub use pipeline::{Pipeline, PipelineError, PipelineOptions, RunStats};
pub use source::{Article, SourceError, load_articles};
