//! Article descriptors produced by the export listing parser.

use chrono::{DateTime, Utc};

/// One archivable article, headline or secondary within a push.
///
/// Constructed by the export parser with metadata only; the pipeline fills
/// nothing in place - fetched bodies flow through staged transforms instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Source-assigned message id, shared by all articles of one push.
    pub id: u64,
    /// Publish time (unix seconds in the export, kept in UTC).
    pub timestamp: DateTime<Utc>,
    /// Article title.
    pub title: String,
    /// Author display name.
    pub author: String,
    /// Short summary shown in listings.
    pub digest: String,
    /// Cover image URL.
    pub cover_url: String,
    /// Fetch target for the article body; empty means nothing to archive.
    pub content_url: String,
    /// External origin link; mostly present on promotional secondary items.
    pub source_url: String,
    /// 0 = headline article of the push; secondary articles count up from 1.
    pub index: u32,
}

impl Article {
    /// Deterministic dedup/resume key: `<YYYYMMDD>-<title>`.
    ///
    /// Stable across runs for a fixed timestamp and title; the checkpoint
    /// log and the output filename are both derived from it.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        format!("{}-{}", self.timestamp.format("%Y%m%d"), self.title)
    }
}
