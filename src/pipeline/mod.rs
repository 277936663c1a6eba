//! The fetch → enrich → persist → checkpoint loop.
//!
//! Sequential by design: one article at a time, every network call blocking
//! the single logical thread, a randomized politeness delay between
//! articles. Failures are isolated at article granularity - a failed fetch
//! or transform leaves no checkpoint and the run moves on, so the next
//! invocation retries exactly the unfinished articles. Only checkpoint
//! durability failures terminate the run.

mod filename;
mod render;
mod transform;

pub use filename::{output_filename, sanitize_title};
pub use render::render_comment_block;
pub use transform::{
    ImageRef, append_to_primary_region, apply_inline_images, collect_image_refs, encode_data_uri,
    stamp_publish_time, strip_scripts,
};

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::auth::{CredentialSet, extract_credentials};
use crate::checkpoint::{CheckpointError, CheckpointStore};
use crate::fetch::{CommentEntry, CommentResponse, FetchError, HttpClient, build_comment_query};
use crate::source::Article;

/// Errors that terminate a whole run.
///
/// Per-article failures never surface here; they are logged and counted.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The checkpoint log could not be read or durably appended.
    /// Continuing would risk silent reprocessing or silent loss of resume
    /// state, so the run stops.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        /// The directory path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Per-article failure; recoverable at the run level.
#[derive(Debug, Error)]
enum ItemError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Articles fetched, transformed, persisted, and checkpointed.
    pub archived: usize,
    /// Articles skipped: no fetch target, already recorded, or promotional.
    pub skipped: usize,
    /// Articles that failed and remain pending for the next run.
    pub failed: usize,
}

impl RunStats {
    /// Total articles considered.
    #[must_use]
    pub fn total(&self) -> usize {
        self.archived + self.skipped + self.failed
    }
}

/// Tuning knobs for a run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Directory receiving archived documents.
    pub output_dir: PathBuf,
    /// The comment endpoint URL.
    pub comment_endpoint: String,
    /// Skip secondary articles carrying an origin link.
    pub skip_promoted: bool,
    /// Upper bound of the randomized inter-article delay; 0 disables.
    pub max_delay_ms: u64,
}

/// The fetch-enrich pipeline.
///
/// Owns the authenticated session and base credentials for the duration of
/// a run; the checkpoint store is passed in per run with an explicit
/// lifecycle (load at start, append on success, no reload).
#[derive(Debug)]
pub struct Pipeline {
    client: HttpClient,
    base_params: HashMap<String, String>,
    options: PipelineOptions,
}

impl Pipeline {
    /// Creates a pipeline over an authenticated session.
    #[must_use]
    pub fn new(
        client: HttpClient,
        base_params: HashMap<String, String>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            client,
            base_params,
            options,
        }
    }

    /// Processes `articles` in order, consulting and updating `store`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] only for run-fatal conditions: output
    /// directory creation or checkpoint durability. Everything else is
    /// counted in the returned [`RunStats`].
    #[instrument(skip_all, fields(articles = articles.len()))]
    pub async fn run(
        &self,
        articles: &[Article],
        store: &mut CheckpointStore,
    ) -> Result<RunStats, PipelineError> {
        std::fs::create_dir_all(&self.options.output_dir).map_err(|e| {
            PipelineError::OutputDir {
                path: self.options.output_dir.clone(),
                source: e,
            }
        })?;

        let mut stats = RunStats::default();
        for article in articles {
            let fingerprint = article.fingerprint();

            if article.content_url.is_empty() {
                info!(%fingerprint, "no fetch target, skipping");
                stats.skipped += 1;
                continue;
            }
            if store.contains(&fingerprint) {
                info!(%fingerprint, "already archived, skipping");
                stats.skipped += 1;
                continue;
            }
            // Secondary items with an external origin link are conventionally
            // advertisements, not authored content.
            if self.options.skip_promoted
                && article.index > 0
                && !article.source_url.trim().is_empty()
            {
                info!(%fingerprint, index = article.index, "promotional item, skipping");
                stats.skipped += 1;
                continue;
            }

            match self.archive_article(article).await {
                Ok(path) => {
                    // Persist-then-append: a crash in between leaves the
                    // article pending so the next run retries it.
                    store.append(&fingerprint)?;
                    info!(%fingerprint, path = %path.display(), "archived");
                    stats.archived += 1;
                }
                Err(error) => {
                    warn!(%fingerprint, %error, "archiving failed, will retry next run");
                    stats.failed += 1;
                }
            }

            self.politeness_delay().await;
        }

        Ok(stats)
    }

    /// Fetches, enriches, transforms, and persists one article.
    #[instrument(skip(self), fields(fingerprint = %article.fingerprint()))]
    async fn archive_article(&self, article: &Article) -> Result<PathBuf, ItemError> {
        let body = self.client.get_text(&article.content_url).await?;

        // Tokens for the derived comment call live in the fetched body.
        let credentials = extract_credentials(&body);
        let comments = self.fetch_comments(article, &credentials).await?;
        debug!(comments = comments.len(), "featured comments retrieved");

        let body = strip_scripts(&body);
        let body = self.inline_images(body).await?;
        let body = stamp_publish_time(&body, &article.timestamp);
        let body = if comments.is_empty() {
            body
        } else {
            append_to_primary_region(&body, &render_comment_block(&comments))
        };

        let path = self.options.output_dir.join(output_filename(article));
        tokio::fs::write(&path, &body)
            .await
            .map_err(|e| ItemError::Io {
                path: path.clone(),
                source: e,
            })?;
        Ok(path)
    }

    /// Issues the derived comment request and decodes the featured entries.
    async fn fetch_comments(
        &self,
        article: &Article,
        credentials: &CredentialSet,
    ) -> Result<Vec<CommentEntry>, ItemError> {
        let params = build_comment_query(&self.base_params, article, credentials);
        let response: CommentResponse = self
            .client
            .get_json(&self.options.comment_endpoint, &params)
            .await?;
        Ok(response.into_entries())
    }

    /// Replaces every embedded image reference with inlined bytes.
    ///
    /// Guarantees the archived document has zero external dependencies; an
    /// image that fails to fetch fails the article.
    async fn inline_images(&self, body: String) -> Result<String, ItemError> {
        let refs = collect_image_refs(&body);
        if refs.is_empty() {
            return Ok(body);
        }

        let mut inlined = Vec::with_capacity(refs.len());
        for image in refs {
            let bytes = self.client.get_bytes(&image.url).await?;
            let data_uri = encode_data_uri(&image.image_type, &bytes);
            inlined.push((image, data_uri));
        }
        Ok(apply_inline_images(&body, &inlined))
    }

    /// Randomized delay between articles; politeness, not correctness.
    async fn politeness_delay(&self) {
        if self.options.max_delay_ms == 0 {
            return;
        }
        let wait = rand::thread_rng().gen_range(0..=self.options.max_delay_ms);
        debug!(wait_ms = wait, "politeness delay");
        tokio::time::sleep(Duration::from_millis(wait)).await;
    }
}
