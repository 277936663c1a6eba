//! Article listing ingestion from Fiddler capture exports.
//!
//! The operator saves the responses of the history-listing endpoint while
//! scrolling through an account's article history. Two shapes land on disk:
//!
//! - the home page as `.html`/`.htm`, with the first screen's listing inside
//!   a `var msgList = '{...}'` script variable (entity-escaped JSON);
//! - each subsequent page as `.json`, with the listing nested inside a
//!   `general_msg_list` string field (JSON in JSON).
//!
//! Both shapes decode to the same message list. Only message type 49
//! (standard image-text push) is archivable; a push may bundle secondary
//! articles after the headline. The resulting stream is URL-unescaped,
//! sorted most-recent-first, and deduplicated by fingerprint.

mod item;

pub use item::Article;

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Message type for standard image-text pushes; everything else is skipped.
const ARCHIVABLE_MSG_TYPE: i64 = 49;

#[allow(clippy::expect_used)]
static MSG_LIST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*var +msgList *= *['"](\{[^\n]+\})['"] *; *$"#)
        .expect("msgList regex is valid") // Static pattern, safe to panic
});

/// Errors that can occur while loading export listings.
#[derive(Debug, Error)]
pub enum SourceError {
    /// File system error reading the input directory or a listing file.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A listing file did not decode into a message list.
    #[error("malformed listing {path}: {reason}")]
    Malformed {
        /// The offending file.
        path: PathBuf,
        /// What failed to decode.
        reason: String,
    },
}

impl SourceError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

// Export schema. Every field defaults: captures are frequently incomplete
// and a missing attribute must not fail the whole listing.

#[derive(Debug, Deserialize)]
struct MsgList {
    #[serde(default)]
    list: Vec<ExportMsg>,
}

#[derive(Debug, Deserialize)]
struct ExportMsg {
    #[serde(default)]
    comm_msg_info: CommMsgInfo,
    #[serde(default)]
    app_msg_ext_info: Option<AppMsgExtInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct CommMsgInfo {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    datetime: i64,
    #[serde(default, rename = "type")]
    msg_type: i64,
}

#[derive(Debug, Default, Deserialize)]
struct AppMsgExtInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    digest: String,
    #[serde(default)]
    cover: String,
    #[serde(default)]
    content_url: String,
    #[serde(default)]
    source_url: String,
    #[serde(default)]
    is_multi: i64,
    #[serde(default)]
    multi_app_msg_item_list: Vec<SubMsg>,
}

#[derive(Debug, Default, Deserialize)]
struct SubMsg {
    #[serde(default)]
    title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    digest: String,
    #[serde(default)]
    cover: String,
    #[serde(default)]
    content_url: String,
    #[serde(default)]
    source_url: String,
}

#[derive(Debug, Deserialize)]
struct PagedExport {
    #[serde(default)]
    general_msg_list: String,
}

/// Loads every export listing under `input_dir` into an ordered article list.
///
/// Files are visited in name order for reproducibility; unknown extensions
/// are ignored. The result is sorted by timestamp descending and
/// deduplicated by fingerprint (first occurrence wins).
///
/// # Errors
///
/// Returns [`SourceError`] when the directory cannot be read or a listing
/// file is present but undecodable. Malformed listings are an operator
/// problem and are not recovered here.
#[instrument(skip_all, fields(dir = %input_dir.display()))]
pub fn load_articles(input_dir: &Path) -> Result<Vec<Article>, SourceError> {
    let mut filenames: Vec<PathBuf> = std::fs::read_dir(input_dir)
        .map_err(|e| SourceError::io(input_dir, e))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect();
    filenames.sort();

    let mut articles = Vec::new();
    for path in filenames {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !matches!(ext.as_str(), "html" | "htm" | "json") {
            continue;
        }

        let content = std::fs::read_to_string(&path).map_err(|e| SourceError::io(&path, e))?;
        let msg_list = if ext == "json" {
            parse_paged_export(&path, &content)?
        } else {
            parse_home_export(&path, &content)?
        };

        let before = articles.len();
        collect_articles(&msg_list, &mut articles);
        debug!(
            file = %path.display(),
            articles = articles.len() - before,
            "parsed export listing"
        );
    }

    Ok(order_and_dedup(articles))
}

/// Extracts the listing from the home page HTML's `msgList` script variable.
fn parse_home_export(path: &Path, content: &str) -> Result<MsgList, SourceError> {
    let raw = MSG_LIST_PATTERN
        .captures(content)
        .and_then(|c| c.get(1))
        .ok_or_else(|| SourceError::malformed(path, "no msgList variable found"))?;
    // The embedded JSON carries &quot; &amp; etc. from the HTML context.
    let json = html_escape::decode_html_entities(raw.as_str());
    serde_json::from_str(&json)
        .map_err(|e| SourceError::malformed(path, format!("msgList JSON: {e}")))
}

/// Extracts the listing from a paging response's nested `general_msg_list`.
fn parse_paged_export(path: &Path, content: &str) -> Result<MsgList, SourceError> {
    let outer: PagedExport = serde_json::from_str(content)
        .map_err(|e| SourceError::malformed(path, format!("paging JSON: {e}")))?;
    if outer.general_msg_list.is_empty() {
        return Err(SourceError::malformed(path, "no general_msg_list field"));
    }
    serde_json::from_str(&outer.general_msg_list)
        .map_err(|e| SourceError::malformed(path, format!("general_msg_list JSON: {e}")))
}

fn collect_articles(msg_list: &MsgList, out: &mut Vec<Article>) {
    for msg in &msg_list.list {
        if msg.comm_msg_info.msg_type != ARCHIVABLE_MSG_TYPE {
            debug!(
                id = msg.comm_msg_info.id,
                msg_type = msg.comm_msg_info.msg_type,
                "skipping non-archivable message type"
            );
            continue;
        }
        let Some(info) = &msg.app_msg_ext_info else {
            warn!(id = msg.comm_msg_info.id, "type-49 message without article info");
            continue;
        };
        let timestamp = timestamp_from_secs(msg.comm_msg_info.datetime);

        out.push(Article {
            id: msg.comm_msg_info.id,
            timestamp,
            title: info.title.clone(),
            author: info.author.clone(),
            digest: info.digest.clone(),
            cover_url: unescape_url(&info.cover),
            content_url: unescape_url(&info.content_url),
            source_url: unescape_url(&info.source_url),
            index: 0,
        });

        if info.is_multi != 0 {
            for (offset, sub) in info.multi_app_msg_item_list.iter().enumerate() {
                let index = u32::try_from(offset + 1).unwrap_or(u32::MAX);
                out.push(Article {
                    id: msg.comm_msg_info.id,
                    timestamp,
                    title: sub.title.clone(),
                    author: sub.author.clone(),
                    digest: sub.digest.clone(),
                    cover_url: unescape_url(&sub.cover),
                    content_url: unescape_url(&sub.content_url),
                    source_url: unescape_url(&sub.source_url),
                    index,
                });
            }
        }
    }
}

fn order_and_dedup(mut articles: Vec<Article>) -> Vec<Article> {
    // Stable sort keeps secondary items behind their headline within a push.
    articles.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut seen = std::collections::HashSet::new();
    articles.retain(|article| seen.insert(article.fingerprint()));
    articles
}

fn timestamp_from_secs(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default()
}

/// Export URLs arrive entity-escaped and with `\/` for slashes.
fn unescape_url(url: &str) -> String {
    html_escape::decode_html_entities(url).replace("\\/", "/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn listing_json(entries: &str) -> String {
        format!(r#"{{"list": [{entries}]}}"#)
    }

    fn msg_entry(id: u64, datetime: i64, title: &str, content_url: &str) -> String {
        format!(
            r#"{{
                "comm_msg_info": {{"id": {id}, "datetime": {datetime}, "type": 49}},
                "app_msg_ext_info": {{
                    "title": "{title}",
                    "author": "a",
                    "digest": "d",
                    "cover": "http:\/\/img.example\/c.png",
                    "content_url": "{content_url}",
                    "source_url": "",
                    "is_multi": 0,
                    "multi_app_msg_item_list": []
                }}
            }}"#
        )
    }

    fn write_paged(dir: &TempDir, name: &str, inner: &str) {
        let outer =
            serde_json::json!({ "general_msg_list": inner, "ret": 0 });
        std::fs::write(dir.path().join(name), outer.to_string()).unwrap();
    }

    #[test]
    fn test_load_articles_from_paged_json() {
        let dir = TempDir::new().unwrap();
        let inner = listing_json(&msg_entry(
            7,
            1_614_592_800,
            "Example",
            "http:\\/\\/mp.example\\/s?mid=1&amp;idx=1",
        ));
        write_paged(&dir, "page1.json", &inner);

        let articles = load_articles(dir.path()).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Example");
        // URL unescaping: entities decoded, backslash-escaped slashes fixed
        assert_eq!(articles[0].content_url, "http://mp.example/s?mid=1&idx=1");
        assert_eq!(articles[0].index, 0);
    }

    #[test]
    fn test_load_articles_from_home_html() {
        let dir = TempDir::new().unwrap();
        // The msgList value sits on one line inside the page script.
        let entry = r#"{"comm_msg_info": {"id": 1, "datetime": 1600000000, "type": 49}, "app_msg_ext_info": {"title": "Home", "content_url": "http://x/y"}}"#;
        let listing = listing_json(entry).replace('"', "&quot;");
        let html = format!(
            "<html><script>\n    var msgList = '{listing}';\n</script></html>"
        );
        std::fs::write(dir.path().join("home.html"), html).unwrap();

        let articles = load_articles(dir.path()).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Home");
    }

    #[test]
    fn test_load_articles_sorted_descending_by_timestamp() {
        let dir = TempDir::new().unwrap();
        let entries = [
            msg_entry(1, 1_000_000_000, "Oldest", "http://x/1"),
            msg_entry(2, 1_200_000_000, "Newest", "http://x/2"),
            msg_entry(3, 1_100_000_000, "Middle", "http://x/3"),
        ]
        .join(",");
        write_paged(&dir, "page1.json", &listing_json(&entries));

        let articles = load_articles(dir.path()).unwrap();
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["Newest", "Middle", "Oldest"]);
    }

    #[test]
    fn test_load_articles_deduplicates_by_fingerprint() {
        let dir = TempDir::new().unwrap();
        let entry = msg_entry(1, 1_614_592_800, "Same", "http://x/1");
        write_paged(&dir, "a.json", &listing_json(&entry));
        write_paged(&dir, "b.json", &listing_json(&entry));

        let articles = load_articles(dir.path()).unwrap();
        assert_eq!(articles.len(), 1);
    }

    #[test]
    fn test_load_articles_skips_non_type_49() {
        let dir = TempDir::new().unwrap();
        let entry = r#"{"comm_msg_info": {"id": 5, "datetime": 1, "type": 1}}"#;
        write_paged(&dir, "page1.json", &listing_json(entry));

        let articles = load_articles(dir.path()).unwrap();
        assert!(articles.is_empty());
    }

    #[test]
    fn test_load_articles_expands_multi_push() {
        let dir = TempDir::new().unwrap();
        let entry = r#"{
            "comm_msg_info": {"id": 9, "datetime": 1600000000, "type": 49},
            "app_msg_ext_info": {
                "title": "Headline",
                "content_url": "http://x/0",
                "is_multi": 1,
                "multi_app_msg_item_list": [
                    {"title": "Second", "content_url": "http://x/1", "source_url": "http://ad.example"},
                    {"title": "Third", "content_url": "http://x/2"}
                ]
            }
        }"#;
        write_paged(&dir, "page1.json", &listing_json(entry));

        let articles = load_articles(dir.path()).unwrap();
        assert_eq!(articles.len(), 3);
        assert_eq!(articles[0].index, 0);
        assert_eq!(articles[1].index, 1);
        assert_eq!(articles[1].source_url, "http://ad.example");
        assert_eq!(articles[2].index, 2);
        // Same push id everywhere
        assert!(articles.iter().all(|a| a.id == 9));
    }

    #[test]
    fn test_load_articles_malformed_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();

        let result = load_articles(dir.path());
        assert!(matches!(result, Err(SourceError::Malformed { .. })));
    }

    #[test]
    fn test_load_articles_ignores_unrelated_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a listing").unwrap();

        let articles = load_articles(dir.path()).unwrap();
        assert!(articles.is_empty());
    }

    #[test]
    fn test_home_html_without_msg_list_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("home.html"), "<html></html>").unwrap();

        let result = load_articles(dir.path());
        assert!(matches!(result, Err(SourceError::Malformed { .. })));
    }
}
