//! Output filename derivation.

use crate::source::Article;

/// Characters illegal in common filesystems, each replaced by `_`.
const ILLEGAL: &[char] = &['/', '\\', ':', '*', '?', '"', '\'', '<', '>', '|'];

/// Maps an arbitrary title to a filesystem-safe string.
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if ILLEGAL.contains(&c) { '_' } else { c })
        .collect()
}

/// Output filename for an archived article: `<YYYYMMDD>-<sanitized title>.html`.
#[must_use]
pub fn output_filename(article: &Article) -> String {
    format!(
        "{}-{}.html",
        article.timestamp.format("%Y%m%d"),
        sanitize_title(&article.title)
    )
}
