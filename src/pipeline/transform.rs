//! Staged, pure body transformations.
//!
//! The fetched article body flows through explicit stages, each a function
//! from string to string: strip scripts → inline images → stamp publish
//! time → append the comment block. Network I/O stays in the pipeline; the
//! image stage is split into reference collection and replacement so the
//! fetches in between remain the caller's concern.

use std::ops::Range;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use regex::Regex;

#[allow(clippy::expect_used)]
mod patterns {
    use super::{LazyLock, Regex};

    pub(super) static SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>")
            .expect("script regex is valid") // Static pattern, safe to panic
    });

    pub(super) static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<img\b[^>]*>").expect("img regex is valid")
    });

    pub(super) static DATA_SRC_ATTR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?i)\bdata-src\s*=\s*["']([^"']*)["']"#).expect("data-src regex is valid")
    });

    // Leading `[^-\w]` guard keeps `data-src` from matching as `src`.
    pub(super) static SRC_ATTR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?i)([^-\w])(src\s*=\s*["'])([^"']*)(["'])"#).expect("src regex is valid")
    });

    pub(super) static DATA_TYPE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?i)\bdata-type\s*=\s*["']([^"']*)["']"#).expect("data-type regex is valid")
    });

    pub(super) static PUBLISH_TIME: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?is)(<[^>]*\bid\s*=\s*["']publish_time["'][^>]*>)([^<]*)"#)
            .expect("publish_time regex is valid")
    });

    pub(super) static PRIMARY_REGION_OPEN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?i)<div\b[^>]*rich_media_area_primary_inner[^>]*>"#)
            .expect("primary region regex is valid")
    });

    pub(super) static DIV_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)<div\b|</div\s*>").expect("div token regex is valid")
    });

    pub(super) static BODY_CLOSE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)</body\s*>").expect("body close regex is valid")
    });
}

use patterns::*;

/// Image type assumed when the tag declares none.
const DEFAULT_IMAGE_TYPE: &str = "png";

/// One embedded image reference found in a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Byte range of the whole `<img ...>` tag in the body.
    pub span: Range<usize>,
    /// Fetchable URL (protocol-relative already normalized).
    pub url: String,
    /// Declared image type (`data-type` attribute) or the default.
    pub image_type: String,
}

/// Removes executable script tags from the body.
#[must_use]
pub fn strip_scripts(body: &str) -> String {
    SCRIPT.replace_all(body, "").into_owned()
}

/// Collects embedded image references, in document order.
///
/// The lazy-loading `data-src` attribute wins over `src` when both are
/// present. Tags without either are skipped. Protocol-relative URLs are
/// normalized to an explicit scheme so they can be fetched.
#[must_use]
pub fn collect_image_refs(body: &str) -> Vec<ImageRef> {
    IMG_TAG
        .find_iter(body)
        .filter_map(|tag| {
            let text = tag.as_str();
            let url = attr_value(&DATA_SRC_ATTR, 1, text)
                .or_else(|| attr_value(&SRC_ATTR, 3, text))?;
            let image_type = DATA_TYPE_ATTR
                .captures(text)
                .and_then(|c| c.get(1))
                .map_or(DEFAULT_IMAGE_TYPE, |m| m.as_str())
                .to_string();
            Some(ImageRef {
                span: tag.range(),
                url: normalize_scheme(&url),
                image_type,
            })
        })
        .collect()
}

/// Non-empty value of a quoted attribute, `group` being its capture index.
fn attr_value(attr: &Regex, group: usize, tag: &str) -> Option<String> {
    attr.captures(tag)
        .and_then(|c| c.get(group))
        .map(|m| m.as_str().to_string())
        .filter(|value| !value.is_empty())
}

/// Protocol-relative URLs get an explicit scheme so they can be fetched.
fn normalize_scheme(url: &str) -> String {
    match url.strip_prefix("//") {
        Some(rest) => format!("http://{rest}"),
        None => url.to_string(),
    }
}

/// Encodes fetched image bytes as a self-contained data URI.
#[must_use]
pub fn encode_data_uri(image_type: &str, bytes: &[u8]) -> String {
    format!("data:image/{image_type};base64,{}", BASE64.encode(bytes))
}

/// Replaces each collected image reference with its inlined data URI.
///
/// `inlined` must be in document order with non-overlapping spans, which is
/// what [`collect_image_refs`] produces. Other attributes of each tag are
/// preserved; only `src` is rewritten (or added when absent).
#[must_use]
pub fn apply_inline_images(body: &str, inlined: &[(ImageRef, String)]) -> String {
    let mut out = String::with_capacity(body.len());
    let mut cursor = 0;
    for (image, data_uri) in inlined {
        out.push_str(&body[cursor..image.span.start]);
        out.push_str(&set_src(&body[image.span.clone()], data_uri));
        cursor = image.span.end;
    }
    out.push_str(&body[cursor..]);
    out
}

/// Rewrites the `src` attribute of one tag, inserting it when missing.
///
/// The lazy-loading `data-src` attribute is dropped outright: it holds the
/// remote URL, and leaving it behind would break the zero-external-references
/// guarantee of the archived document.
fn set_src(tag: &str, value: &str) -> String {
    let tag = DATA_SRC_ATTR.replace(tag, "");
    if SRC_ATTR.is_match(&tag) {
        SRC_ATTR
            .replace(&tag, |caps: &regex::Captures<'_>| {
                // Keep the guard character and the original quoting.
                format!(
                    "{}{}{value}{}",
                    caps.get(1).map_or("", |m| m.as_str()),
                    caps.get(2).map_or("", |m| m.as_str()),
                    caps.get(4).map_or("\"", |m| m.as_str()),
                )
            })
            .into_owned()
    } else if tag.len() >= 4 && tag.as_bytes()[..4].eq_ignore_ascii_case(b"<img") {
        // Tag casing follows the page; splice right after the tag name.
        let (open, rest) = tag.split_at(4);
        format!("{open} src=\"{value}\"{rest}")
    } else {
        tag.into_owned()
    }
}

/// Stamps a human-readable publish time into the placeholder element.
///
/// No-op when the body has no `publish_time` element, matching the upstream
/// pages that omit it.
#[must_use]
pub fn stamp_publish_time(body: &str, timestamp: &DateTime<Utc>) -> String {
    let formatted = timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
    PUBLISH_TIME
        .replace(body, |caps: &regex::Captures<'_>| {
            format!("{}{formatted}", caps.get(1).map_or("", |m| m.as_str()))
        })
        .into_owned()
}

/// Appends a rendered block to the body's primary content region.
///
/// The insertion point is the close of the `rich_media_area_primary_inner`
/// div, found by depth-counting nested divs. Falls back to just before
/// `</body>`, then to the document end, when the region (or a balanced
/// close) is absent.
#[must_use]
pub fn append_to_primary_region(body: &str, block: &str) -> String {
    let insert_at = primary_region_close(body)
        .or_else(|| BODY_CLOSE.find(body).map(|m| m.start()))
        .unwrap_or(body.len());
    let mut out = String::with_capacity(body.len() + block.len());
    out.push_str(&body[..insert_at]);
    out.push_str(block);
    out.push_str(&body[insert_at..]);
    out
}

/// Byte offset of the primary region's closing `</div>`, if balanced.
fn primary_region_close(body: &str) -> Option<usize> {
    let open = PRIMARY_REGION_OPEN.find(body)?;
    let mut depth = 1usize;
    for token in DIV_TOKEN.find_iter(&body[open.end()..]) {
        if token.as_str().starts_with("</") {
            depth -= 1;
            if depth == 0 {
                return Some(open.end() + token.start());
            }
        } else {
            depth += 1;
        }
    }
    None
}
