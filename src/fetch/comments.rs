//! Comment request construction and response decoding.
//!
//! The comment endpoint is a derived call: its parameters are scattered
//! across three places - the captured base request, the article's own
//! `content_url` query string, and tokens embedded in the fetched body.
//! Building merges those sources; it performs no I/O and never fails.
//! Unresolved tokens degrade to empty parameters, and such a request may
//! legitimately return zero comments.

use std::collections::HashMap;

use serde::Deserialize;
use url::Url;

use crate::auth::CredentialSet;
use crate::source::Article;

/// Comment page size requested from the endpoint.
const COMMENT_PAGE_LIMIT: &str = "100";

/// One featured discussion entry attached to an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEntry {
    /// Commenter display name.
    pub author: String,
    /// Commenter avatar URL.
    pub avatar_url: String,
    /// Comment text.
    pub text: String,
    /// Creation time, unix seconds.
    pub created_at: i64,
    /// Upvote count.
    pub likes: i64,
    /// The author-side response, if any. At most one is retained even when
    /// the upstream carries several.
    pub reply: Option<CommentReply>,
}

/// An author-side reply to a featured comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentReply {
    /// Reply text.
    pub text: String,
    /// Upvote count on the reply.
    pub likes: i64,
}

// Upstream response shape. Everything defaults: the endpoint omits fields
// freely depending on session validity.

#[derive(Debug, Default, Deserialize)]
pub struct CommentResponse {
    #[serde(default)]
    elected_comment: Vec<RawComment>,
}

#[derive(Debug, Default, Deserialize)]
struct RawComment {
    #[serde(default)]
    nick_name: String,
    #[serde(default)]
    logo_url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    create_time: i64,
    #[serde(default)]
    like_num: i64,
    #[serde(default)]
    reply: RawReplyHolder,
}

#[derive(Debug, Default, Deserialize)]
struct RawReplyHolder {
    #[serde(default)]
    reply_list: Vec<RawReply>,
}

#[derive(Debug, Default, Deserialize)]
struct RawReply {
    #[serde(default)]
    content: String,
    #[serde(default)]
    reply_like_num: i64,
}

impl CommentResponse {
    /// Converts the upstream payload into ordered [`CommentEntry`] values.
    ///
    /// Only "elected" (featured) comments arrive in this list; order is
    /// preserved. Extra replies beyond the first are dropped.
    #[must_use]
    pub fn into_entries(self) -> Vec<CommentEntry> {
        self.elected_comment
            .into_iter()
            .map(|raw| CommentEntry {
                author: raw.nick_name,
                avatar_url: raw.logo_url,
                text: raw.content,
                created_at: raw.create_time,
                likes: raw.like_num,
                reply: raw.reply.reply_list.into_iter().next().map(|r| CommentReply {
                    text: r.content,
                    likes: r.reply_like_num,
                }),
            })
            .collect()
    }
}

/// Builds the query parameter set for the comment endpoint.
///
/// `appmsgid` and `idx` are authoritative from the article's `content_url`
/// (`mid`/`idx` query parameters), never from credentials. For each auth
/// token, resolution order is base value → item-extracted value → empty.
/// `comment_id` always comes from the extracted set; it does not exist at
/// capture time.
#[must_use]
pub fn build_comment_query(
    base: &HashMap<String, String>,
    article: &Article,
    extracted: &CredentialSet,
) -> Vec<(String, String)> {
    let content_params = content_url_params(&article.content_url);
    let from_url = |name: &str| content_params.get(name).cloned().unwrap_or_default();
    let from_base = |name: &str| base.get(name).cloned().unwrap_or_default();
    let resolve = |name: &str, extracted_value: &str| {
        let base_value = from_base(name);
        if base_value.is_empty() {
            extracted_value.to_string()
        } else {
            base_value
        }
    };

    vec![
        ("action".to_string(), "getcomment".to_string()),
        ("scene".to_string(), "0".to_string()),
        ("__biz".to_string(), from_base("__biz")),
        ("appmsgid".to_string(), from_url("mid")),
        ("idx".to_string(), from_url("idx")),
        ("comment_id".to_string(), extracted.comment_id.clone()),
        ("offset".to_string(), "0".to_string()),
        ("limit".to_string(), COMMENT_PAGE_LIMIT.to_string()),
        ("uin".to_string(), resolve("uin", &extracted.uin)),
        ("key".to_string(), resolve("key", &extracted.key)),
        // The capture names this cookie `wxtokenkey`; the endpoint wants `wxtoken`.
        ("wxtoken".to_string(), resolve("wxtokenkey", &extracted.wxtoken)),
        ("pass_ticket".to_string(), from_base("pass_ticket")),
        ("devicetype".to_string(), extracted.devicetype.clone()),
        ("clientversion".to_string(), extracted.clientversion.clone()),
        (
            "appmsg_token".to_string(),
            resolve("appmsg_token", &extracted.appmsg_token),
        ),
        ("x5".to_string(), "0".to_string()),
        ("f".to_string(), "json".to_string()),
    ]
}

fn content_url_params(content_url: &str) -> HashMap<String, String> {
    Url::parse(content_url)
        .map(|url| {
            url.query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}
