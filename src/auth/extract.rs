//! Credential token extraction from fetched article bodies.
//!
//! Article pages embed session tokens as script variable assignments
//! (`var comment_id = '...'`, `window.key = '...'`). Each token has one
//! extraction rule; rules are anchored to line starts, tolerate surrounding
//! whitespace and either quote style, and take the first match. A rule that
//! does not match yields an empty value - not every page embeds every token,
//! so extraction is best-effort by design.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

#[allow(clippy::expect_used)]
fn assignment_rule(lhs: &str, value: &str) -> Regex {
    // `var name = ...'value'` / `window.name = ..."value"`, line-anchored.
    // The `[^\n]*` gap absorbs expressions like `'a' || 'b'` before the
    // final quoted literal, mirroring how the pages concatenate fallbacks.
    let pattern = format!(r#"(?m)^\s*{lhs} *= *[^\n]*['"]({value})['"]"#);
    Regex::new(&pattern).expect("credential rule regex is valid") // Static pattern, safe to panic
}

struct Rules {
    comment_id: Regex,
    appmsgid: Regex,
    appmsg_token: Regex,
    devicetype: Regex,
    clientversion: Regex,
    uin: Regex,
    key: Regex,
    wxtoken: Regex,
}

static RULES: LazyLock<Rules> = LazyLock::new(|| Rules {
    comment_id: assignment_rule(r"var +comment_id", r"\d+"),
    appmsgid: assignment_rule(r"var +appmsgid", r"\d+"),
    appmsg_token: assignment_rule(r"var +appmsg_token", r#"[^'"\n]+"#),
    devicetype: assignment_rule(r"var +devicetype", r#"[^'"\n]+"#),
    clientversion: assignment_rule(r"var +clientversion", r"\d+"),
    uin: assignment_rule(r"window\.uin", r"[\w=%]+"),
    key: assignment_rule(r"window\.key", r"[\w=%]+"),
    wxtoken: assignment_rule(r"window\.wxtoken", r"[\w=%]+"),
});

/// Authentication tokens scraped from one article body.
///
/// Every field defaults to the empty string; downstream requests built from
/// partially-empty sets may still partially succeed or return empty results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    /// Comment thread anchor id; only ever present in the fetched body.
    pub comment_id: String,
    /// Message id as embedded in the page (the URL `mid` is authoritative).
    pub appmsgid: String,
    /// Per-article message token.
    pub appmsg_token: String,
    /// Client device descriptor, e.g. `Windows&nbsp;10`.
    pub devicetype: String,
    /// Numeric client version.
    pub clientversion: String,
    /// Encoded user identity.
    pub uin: String,
    /// Session key.
    pub key: String,
    /// Anti-forgery token.
    pub wxtoken: String,
}

/// Extracts credential tokens from fetched HTML/script text.
///
/// Pure pattern matching with no side effects; misses resolve to empty
/// fields and are logged at trace level only.
#[must_use]
pub fn extract_credentials(text: &str) -> CredentialSet {
    let first = |rule: &Regex, name: &str| -> String {
        match rule.captures(text).and_then(|c| c.get(1)) {
            Some(m) => m.as_str().to_string(),
            None => {
                trace!(token = name, "credential token not present in body");
                String::new()
            }
        }
    };

    CredentialSet {
        comment_id: first(&RULES.comment_id, "comment_id"),
        appmsgid: first(&RULES.appmsgid, "appmsgid"),
        appmsg_token: first(&RULES.appmsg_token, "appmsg_token"),
        devicetype: first(&RULES.devicetype, "devicetype"),
        clientversion: first(&RULES.clientversion, "clientversion"),
        uin: first(&RULES.uin, "uin"),
        key: first(&RULES.key, "key"),
        wxtoken: first(&RULES.wxtoken, "wxtoken"),
    }
}
