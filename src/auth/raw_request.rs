//! Raw HTTP/1.1 request parsing for captured sessions.
//!
//! Fiddler exports the request verbatim: a request line, header lines, a
//! blank line, then an optional body (ignored here). The archiver only needs
//! the request target's query string and a handful of headers.

use std::collections::HashMap;

use thiserror::Error;
use url::form_urlencoded;

/// Errors that can occur while parsing a captured raw request.
#[derive(Debug, Error)]
pub enum RequestParseError {
    /// Input was empty or whitespace.
    #[error("captured request is empty")]
    EmptyInput,
    /// The first line is not a valid HTTP/1.1 request line.
    #[error("malformed request line: {line}")]
    MalformedRequestLine {
        /// The offending first line.
        line: String,
    },
}

/// A parsed captured HTTP request.
///
/// Header names are stored lowercased; lookups via [`header`](Self::header)
/// are case-insensitive, matching how the capture tooling renders them.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Request method (`GET` in every observed capture).
    pub method: String,
    /// Request target, usually path + query.
    pub target: String,
    /// Protocol version token, e.g. `HTTP/1.1`.
    pub version: String,
    headers: HashMap<String, String>,
}

impl CapturedRequest {
    /// Parses a raw request export.
    ///
    /// Tolerates both `\r\n` and `\n` line endings. Header lines without a
    /// colon are skipped rather than rejected - captures sometimes carry
    /// tooling artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`RequestParseError`] when the input is empty or the request
    /// line does not have the `METHOD TARGET VERSION` shape.
    pub fn parse(raw: &str) -> Result<Self, RequestParseError> {
        let mut lines = raw.lines();
        let request_line = lines
            .by_ref()
            .map(str::trim_end)
            .find(|line| !line.trim().is_empty())
            .ok_or(RequestParseError::EmptyInput)?;

        let mut parts = request_line.split_whitespace();
        let (Some(method), Some(target), Some(version)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(RequestParseError::MalformedRequestLine {
                line: request_line.to_string(),
            });
        };

        let mut headers = HashMap::new();
        for line in lines {
            let line = line.trim_end();
            if line.is_empty() {
                // Blank line terminates the header block; anything after is body.
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_lowercase(), value.trim().to_string());
            }
        }

        Ok(Self {
            method: method.to_string(),
            target: target.to_string(),
            version: version.to_string(),
            headers,
        })
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Decoded query parameters from the request target, in capture order.
    #[must_use]
    pub fn query_params(&self) -> Vec<(String, String)> {
        let Some((_, query)) = self.target.split_once('?') else {
            return Vec::new();
        };
        form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Cookie pairs from the `Cookie` header, in capture order.
    ///
    /// Pairs without an `=` are skipped; values keep their raw encoding since
    /// the upstream endpoints expect the cookie values verbatim.
    #[must_use]
    pub fn cookies(&self) -> Vec<(String, String)> {
        self.header("cookie")
            .map(|raw| {
                raw.split(';')
                    .filter_map(|pair| {
                        let (name, value) = pair.split_once('=')?;
                        let name = name.trim();
                        if name.is_empty() {
                            return None;
                        }
                        Some((name.to_string(), value.trim().to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
