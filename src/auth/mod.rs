//! Session reconstruction from a captured browser request.
//!
//! The operator exports one raw HTTP request (Fiddler "Save > Request >
//! Entire Request") made by a logged-in client. Everything the archiver needs
//! to authenticate later calls is derived from that capture plus tokens
//! embedded in fetched article bodies.

mod extract;
mod raw_request;

pub use extract::{CredentialSet, extract_credentials};
pub use raw_request::{CapturedRequest, RequestParseError};

use std::collections::HashMap;

/// Base credential parameters derived from the captured request.
///
/// The merge of the request-line query parameters and the Cookie header
/// pairs, cookies winning on name collision. Consumers treat missing keys as
/// empty values rather than errors - captures are frequently incomplete.
#[must_use]
pub fn base_params(request: &CapturedRequest) -> HashMap<String, String> {
    let mut params: HashMap<String, String> = request.query_params().into_iter().collect();
    params.extend(request.cookies());
    params
}
