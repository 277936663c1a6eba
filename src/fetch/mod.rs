//! Authenticated network access and the derived comment request.

mod client;
mod comments;
mod error;

pub use client::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, HttpClient};
pub use comments::{CommentEntry, CommentReply, CommentResponse, build_comment_query};
pub use error::FetchError;
