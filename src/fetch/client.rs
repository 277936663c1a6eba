//! Authenticated HTTP session for all archiver fetches.
//!
//! One client carries the reconstructed browser identity for the whole run:
//! default headers copied from the captured request and a cookie jar seeded
//! from its `Cookie` header. The session is never mutated after
//! initialization - token refresh is out of scope.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::auth::CapturedRequest;

use super::error::FetchError;

/// Default connect timeout. The original tooling relied on transport
/// defaults; an explicit bound keeps a single dead host from stalling a run.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default read timeout, generous enough for large image payloads.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;

/// Captured headers replayed on every request.
const REPLAYED_HEADERS: &[&str] = &["User-Agent", "Accept", "Connection", "Accept-Language"];

/// HTTP client wrapper for article bodies, the comment endpoint, and images.
///
/// Create once per run and reuse; connection pooling and the cookie jar both
/// live for the client's lifetime.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Builds a session from a captured request, replaying its identifying
    /// headers and cookies against `cookie_origin` (the upstream host the
    /// capture was taken from).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] when `cookie_origin` does not
    /// parse, or [`FetchError::Network`] when the client cannot be built.
    #[instrument(skip(captured))]
    pub fn from_captured_request(
        captured: &CapturedRequest,
        cookie_origin: &str,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, FetchError> {
        let origin =
            Url::parse(cookie_origin).map_err(|_| FetchError::invalid_url(cookie_origin))?;

        let jar = Arc::new(Jar::default());
        for (name, value) in captured.cookies() {
            jar.add_cookie_str(&format!("{name}={value}"), &origin);
        }

        let mut headers = HeaderMap::new();
        for name in REPLAYED_HEADERS {
            let Some(value) = captured.header(name) else {
                debug!(header = name, "captured request lacks header, skipping");
                continue;
            };
            if let (Ok(header_name), Ok(header_value)) = (
                HeaderName::from_bytes(name.to_lowercase().as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(header_name, header_value);
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .cookie_provider(jar)
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .build()
            .map_err(|e| FetchError::Network {
                url: cookie_origin.to_string(),
                source: e,
            })?;

        Ok(Self { client })
    }

    /// Fetches a URL and returns the response body as text.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on network failure, timeout, or non-2xx status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get_checked(url, &[]).await?;
        response.text().await.map_err(|e| FetchError::request(url, e))
    }

    /// Fetches a URL with query parameters and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on network failure, timeout, non-2xx status,
    /// or a body that does not decode as `T`.
    #[instrument(skip(self, params), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<T, FetchError> {
        let response = self.get_checked(url, params).await?;
        response.json().await.map_err(|e| FetchError::json(url, e))
    }

    /// Fetches a URL and returns the raw response bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on network failure, timeout, or non-2xx status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.get_checked(url, &[]).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::request(url, e))?;
        Ok(bytes.to_vec())
    }

    async fn get_checked(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<reqwest::Response, FetchError> {
        let mut request = self.client.get(url);
        if !params.is_empty() {
            request = request.query(params);
        }
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::request(url, e))?;

        let status: StatusCode = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn captured_with_headers() -> CapturedRequest {
        CapturedRequest::parse(
            "GET /mp/profile_ext?__biz=MzA= HTTP/1.1\r\n\
             User-Agent: TestAgent/1.0\r\n\
             Accept: text/html\r\n\
             Accept-Language: zh-CN\r\n\
             Cookie: wxuin=42; key=abc\r\n\
             \r\n",
        )
        .unwrap()
    }

    fn client_for(server: &MockServer) -> HttpClient {
        HttpClient::from_captured_request(&captured_with_headers(), &server.uri(), 5, 5).unwrap()
    }

    #[tokio::test]
    async fn test_get_text_replays_captured_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .and(header("User-Agent", "TestAgent/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>body</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = format!("{}/article", server.uri());
        let body = client.get_text(&url).await.unwrap();
        assert_eq!(body, "<html>body</html>");
    }

    #[tokio::test]
    async fn test_get_text_sends_captured_cookies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .and(header("Cookie", "wxuin=42; key=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = format!("{}/article", server.uri());
        assert_eq!(client.get_text(&url).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_get_text_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = format!("{}/gone", server.uri());
        match client.get_text(&url).await {
            Err(FetchError::HttpStatus { status: 404, .. }) => {}
            other => panic!("Expected HttpStatus 404, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_json_decodes_and_passes_query_params() {
        #[derive(Deserialize)]
        struct Reply {
            value: i32,
        }

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comments"))
            .and(query_param("action", "getcomment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": 7
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = format!("{}/comments", server.uri());
        let params = vec![("action".to_string(), "getcomment".to_string())];
        let reply: Reply = client.get_json(&url, &params).await.unwrap();
        assert_eq!(reply.value, 7);
    }

    #[tokio::test]
    async fn test_get_json_malformed_body_is_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = format!("{}/comments", server.uri());
        let result: Result<serde_json::Value, _> = client.get_json(&url, &[]).await;
        assert!(matches!(result, Err(FetchError::Json { .. })));
    }

    #[tokio::test]
    async fn test_get_bytes_round_trips_binary() {
        let server = MockServer::start().await;
        let payload: Vec<u8> = vec![0x89, 0x50, 0x4E, 0x47, 0x00, 0xFF];
        Mock::given(method("GET"))
            .and(path("/img.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = format!("{}/img.png", server.uri());
        assert_eq!(client.get_bytes(&url).await.unwrap(), payload);
    }

    #[test]
    fn test_invalid_cookie_origin_is_error() {
        let result =
            HttpClient::from_captured_request(&captured_with_headers(), "not a url", 5, 5);
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }
}
