//! HTTP utilities for provider REST API calls

use reqwest::header::HeaderMap;
use reqwest::{Client, Request, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Errors from a single API call
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API request failed: {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Sanitize response body for logging
/// Truncates long responses and drops non-printable characters
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Raw successful response
#[derive(Debug)]
pub struct Fetched {
    pub headers: HeaderMap,
    pub body: String,
}

/// HTTP client wrapper shared by the REST-based providers
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, HttpError> {
        let client = Client::builder()
            .user_agent(concat!("cloudlist/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Start a GET request
    pub fn get(&self, url: url::Url) -> RequestBuilder {
        self.client.get(url)
    }

    /// Send a request and return headers and body of a 2xx response
    pub async fn execute(&self, request: Request) -> Result<Fetched, HttpError> {
        tracing::debug!("{} {}", request.method(), request.url());

        let response = self.client.execute(request).await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if !status.is_success() {
            // Reported by the caller; only the sanitized body leaves this function
            let body = sanitize_for_log(&body);
            tracing::debug!("API error: {} - {}", status, body);
            return Err(HttpError::Status { status, body });
        }

        Ok(Fetched { headers, body })
    }

    /// Send a request and parse the JSON response
    pub async fn execute_json<T: DeserializeOwned>(&self, request: Request) -> Result<T, HttpError> {
        let fetched = self.execute(request).await?;
        serde_json::from_str(&fetched.body).map_err(|e| HttpError::Decode(e.to_string()))
    }
}

/// Parse a configured endpoint, mapping failures to a configuration error
pub(crate) fn parse_endpoint(provider: &str, endpoint: &str) -> crate::Result<url::Url> {
    url::Url::parse(endpoint)
        .map_err(|e| crate::Error::configuration(provider, format!("invalid endpoint {endpoint}: {e}")))
}

/// Build an HTTP client for a provider under construction
pub(crate) fn client_for(provider: &str) -> crate::Result<HttpClient> {
    HttpClient::new()
        .map_err(|e| crate::Error::configuration(provider, format!("could not create HTTP client: {e}")))
}
