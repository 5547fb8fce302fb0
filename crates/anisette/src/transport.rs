//! Transport abstraction for provider requests
//!
//! The fetcher only needs "GET this endpoint, give me status, content type and
//! the full body". `HttpTransport` does that over reqwest with a per-request
//! timeout; tests substitute scripted transports.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::constants::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};

/// A fully-read provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Issues one GET against an endpoint.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    /// Any connect, timeout or body-read failure is an [`Error::Transport`].
    /// Non-2xx statuses are not errors at this layer.
    fn get<'a>(
        &'a self,
        endpoint: &'a Endpoint,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + 'a>>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    user_agent: HeaderValue,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, user_agent: &str, timeout: Duration) -> Result<Self> {
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|e| Error::InvalidField {
                field: "User-Agent",
                reason: format!("{user_agent:?} is not a valid header value: {e}"),
            })?;
        Ok(Self {
            client,
            user_agent,
            timeout,
        })
    }

    /// Headers sent with every request, replacing any existing value.
    fn request_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, self.user_agent.clone());
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            user_agent: HeaderValue::from_static(DEFAULT_USER_AGENT),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Transport for HttpTransport {
    fn get<'a>(
        &'a self,
        endpoint: &'a Endpoint,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .get(endpoint.as_str())
                .headers(self.request_headers())
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| Error::Transport(describe_reqwest_error(&e, self.timeout)))?;

            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            debug!(endpoint = %endpoint, status, "received anisette response");

            let body = response.bytes().await.map_err(|e| {
                Error::Transport(format!(
                    "reading response body: {}",
                    describe_reqwest_error(&e, self.timeout)
                ))
            })?;

            Ok(RawResponse {
                status,
                content_type,
                body: body.to_vec(),
            })
        })
    }
}

fn describe_reqwest_error(error: &reqwest::Error, timeout: Duration) -> String {
    if error.is_timeout() {
        format!("timed out after {}s", timeout.as_secs_f32())
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}
