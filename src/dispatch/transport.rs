//! Outbound HTTP transport.
//!
//! The dispatcher talks to downstream APIs through the [`Transport`] trait so
//! tests can substitute canned responses; [`HttpTransport`] is the reqwest
//! implementation used in production.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};

use crate::error::TransportError;

/// Request body encodings the integrations need.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    /// Sent as `text/plain`.
    Text(String),
}

/// One POST to a downstream integration.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// Integration name, for logs and errors.
    pub target: &'static str,
    pub url: String,
    /// Raw `Authorization` header value.
    pub authorization: Option<SecretString>,
    pub body: RequestBody,
}

/// Status and raw body of a downstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body parsed as JSON, if it is JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Capability to deliver an [`OutboundRequest`].
///
/// Implementations return `Err` only when no response was received; any
/// HTTP status, including 4xx/5xx, is an `Ok` response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport with a bounded per-request timeout.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("swipe-onboarding/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::RequestFailed {
                target: "http".into(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self.client.post(&request.url);

        if let Some(ref auth) = request.authorization {
            builder = builder.header(AUTHORIZATION, auth.expose_secret());
        }

        builder = match request.body {
            RequestBody::Json(ref value) => builder.json(value),
            RequestBody::Text(ref text) => builder
                .header(CONTENT_TYPE, "text/plain;charset=utf-8")
                .body(text.clone()),
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    target: request.target.into(),
                    timeout: self.timeout,
                }
            } else {
                TransportError::RequestFailed {
                    target: request.target.into(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(
                    integration = request.target,
                    status,
                    error = %e,
                    "Failed to read downstream response body"
                );
                String::new()
            }
        };
        tracing::debug!(integration = request.target, status, "Downstream responded");

        Ok(TransportResponse { status, body })
    }
}
