//! HTTP transport seam between the ruler client and the network.
//!
//! [`RulerClient`](crate::RulerClient) builds [`RulerRequest`]s and hands them
//! to a [`RulerTransport`]. Production uses [`HttpTransport`] (reqwest with an
//! explicit timeout and TLS policy); tests substitute
//! [`InMemoryRuler`](crate::memory::InMemoryRuler) or a local server.

use std::time::Duration;

use alertsync_core::config::RulerConfig;
use async_trait::async_trait;
use reqwest::Method;

/// Errors raised before a response status is available.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A request against the ruler API, relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulerRequest {
    pub method: Method,
    /// Absolute path beginning with `/`.
    pub path: String,
    pub headers: Vec<(String, String)>,
    /// YAML body, if any.
    pub body: Option<String>,
}

impl RulerRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulerResponse {
    pub status: u16,
    pub body: String,
}

impl RulerResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends ruler requests. Implementations must not retry.
#[async_trait]
pub trait RulerTransport: Send + Sync {
    async fn send(&self, request: RulerRequest) -> Result<RulerResponse, TransportError>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Base URL without trailing slash.
    base_url: String,
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,
}

impl HttpTransport {
    /// Use a caller-configured client.
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Build a client with the configured timeout and TLS policy.
    pub fn from_config(config: &RulerConfig) -> Result<Self, TransportError> {
        if config.url.is_empty() {
            return Err(TransportError::Config("ruler url is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.tls_insecure)
            .build()?;
        Ok(Self::new(config.url.clone(), client))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl RulerTransport for HttpTransport {
    async fn send(&self, request: RulerRequest) -> Result<RulerResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.clone(), &url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/yaml")
                .body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(method = %request.method, %url, status, "ruler request completed");
        Ok(RulerResponse { status, body })
    }
}
