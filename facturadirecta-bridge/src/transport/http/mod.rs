//! HTTP transport implementation.
//!
//! This module provides the reqwest-backed [`HttpTransport`]. Requests are sent over
//! HTTPS with Basic authentication; connection pooling is shared by all calls made
//! through one transport.

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::config::HttpConfig;
use crate::{
    error::{BridgeError, Result},
    resource::HttpMethod,
    transport::{RequestContext, Transport, TransportResponse},
};

/// Validates URL for security constraints.
///
/// Ensures the URL uses HTTPS and names a host.
fn validate_url(url: &Url) -> Result<()> {
    if url.scheme() != "https" {
        return Err(BridgeError::api("only HTTPS URLs are allowed"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(BridgeError::api("URL is missing a host"));
    }
    Ok(())
}

/// Validates header name and value for CRLF injection prevention.
fn validate_header(name: &str, value: &str) -> Result<()> {
    if name.contains(['\r', '\n', '\0']) {
        return Err(BridgeError::api("invalid header name: control characters not allowed"));
    }
    if value.contains(['\r', '\n', '\0']) {
        return Err(BridgeError::api("invalid header value: control characters not allowed"));
    }
    Ok(())
}

/// HTTPS transport using reqwest.
///
/// # Examples
///
/// ```
/// use facturadirecta_bridge::transport::{HttpConfig, HttpTransport, Transport};
///
/// let config = HttpConfig { timeout_secs: 60, ..HttpConfig::default() };
/// let transport = HttpTransport::with_config(&config).unwrap();
/// assert_eq!(transport.protocol_name(), "https");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with the default [`HttpConfig`] (30 s timeout).
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails.
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Creates HTTP transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] if the configuration is out of bounds, or
    /// [`BridgeError::Api`] if HTTP client creation fails.
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self { client })
    }

    /// Creates a transport around an existing reqwest client.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    #[instrument(
        skip_all,
        fields(
            %method,
            host = ctx.url.host_str().unwrap_or_default(),
            path = ctx.url.path(),
            status = tracing::field::Empty,
        )
    )]
    async fn execute_request(
        &self,
        ctx: RequestContext<'_>,
        method: HttpMethod,
        body: Option<&[u8]>,
    ) -> Result<TransportResponse> {
        validate_url(ctx.url)?;
        for (name, value) in &ctx.headers {
            validate_header(name, value)?;
        }

        let url = ctx.url.as_str();
        let mut request = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Put => self.client.put(url),
            HttpMethod::Delete => self.client.delete(url),
        };

        request = request.basic_auth(ctx.auth.username, Some(ctx.auth.password));

        if !ctx.query.is_empty() {
            request = request.query(ctx.query);
        }

        for (name, value) in ctx.headers {
            request = request.header(name, value);
        }

        if let Some(body) = body.filter(|body| !body.is_empty()) {
            request = request.body(body.to_vec());
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::Span::current().record("status", status.as_u16());

        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unexpected status");
            return Err(BridgeError::api_status(status.as_u16(), reason));
        }

        let body = response.bytes().await?.to_vec();
        debug!(bytes = body.len(), "response received");

        Ok(TransportResponse { status: status.as_u16(), body })
    }
}

impl Transport for HttpTransport {
    async fn get<'a>(&'a self, ctx: RequestContext<'a>) -> Result<TransportResponse> {
        self.execute_request(ctx, HttpMethod::Get, None).await
    }

    async fn post<'a>(
        &'a self,
        ctx: RequestContext<'a>,
        body: &'a [u8],
    ) -> Result<TransportResponse> {
        self.execute_request(ctx, HttpMethod::Post, Some(body)).await
    }

    async fn put<'a>(
        &'a self,
        ctx: RequestContext<'a>,
        body: &'a [u8],
    ) -> Result<TransportResponse> {
        self.execute_request(ctx, HttpMethod::Put, Some(body)).await
    }

    async fn delete<'a>(&'a self, ctx: RequestContext<'a>) -> Result<TransportResponse> {
        self.execute_request(ctx, HttpMethod::Delete, None).await
    }

    fn protocol_name(&self) -> &'static str {
        "https"
    }
}
