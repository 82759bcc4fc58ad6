//! Transport abstraction for FacturaDirecta API calls.
//!
//! The [`Transport`] trait moves bytes: it receives a fully built URL, query, Basic
//! credentials and an optional XML body, and returns the raw response. Everything
//! FacturaDirecta-specific (paths, XML, parsing) happens above it in
//! [`crate::client::ApiClient`].
//!
//! Implementations must treat a non-2xx status as an error
//! ([`BridgeError::Api`](crate::error::BridgeError::Api)) and must never log the
//! password or the username of [`BasicAuth`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//!
//! use facturadirecta_bridge::transport::{BasicAuth, HttpTransport, RequestContext, Transport};
//! use url::Url;
//!
//! # async fn example() -> facturadirecta_bridge::error::Result<()> {
//! let transport = HttpTransport::new()?;
//! let url = Url::parse("https://acme.facturadirecta.com/api/clients.xml").unwrap();
//! let query = BTreeMap::from([("limit".to_owned(), "10".to_owned())]);
//!
//! let ctx = RequestContext {
//!     url: &url,
//!     query: &query,
//!     auth: BasicAuth::new("api-token", "x"),
//!     headers: vec![("Accept", "application/xml")],
//! };
//!
//! let response = transport.get(ctx).await?;
//! println!("Status: {}", response.status);
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;
use std::{collections::BTreeMap, fmt};

use url::Url;

use crate::error::Result;

pub mod config;
pub mod http;

pub use config::HttpConfig;
pub use http::HttpTransport;

/// HTTP Basic credentials. `Debug` never prints either half.
#[derive(Clone, Copy)]
pub struct BasicAuth<'a> {
    /// User name (the API token for FacturaDirecta).
    pub username: &'a str,
    /// Password (a fixed placeholder for FacturaDirecta).
    pub password: &'a str,
}

impl<'a> BasicAuth<'a> {
    /// Creates Basic credentials.
    #[must_use]
    pub const fn new(username: &'a str, password: &'a str) -> Self {
        Self { username, password }
    }
}

impl fmt::Debug for BasicAuth<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Request context for transport operations.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    /// Absolute request URL without query string.
    pub url: &'a Url,
    /// Query parameters appended to the URL.
    pub query: &'a BTreeMap<String, String>,
    /// Basic credentials.
    pub auth: BasicAuth<'a>,
    /// Additional HTTP headers to include.
    pub headers: Vec<(&'a str, &'a str)>,
}

/// Successful response from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code, always 2xx.
    pub status: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
}

/// Transport protocol abstraction.
///
/// Open for implementation so callers can substitute their own HTTP stack or a
/// recording double in tests.
pub trait Transport: Send + Sync {
    /// Executes a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Api`](crate::error::BridgeError::Api) on connection
    /// failure, timeout or non-2xx status.
    fn get<'a>(
        &'a self,
        ctx: RequestContext<'a>,
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Executes a POST request. An empty `body` sends no body.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Api`](crate::error::BridgeError::Api) on connection
    /// failure, timeout or non-2xx status.
    fn post<'a>(
        &'a self,
        ctx: RequestContext<'a>,
        body: &'a [u8],
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Executes a PUT request. An empty `body` sends no body.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Api`](crate::error::BridgeError::Api) on connection
    /// failure, timeout or non-2xx status.
    fn put<'a>(
        &'a self,
        ctx: RequestContext<'a>,
        body: &'a [u8],
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Executes a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Api`](crate::error::BridgeError::Api) on connection
    /// failure, timeout or non-2xx status.
    fn delete<'a>(
        &'a self,
        ctx: RequestContext<'a>,
    ) -> impl Future<Output = Result<TransportResponse>> + Send + 'a;

    /// Returns the protocol name for logging.
    fn protocol_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_debug_is_redacted() {
        let auth = BasicAuth::new("secret-token", "x");
        let debug_str = format!("{auth:?}");
        assert!(!debug_str.contains("secret-token"));
        assert!(debug_str.contains("REDACTED"));
    }

    #[test]
    fn test_request_context_debug_hides_credentials() {
        let url = Url::parse("https://acme.facturadirecta.com/api/clients.xml").unwrap();
        let query = BTreeMap::new();
        let ctx = RequestContext {
            url: &url,
            query: &query,
            auth: BasicAuth::new("secret-token", "x"),
            headers: vec![("Accept", "application/xml")],
        };

        let debug_str = format!("{ctx:?}");
        assert!(debug_str.contains("RequestContext"));
        assert!(debug_str.contains("acme.facturadirecta.com"));
        assert!(!debug_str.contains("secret-token"));
    }

    #[test]
    fn test_request_context_clone() {
        let url = Url::parse("https://acme.facturadirecta.com/api/clients.xml").unwrap();
        let query = BTreeMap::from([("limit".to_owned(), "5".to_owned())]);
        let ctx = RequestContext {
            url: &url,
            query: &query,
            auth: BasicAuth::new("token", "x"),
            headers: vec![],
        };

        let cloned = ctx.clone();
        assert_eq!(cloned.url, ctx.url);
        assert_eq!(cloned.query, ctx.query);
        assert_eq!(cloned.auth.username, "token");
    }

    #[test]
    fn test_transport_response_debug() {
        let response = TransportResponse { status: 200, body: b"<ok/>".to_vec() };
        let debug_str = format!("{response:?}");
        assert!(debug_str.contains("TransportResponse"));
        assert!(debug_str.contains("200"));
    }
}
