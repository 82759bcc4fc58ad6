//! FacturaDirecta API client: the request execution boundary.
//!
//! [`ApiClient`] turns a [`RequestDescriptor`] into one HTTPS call against
//! `https://{account}.{api_domain}/api{path}`, authenticated with Basic auth (API token
//! as user name, `x` as password) and exchanging `application/xml` both ways.

use tracing::{debug, instrument};
use url::Url;

use crate::{
    config::{BridgeConfig, Credentials},
    error::{BridgeError, Result},
    resource::{HttpMethod, RequestDescriptor},
    transport::{BasicAuth, HttpTransport, RequestContext, Transport},
    xml::{self, ResponseFields},
};

/// Password paired with the API token; FacturaDirecta ignores it.
pub const BASIC_AUTH_PASSWORD: &str = "x";

const XML_CONTENT_TYPE: &str = "application/xml";

/// Executes request descriptors against one FacturaDirecta account.
///
/// # Examples
///
/// ```rust,no_run
/// use facturadirecta_bridge::{ApiClient, BridgeConfig, Credentials, dispatch, resource};
/// use serde_json::Map;
///
/// # async fn example() -> facturadirecta_bridge::error::Result<()> {
/// let client = ApiClient::new(Credentials::new("acme", "api-token"), &BridgeConfig::default())?;
///
/// let data = Map::new();
/// let query = resource::QueryOptions::default();
/// let params = resource::RequestParams { id: Some("42"), data: &data, query: &query };
/// let descriptor = dispatch::dispatch("client", "get", &params)?;
///
/// let fields = client.request(&descriptor).await?;
/// println!("{:?}", fields.get("n"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient<T = HttpTransport> {
    transport: T,
    credentials: Credentials,
    base_url: Url,
}

impl ApiClient<HttpTransport> {
    /// Creates a client backed by [`HttpTransport`] configured from `config.http`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidCredentials`] for an unusable account name or
    /// token, or [`BridgeError::Config`] for an invalid configuration.
    pub fn new(credentials: Credentials, config: &BridgeConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::with_config(&config.http)?;
        Self::with_transport(transport, credentials, &config.api_domain)
    }
}

impl<T: Transport> ApiClient<T> {
    /// Creates a client over an arbitrary transport.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidCredentials`] if the credentials fail validation,
    /// or [`BridgeError::Config`] if no valid URL can be built for the account.
    pub fn with_transport(
        transport: T,
        credentials: Credentials,
        api_domain: &str,
    ) -> Result<Self> {
        credentials.validate()?;
        let base_url = Url::parse(&format!("https://{}.{api_domain}/api", credentials.account_name))
            .map_err(|e| BridgeError::Config(format!("invalid API base URL: {e}")))?;
        Ok(Self { transport, credentials, base_url })
    }

    /// Base URL every path is appended to, e.g. `https://acme.facturadirecta.com/api`.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Absolute URL of `path`.
    ///
    /// Each `/`-separated part of `path` becomes one percent-encoded segment below the
    /// base URL, so `?`, `#` or `%` inside an id stay part of that segment.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidInput`] if `path` contains a `.` or `..` segment.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        let invalid = |reason: &str| {
            BridgeError::InvalidInput(format!("invalid request path '{path}': {reason}"))
        };

        let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();
        if segments.iter().any(|segment| matches!(*segment, "." | "..")) {
            return Err(invalid("dot segments are not allowed"));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| invalid("base URL cannot take path segments"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Executes a descriptor and returns the raw response body.
    ///
    /// The body is serialized to XML only when the descriptor carries one.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Api`] on connection failure, timeout or non-2xx status.
    /// Before anything is sent, [`BridgeError::InvalidInput`] is returned for a path
    /// that [`url_for`](Self::url_for) rejects and [`BridgeError::Xml`] for a body
    /// that cannot be serialized.
    #[instrument(
        skip_all,
        fields(
            method = %descriptor.method,
            path = %descriptor.path,
            protocol = self.transport.protocol_name()
        )
    )]
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<Vec<u8>> {
        let url = self.url_for(&descriptor.path)?;
        let body = descriptor.body.as_ref().map(xml::to_xml).transpose()?.unwrap_or_default();

        let ctx = RequestContext {
            url: &url,
            query: &descriptor.query,
            auth: BasicAuth::new(&self.credentials.api_token, BASIC_AUTH_PASSWORD),
            headers: vec![("Accept", XML_CONTENT_TYPE), ("Content-Type", XML_CONTENT_TYPE)],
        };

        let response = match descriptor.method {
            HttpMethod::Get => self.transport.get(ctx).await?,
            HttpMethod::Post => self.transport.post(ctx, body.as_bytes()).await?,
            HttpMethod::Put => self.transport.put(ctx, body.as_bytes()).await?,
            HttpMethod::Delete => self.transport.delete(ctx).await?,
        };

        debug!(status = response.status, bytes = response.body.len(), "request completed");
        Ok(response.body)
    }

    /// Executes a descriptor and flattens the response into a field mapping.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute); parsing itself never fails.
    pub async fn request(&self, descriptor: &RequestDescriptor) -> Result<ResponseFields> {
        let body = self.execute(descriptor).await?;
        Ok(xml::parse_response(&body))
    }
}
