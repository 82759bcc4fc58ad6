//! Error types for the FacturaDirecta bridge.
//!
//! This module defines every error that can leave a dispatch call.
//! All errors implement the standard [`std::error::Error`] trait via [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Routing Errors** ([`BridgeError::UnknownResource`], [`BridgeError::UnknownOperation`]):
//!   the `(resource, operation)` pair is not part of the supported surface
//! - **API Errors** ([`BridgeError::Api`]): any transport failure, non-2xx status or timeout
//! - **Validation Errors** ([`BridgeError::InvalidInput`], [`BridgeError::InvalidCredentials`],
//!   [`BridgeError::Config`]): caller-supplied data rejected before a request is issued
//! - **Batch Errors** ([`BridgeError::Item`]): a failure tagged with the input item that caused it
//!
//! XML response decoding never produces an error. A malformed body degrades to a
//! `rawResponse` / `parseError` mapping instead, see [`crate::xml::parse_response`].
//!
//! # Examples
//!
//! ```
//! use facturadirecta_bridge::error::{BridgeError, Result};
//!
//! fn require_id(id: Option<&str>) -> Result<&str> {
//!     id.filter(|id| !id.is_empty())
//!         .ok_or_else(|| BridgeError::InvalidInput("id is required".to_owned()))
//! }
//!
//! assert!(require_id(None).is_err());
//! ```

use thiserror::Error;

/// Result type alias for bridge operations.
///
/// All fallible functions in this crate return this type.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur in the FacturaDirecta bridge.
///
/// Routing and API errors are fatal for the item being processed. Whether they also
/// abort the rest of a batch is decided by the batch runner, see
/// [`crate::batch::Bridge::run_batch`].
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The resource name is not one of the seven supported billing entities.
    ///
    /// # Examples
    ///
    /// ```
    /// use facturadirecta_bridge::{BridgeError, Resource};
    ///
    /// let err = "customer".parse::<Resource>().unwrap_err();
    /// assert!(matches!(err, BridgeError::UnknownResource(_)));
    /// assert_eq!(err.to_string(), "The resource \"customer\" is not known");
    /// ```
    #[error("The resource \"{0}\" is not known")]
    UnknownResource(String),

    /// The operation is unknown, or not available for the given resource.
    ///
    /// `send` only exists for invoices and `updateStock` only for products; asking for
    /// either on another resource lands here.
    #[error("The operation \"{operation}\" is not known for resource \"{resource}\"")]
    UnknownOperation {
        /// Resource the operation was requested on.
        resource: String,
        /// Requested operation name.
        operation: String,
    },

    /// The FacturaDirecta API call failed.
    ///
    /// Wraps connection errors, timeouts and non-2xx responses. This is the only error
    /// produced by the request execution boundary.
    ///
    /// # Recovery
    ///
    /// A `401` usually means the API token is wrong, a `404` that the entity id does not
    /// exist in the account. Requests are never retried automatically.
    #[error("FacturaDirecta API request failed{}: {message}", status_suffix(.status))]
    Api {
        /// HTTP status code, when a response was received.
        status: Option<u16>,
        /// Human readable description of the failure.
        message: String,
        /// Underlying transport error, if any.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Caller-supplied parameters were rejected before a request was built.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Credentials cannot be used to address the API.
    ///
    /// The message never contains the API token.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Configuration could not be loaded or failed validation.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Outbound XML document could not be produced.
    #[error("XML serialization failed: {0}")]
    Xml(String),

    /// An item of a batch failed and the batch was aborted.
    #[error("Item {item} failed: {source}")]
    Item {
        /// Zero-based position of the failing item in the batch input.
        item: usize,
        /// Error raised while processing the item.
        #[source]
        source: Box<BridgeError>,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

impl BridgeError {
    /// Builds an [`Api`](Self::Api) error raised before any response was received.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api { status: None, message: message.into(), source: None }
    }

    /// Builds an [`Api`](Self::Api) error for a response with a non-success status.
    pub fn api_status(status: u16, message: impl Into<String>) -> Self {
        Self::Api { status: Some(status), message: message.into(), source: None }
    }

    /// Tags this error with the batch item that produced it.
    pub fn for_item(self, item: usize) -> Self {
        Self::Item { item, source: Box::new(self) }
    }

    /// Returns true for routing errors ([`UnknownResource`](Self::UnknownResource) and
    /// [`UnknownOperation`](Self::UnknownOperation)).
    #[must_use]
    pub fn is_routing(&self) -> bool {
        matches!(self, Self::UnknownResource(_) | Self::UnknownOperation { .. })
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_owned()
        } else if err.is_connect() {
            "connection failed".to_owned()
        } else {
            err.to_string()
        };
        Self::Api { status: err.status().map(|s| s.as_u16()), message, source: Some(err) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_resource_display() {
        let error = BridgeError::UnknownResource("customer".to_owned());
        assert_eq!(error.to_string(), "The resource \"customer\" is not known");
        assert!(error.is_routing());
    }

    #[test]
    fn test_unknown_operation_display() {
        let error = BridgeError::UnknownOperation {
            resource: "client".to_owned(),
            operation: "send".to_owned(),
        };
        assert_eq!(
            error.to_string(),
            "The operation \"send\" is not known for resource \"client\""
        );
        assert!(error.is_routing());
    }

    #[test]
    fn test_api_error_with_status() {
        let error = BridgeError::api_status(404, "Not Found");
        assert_eq!(
            error.to_string(),
            "FacturaDirecta API request failed with status 404: Not Found"
        );
        assert!(!error.is_routing());
    }

    #[test]
    fn test_api_error_without_status() {
        let error = BridgeError::Api {
            status: None,
            message: "connection failed".to_owned(),
            source: None,
        };
        assert_eq!(error.to_string(), "FacturaDirecta API request failed: connection failed");
    }

    #[test]
    fn test_item_error_keeps_source() {
        let error = BridgeError::InvalidInput("id is required".to_owned()).for_item(2);
        assert_eq!(error.to_string(), "Item 2 failed: Invalid input: id is required");

        let source = std::error::Error::source(&error).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("Invalid input: id is required"));
    }
}
