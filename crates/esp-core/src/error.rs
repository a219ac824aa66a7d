//! Error types for the ActiveESP system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for ActiveESP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the ActiveESP system
#[derive(Error, Debug)]
pub enum Error {
    /// A domain entity delegated to the provider but none is configured
    #[error("No provider has been configured")]
    ProviderNotConfigured,

    /// The configured selector does not name a registered provider
    #[error("{0} is not a supported provider")]
    ProviderNotSupported(String),

    /// The provider does not implement the requested operation
    #[error("{method} is not implemented by the {provider} provider")]
    MethodNotImplemented {
        /// Provider name
        provider: String,
        /// Operation name
        method: &'static str,
    },

    /// The backend refused to add a subscriber to a list
    #[error("Could not subscribe to list {list_id}: {message}")]
    CouldNotSubscribeToList {
        /// Identifier of the target list
        list_id: String,
        /// Warnings or errors reported by the backend
        message: String,
    },

    /// The backend refused to remove a subscriber from a list
    #[error("Could not unsubscribe from list {list_id}: {message}")]
    CouldNotUnsubscribeFromList {
        /// Identifier of the target list
        list_id: String,
        /// Warnings or errors reported by the backend
        message: String,
    },

    /// A subscriber failed validation before a create call
    #[error("Invalid subscriber: {0}")]
    SubscriberInvalid(String),

    /// The backend answered with a non-success status or an undecodable body
    #[error("Backend error ({provider}): status {status}: {body}")]
    Backend {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "not supported" error for an unknown selector
    pub fn not_supported(selector: impl Into<String>) -> Self {
        Self::ProviderNotSupported(selector.into())
    }

    /// Create a "method not implemented" error
    pub fn not_implemented(provider: impl Into<String>, method: &'static str) -> Self {
        Self::MethodNotImplemented {
            provider: provider.into(),
            method,
        }
    }

    /// Create a list subscription error
    pub fn could_not_subscribe(list_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CouldNotSubscribeToList {
            list_id: list_id.into(),
            message: message.into(),
        }
    }

    /// Create a list unsubscription error
    pub fn could_not_unsubscribe(list_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CouldNotUnsubscribeFromList {
            list_id: list_id.into(),
            message: message.into(),
        }
    }

    /// Create a subscriber validation error
    pub fn subscriber_invalid(msg: impl Into<String>) -> Self {
        Self::SubscriberInvalid(msg.into())
    }

    /// Create a backend error carrying the raw response
    pub fn backend(provider: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Backend {
            provider: provider.into(),
            status,
            body: body.into(),
        }
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from an operation the provider lacks
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::MethodNotImplemented { .. })
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_operation() {
        let err = Error::not_implemented("mail_chimp", "is_subscribed");
        assert_eq!(
            err.to_string(),
            "is_subscribed is not implemented by the mail_chimp provider"
        );
        assert!(err.is_not_implemented());
    }

    #[test]
    fn test_backend_error_keeps_raw_body() {
        let err = Error::backend("icontact", 502, "<html>bad gateway</html>");
        match err {
            Error::Backend { status, body, .. } => {
                assert_eq!(status, 502);
                assert_eq!(body, "<html>bad gateway</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: Error = anyhow::anyhow!("boom").into();
        assert!(matches!(err, Error::Other(ref m) if m == "boom"));
    }
}
