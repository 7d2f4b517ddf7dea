//! Error types for delivery operations.

use thiserror::Error;

/// Errors that can occur while delivering audit records.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Configured collector URL is not a valid URL.
    #[error("Invalid collector URL '{url}': {source}")]
    InvalidUrl {
        /// The offending URL string.
        url: String,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {source}")]
    ClientBuild {
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// Record could not be serialized to JSON.
    #[error("Failed to serialize audit record: {source}")]
    Serialization {
        /// Underlying error.
        #[from]
        source: serde_json::Error,
    },

    /// Request could not be completed (connect failure, timeout, broken
    /// transfer). A completed request with a non-2xx status is not an
    /// error; it is logged and dropped.
    #[error("Failed to deliver audit record to {url}: {source}")]
    Request {
        /// Collector URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_url() {
        let source = url::Url::parse("not a url").unwrap_err();
        let err = DeliveryError::InvalidUrl {
            url: "not a url".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("Invalid collector URL 'not a url'"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let source = serde_json::from_str::<u32>("{").unwrap_err();
        let err: DeliveryError = source.into();
        assert!(matches!(err, DeliveryError::Serialization { .. }));
    }
}
