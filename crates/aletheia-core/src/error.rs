//! Error types for core operations.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or parsing bridge resources.
#[derive(Error, Debug)]
pub enum Error {
    /// Mapping resource could not be read.
    #[error("Failed to read mapping resource from {path}: {source}")]
    MappingRead {
        /// Path to the mapping resource.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Mapping resource could not be parsed as YAML.
    #[error("Failed to parse mapping resource: {source}")]
    MappingParse {
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A mapping entry is structurally invalid.
    #[error("Invalid mapping entry '{entry}': {reason}")]
    InvalidMapping {
        /// Event type key of the offending entry.
        entry: String,
        /// Reason the entry is invalid.
        reason: String,
    },
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::MappingParse { source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_mapping() {
        let err = Error::InvalidMapping {
            entry: "LOGIN".to_string(),
            reason: "missing code".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid mapping entry 'LOGIN': missing code"
        );
    }

    #[test]
    fn test_error_from_yaml() {
        let yaml_err = serde_yaml::from_str::<u32>("not a number").unwrap_err();
        let err: Error = yaml_err.into();
        assert!(err.to_string().starts_with("Failed to parse mapping resource"));
    }
}
