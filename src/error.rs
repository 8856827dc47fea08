use thiserror::Error;

/// Error categorization for the GSA compatibility adapter
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (permanent failures)
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    // Search engine transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search engine error: {status} - {message}")]
    SearchEngine { status: u16, message: String },

    // Response encoding errors
    #[error("Unsupported encoding: {encoding}")]
    UnsupportedEncoding { encoding: String },

    // Client errors
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    // General service error
    #[error("Service error: {0}")]
    Service(String),
}

/// Coarse classification used when mapping errors onto HTTP responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The inbound request cannot be served as asked
    Client,
    /// The search engine failed or returned something unusable
    Upstream,
    /// Anything originating inside the adapter
    Internal,
}

impl Error {
    /// Categorize error for response mapping
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedEncoding { .. } | Self::InvalidInput { .. } => ErrorCategory::Client,

            Self::Http(_) | Self::SearchEngine { .. } | Self::Parse { .. } | Self::Serde(_) => {
                ErrorCategory::Upstream
            }

            Self::Config(_) | Self::Io(_) | Self::Service(_) => ErrorCategory::Internal,
        }
    }

    /// Shorthand for an `InvalidInput` error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_encoding_is_client_error() {
        let err = Error::UnsupportedEncoding {
            encoding: "Shift_JIS".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Client);
        assert_eq!(err.to_string(), "Unsupported encoding: Shift_JIS");
    }

    #[test]
    fn test_engine_errors_are_upstream() {
        let err = Error::SearchEngine {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Upstream);

        let err = Error::Parse {
            context: "engine".to_string(),
            message: "bad json".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Upstream);
    }

    #[test]
    fn test_service_error_is_internal() {
        let err = Error::Service("boom".to_string());
        assert_eq!(err.category(), ErrorCategory::Internal);
    }

    #[test]
    fn test_invalid_input_helper() {
        let err = Error::invalid_input("gsa.path_prefix", "must start with '/'");
        assert_eq!(
            err.to_string(),
            "Invalid input: gsa.path_prefix - must start with '/'"
        );
    }
}
