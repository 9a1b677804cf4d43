/// Error types for translation backends
///
/// Every failure of a detect or translate call surfaces as a `BackendError`.
/// The broker does not distinguish between the variants: any of them marks
/// the request being processed as failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset)
    #[error("Network error: {0}")]
    Network(String),
    /// The service answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    /// The service answered but the body was not what we expected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// Locale code rejected before contacting the service
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),
    /// Missing key, bad endpoint URL, or similar setup problem
    #[error("Configuration error: {0}")]
    Config(String),
    /// Backend id that no variant answers to
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs can carry credentials
        let err = err.without_url();
        if let Some(status) = err.status() {
            BackendError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            BackendError::InvalidResponse(err.to_string())
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;
