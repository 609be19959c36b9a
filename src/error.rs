//! Newsreel error types

/// Newsreel error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Client-side errors
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("invalid authentication token")]
    Auth,

    #[error("artifact not found: {0}")]
    NotFound(String),

    // Capability/engine errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("engine error: {0}")]
    Engine(String),

    #[error("empty output from engine")]
    EmptyOutput,

    /// Every engine tier failed, including the fallback.
    #[error("all engines failed: {0}")]
    EnginesExhausted(String),

    #[error("service not ready")]
    NotReady,

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Convenience constructor for field-level validation failures.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether this error should trigger the fallback engine tier.
    ///
    /// Transport failures, upstream server errors (5xx / 429), and empty or
    /// malformed engine output are recoverable by a lower-capability engine.
    /// Upstream auth rejections are terminal: the fallback shares the same
    /// credentials and would fail identically.
    pub fn is_fallback_trigger(&self) -> bool {
        match self {
            Error::Http(_) | Error::Engine(_) | Error::EmptyOutput => true,
            Error::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

/// Result type alias for newsreel operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_trigger_fallback() {
        assert!(Error::Http("connection refused".into()).is_fallback_trigger());
        assert!(Error::Engine("synthesis failed".into()).is_fallback_trigger());
        assert!(Error::EmptyOutput.is_fallback_trigger());
    }

    #[test]
    fn upstream_server_errors_trigger_fallback() {
        assert!(
            Error::Api {
                status: 503,
                message: "model loading".into()
            }
            .is_fallback_trigger()
        );
        assert!(
            Error::Api {
                status: 429,
                message: "rate limited".into()
            }
            .is_fallback_trigger()
        );
    }

    #[test]
    fn upstream_client_errors_are_terminal() {
        assert!(
            !Error::Api {
                status: 401,
                message: "bad key".into()
            }
            .is_fallback_trigger()
        );
        assert!(!Error::Auth.is_fallback_trigger());
        assert!(!Error::validation("title", "too short").is_fallback_trigger());
    }
}
