//! Error types for quiztrack
//!
//! This module defines the error types used by the tracker, the request
//! client, and the dashboard, using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for quiztrack operations
///
/// Covers configuration problems, transport failures, payload decoding,
/// page model lookups, and dashboard state errors.
#[derive(Error, Debug)]
pub enum QuizTrackError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend answered with a non-2xx status
    #[error("HTTP {status}: {reason}")]
    HttpStatus {
        /// Numeric status code
        status: u16,
        /// Canonical reason phrase, or empty when unknown
        reason: String,
    },

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Backend flagged the payload as an error
    #[error("API error: {0}")]
    Api(String),

    /// Selector string could not be parsed
    #[error("Invalid selector: {0}")]
    Selector(String),

    /// Page model lookup failed (missing element or target)
    #[error("Page error: {0}")]
    Page(String),

    /// Export or detail view requested before the first successful fetch
    #[error("No data to export")]
    NoSnapshot,

    /// Detail view requested for a slide the snapshot does not contain
    #[error("Unknown slide: {0}")]
    UnknownSlide(String),

    /// Chart instance bookkeeping failed
    #[error("Chart error: {0}")]
    Chart(String),

    /// Scenario file is malformed
    #[error("Scenario error: {0}")]
    Scenario(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for quiztrack operations
///
/// Uses `anyhow::Error` so callers can attach context while propagating.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = QuizTrackError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_http_status_display() {
        let error = QuizTrackError::HttpStatus {
            status: 503,
            reason: "Service Unavailable".to_string(),
        };
        assert_eq!(error.to_string(), "HTTP 503: Service Unavailable");
    }

    #[test]
    fn test_no_snapshot_display() {
        assert_eq!(QuizTrackError::NoSnapshot.to_string(), "No data to export");
    }

    #[test]
    fn test_api_error_display() {
        let error = QuizTrackError::Api("quiz not found".to_string());
        assert_eq!(error.to_string(), "API error: quiz not found");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: QuizTrackError = json_error.into();
        assert!(matches!(error, QuizTrackError::Serialization(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: QuizTrackError = io_error.into();
        assert!(matches!(error, QuizTrackError::Io(_)));
    }

    #[test]
    fn test_error_downcasts_through_anyhow() {
        let err: anyhow::Error = QuizTrackError::NoSnapshot.into();
        assert!(matches!(
            err.downcast_ref::<QuizTrackError>(),
            Some(QuizTrackError::NoSnapshot)
        ));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<QuizTrackError>();
    }
}
