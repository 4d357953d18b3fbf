use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single `(code, message)` pair from an upstream error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// A single configuration problem found by `Config::validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_display<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unified error type for tweetline.
#[derive(Error, Debug, Clone)]
pub enum TweetlineError {
    /// The request could not be sent or the response could not be received
    #[error("Transport error: {0}")]
    Transport(String),

    /// Unsupported content-encoding or corrupt compressed data
    #[error("Decode error: {0}")]
    Decode(String),

    /// Upstream answered with an error envelope
    #[error("API error: {}", join_display(.entries))]
    Api { entries: Vec<ErrorEntry> },

    /// Upload went through but no media id could be extracted
    #[error("Upload error: {0}")]
    Upload(String),

    /// Invalid argument supplied by the caller
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Resource busy, e.g. a stream session is already running
    #[error("Resource temporarily unavailable: {0}")]
    NotReady(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Parse/serialization error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Validation error with messages
    #[error("Validation error: {}", join_display(.0))]
    ValidationError(Vec<ValidationIssue>),
}

impl TweetlineError {
    /// Check if a caller-side retry could succeed. The crate itself never retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, TweetlineError::Transport(_))
    }

    /// Error entries reported by the API, empty for every other variant.
    pub fn api_entries(&self) -> &[ErrorEntry] {
        match self {
            TweetlineError::Api { entries } => entries,
            _ => &[],
        }
    }
}

// === Conversion Implementations ===

macro_rules! impl_from_error {
    ($err_type:ty, $arm:pat => $body:expr) => {
        impl From<$err_type> for TweetlineError {
            fn from(err: $err_type) -> Self {
                match err {
                    $arm => $body,
                }
            }
        }
    };
}

impl_from_error!(std::io::Error, e => match e.kind() {
    std::io::ErrorKind::InvalidInput => TweetlineError::InvalidArgument(e.to_string()),
    _ => TweetlineError::Io(e.to_string()),
});

impl_from_error!(reqwest::Error, e => if e.is_timeout() {
    TweetlineError::Transport(format!("timed out: {}", e))
} else if e.is_connect() {
    TweetlineError::Transport(format!("connection failed: {}", e))
} else {
    TweetlineError::Transport(e.to_string())
});

impl_from_error!(serde_json::Error, e => TweetlineError::Parse(e.to_string()));
impl_from_error!(toml::de::Error, e => TweetlineError::Parse(e.to_string()));

/// Result type alias for operations that can fail with TweetlineError.
pub type TweetlineResult<T> = Result<T, TweetlineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        assert!(TweetlineError::Transport("reset".to_string()).is_transient());

        assert!(!TweetlineError::Decode("bad gzip".to_string()).is_transient());
        assert!(!TweetlineError::Api { entries: vec![] }.is_transient());
        assert!(!TweetlineError::Upload("no id".to_string()).is_transient());
        assert!(!TweetlineError::NotReady("busy".to_string()).is_transient());
    }

    #[test]
    fn test_api_entries() {
        let err = TweetlineError::Api {
            entries: vec![ErrorEntry {
                code: 88,
                message: "Rate limit exceeded".to_string(),
            }],
        };
        assert_eq!(err.api_entries().len(), 1);
        assert_eq!(err.api_entries()[0].code, 88);

        assert!(TweetlineError::Decode("x".to_string())
            .api_entries()
            .is_empty());
    }

    #[test]
    fn test_display_formatting() {
        let err = TweetlineError::Api {
            entries: vec![
                ErrorEntry {
                    code: 32,
                    message: "Could not authenticate you.".to_string(),
                },
                ErrorEntry {
                    code: 135,
                    message: "Timestamp out of bounds.".to_string(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "API error: [32] Could not authenticate you.; [135] Timestamp out of bounds."
        );

        let err = TweetlineError::ValidationError(vec![ValidationIssue {
            field: "logging.level".to_string(),
            message: "invalid".to_string(),
        }]);
        assert_eq!(err.to_string(), "Validation error: logging.level: invalid");
    }

    #[test]
    fn test_io_error_conversion() {
        let err: TweetlineError =
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "bad").into();
        assert!(matches!(err, TweetlineError::InvalidArgument(_)));

        let err: TweetlineError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, TweetlineError::Io(_)));
    }
}
