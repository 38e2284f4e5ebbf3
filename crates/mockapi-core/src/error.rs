//! Error types for the MockAPI console.

use thiserror::Error;

/// A shared error type for the entire MockAPI console.
///
/// Transport failures, HTTP status failures and local storage failures all
/// funnel into this enum so that callers can branch on the kind of failure
/// (most importantly [`MockApiError::is_unauthorized`]) without inspecting
/// strings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MockApiError {
    /// The credential exchange was rejected by the backend.
    #[error("Invalid credentials: {detail}")]
    InvalidCredentials { detail: String },

    /// The backend could not be reached, or the transport failed mid-flight.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered 401 or 403.
    #[error("Unauthorized ({status}){}", detail_suffix(.detail))]
    Unauthorized { status: u16, detail: Option<String> },

    /// Any other non-success HTTP status.
    #[error("HTTP error ({status}){}", detail_suffix(.detail))]
    Http { status: u16, detail: Option<String> },

    /// Durable storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(": {}", detail),
        None => String::new(),
    }
}

impl MockApiError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an InvalidCredentials error
    pub fn invalid_credentials(detail: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            detail: detail.into(),
        }
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates the error matching an HTTP status code.
    ///
    /// 401 and 403 become [`MockApiError::Unauthorized`], everything else
    /// becomes [`MockApiError::Http`].
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        match status {
            401 | 403 => Self::Unauthorized { status, detail },
            _ => Self::Http { status, detail },
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this error must invalidate the current session (401/403).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Check if this is a Network error
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Check if this is an InvalidCredentials error
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, Self::InvalidCredentials { .. })
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Backend-provided `detail` text, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::InvalidCredentials { detail } => Some(detail.as_str()),
            Self::Unauthorized { detail, .. } | Self::Http { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Message suitable for showing to a user.
    ///
    /// Uses the backend's `detail` verbatim when there is one, otherwise the
    /// caller's generic message.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string())
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for MockApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MockApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MockApiError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for MockApiError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, MockApiError>`.
pub type Result<T> = std::result::Result<T, MockApiError>;
