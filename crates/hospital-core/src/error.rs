//! Error types for hospital client operations.
//!
//! [`Error`] covers everything the transport, resolver and router can fail
//! with. [`SaveError`] is the tagged failure an edit session hands back to
//! its caller after an unsuccessful `save()`.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in hospital client operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The request never produced an HTTP response (connect, timeout, body).
    #[error("Transport error: {message}")]
    Transport {
        /// What was being attempted.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Problem title or message reported by the backend.
        message: String,
        /// Machine-readable error key (e.g. `idexists`), if reported.
        error_key: Option<String>,
    },

    /// Entity not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No route matches the requested path.
    #[error("Unknown route: {0}")]
    UnknownRoute(String),
}

impl Error {
    /// Create a transport error without an underlying cause.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a transport error wrapping its cause.
    pub fn transport_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a status error.
    pub fn status(status: u16, msg: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: msg.into(),
            error_key: None,
        }
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// HTTP status carried by this error, if it came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error means the requested entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || self.status_code() == Some(404)
    }

    /// Whether repeating the same request could succeed.
    ///
    /// Transport failures, 429 and 5xx responses are retryable; everything
    /// else reflects the request itself and will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias using the crate's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a `save()` did not go through.
///
/// The edit session stays open in every case; the variant tells the caller
/// what to show next to the form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    /// The backend rejected the entity's content (400/422).
    #[error("Validation failed: {message}")]
    Validation {
        /// Backend message.
        message: String,
        /// Machine-readable error key, if reported.
        error_key: Option<String>,
    },

    /// The entity changed or clashes with another record (409).
    #[error("Conflict: {message}")]
    Conflict {
        /// Backend message.
        message: String,
    },

    /// The backend could not be reached.
    #[error("Network error: {message}")]
    Network {
        /// Description of the failure.
        message: String,
    },

    /// Any other non-success response.
    #[error("Rejected with HTTP {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Backend message.
        message: String,
    },

    /// A previous `save()` on the same session has not completed yet.
    #[error("A save is already in progress")]
    InProgress,
}

impl From<Error> for SaveError {
    fn from(err: Error) -> Self {
        match err {
            Error::Status {
                status: 400 | 422,
                message,
                error_key,
            } => Self::Validation { message, error_key },
            Error::Status {
                status: 409,
                message,
                ..
            } => Self::Conflict { message },
            Error::Status {
                status, message, ..
            } => Self::Rejected { status, message },
            Error::InvalidData(message) => Self::Validation {
                message,
                error_key: None,
            },
            other => Self::Network {
                message: other.to_string(),
            },
        }
    }
}
