//! Layered error definitions
//!
//! Categorized by source: config / data point / transport

use thiserror::Error;

/// Boxed error used for failures that are not classified as transport errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for configuration and input validation
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Input Errors =====
    /// Data point rejected at the boundary
    #[error("invalid data point '{name}': {reason}")]
    InvalidDataPoint { name: String, reason: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create invalid data point error
    pub fn invalid_data_point(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDataPoint {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Failure of a transport connection, at any stage.
///
/// Every variant is recoverable: the dispatcher keeps the batch and retries.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Opening the socket failed
    #[error("connect to {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// Turning the batch into bytes failed
    #[error("encode for {endpoint} failed: {source}")]
    Encode {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing or flushing the payload failed
    #[error("write to {endpoint} failed: {source}")]
    Write {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// The connection was closed by its owner
    #[error("transport to {endpoint} is closed")]
    Closed { endpoint: String },
}

impl TransportError {
    pub fn connect(endpoint: impl Into<String>, source: std::io::Error) -> Self {
        Self::Connect {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub fn encode(endpoint: impl Into<String>, source: std::io::Error) -> Self {
        Self::Encode {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub fn write(endpoint: impl Into<String>, source: std::io::Error) -> Self {
        Self::Write {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub fn closed(endpoint: impl Into<String>) -> Self {
        Self::Closed {
            endpoint: endpoint.into(),
        }
    }

    /// Endpoint the failure belongs to
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Connect { endpoint, .. }
            | Self::Encode { endpoint, .. }
            | Self::Write { endpoint, .. }
            | Self::Closed { endpoint } => endpoint,
        }
    }
}

/// Outcome of a failed `Transport::send`.
#[derive(Debug, Error)]
pub enum SendError {
    /// Classified transport failure, retried later
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Anything else; halts the dispatcher
    #[error("internal transport error: {0}")]
    Internal(#[source] BoxError),
}

impl SendError {
    /// Wrap an unclassified failure
    pub fn internal(error: impl Into<BoxError>) -> Self {
        Self::Internal(error.into())
    }

    /// Whether the dispatcher should keep the batch and try again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
