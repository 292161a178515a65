//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Value argument is not an integer
    #[error("Invalid value '{value}': expected an integer")]
    InvalidValue { value: String },

    /// Input line does not follow `name value [timestamp]`
    #[error("Invalid input line {line_no}: {message}")]
    InvalidLine { line_no: usize, message: String },

    /// Dispatcher did not shut down cleanly
    #[error("Error during shutdown: {0}")]
    Shutdown(#[from] dispatcher::DispatcherError),

    /// Configuration or input contract violated
    #[error(transparent)]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_value(value: impl Into<String>) -> Self {
        Self::InvalidValue {
            value: value.into(),
        }
    }

    pub fn invalid_line(line_no: usize, message: impl Into<String>) -> Self {
        Self::InvalidLine {
            line_no,
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
