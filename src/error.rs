//! Error types and handling for Relais

/// Result type alias for Relais operations
pub type Result<T> = std::result::Result<T, RelaisError>;

/// Error types for the Relais relay core
#[derive(Debug, thiserror::Error)]
pub enum RelaisError {
    /// I/O related errors (sockets, polling)
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// A cursor advance exceeded the window's available region
    #[error("Insufficient space: requested {requested}, available {available}")]
    InsufficientSpace { requested: usize, available: usize },

    /// Registering or updating a descriptor with the dispatcher failed
    #[error("Registration error: {message}")]
    Registration { message: String },

    /// A connection-level failure (dial, reset, unexpected close)
    #[error("Connection error: {message}")]
    Connection { message: String },
}

impl RelaisError {
    /// Create an I/O error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Io {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create an insufficient space error
    pub fn insufficient_space(requested: usize, available: usize) -> Self {
        Self::InsufficientSpace {
            requested,
            available,
        }
    }

    /// Create a registration error
    pub fn registration(message: impl Into<String>) -> Self {
        Self::Registration {
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }
}

// Convert from common error types
impl From<std::io::Error> for RelaisError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err, "I/O operation failed")
    }
}
