//! Error types for aceql-link.
//!
//! Every failure surfaced by the crate is classified into exactly one
//! [`ErrorKind`]; callers never see a raw `reqwest`/`io`/`serde_json` error.

use thiserror::Error;

/// Result type for aceql-link operations
pub type Result<T> = std::result::Result<T, AceQlLinkError>;

/// Machine-checkable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or invalid input, detected before any network call
    Configuration,
    /// The call never reached a decodable response
    Transport,
    /// The server answered with a decoded error envelope
    Server,
    /// Well-formed response that violated an expected invariant
    Protocol,
    /// A raw column value could not be coerced to the requested type
    DataFormat,
    /// Caller-requested abort of an in-flight transfer
    Cancelled,
    /// Local temp file or caller-supplied writer failed
    LocalIo,
}

/// Errors that can occur while talking to an AceQL server.
#[derive(Error, Debug)]
pub enum AceQlLinkError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Login was rejected by the server.
    #[error("Authentication failed: {message}")]
    AuthenticationError {
        message: String,
        error_type: i32,
        stack_trace: Option<String>,
        http_status_code: u16,
    },

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Server error ({http_status_code}): {message}")]
    ServerError {
        message: String,
        error_type: i32,
        stack_trace: Option<String>,
        http_status_code: u16,
        http_status_message: String,
    },

    #[error("Protocol error: {message}")]
    ProtocolError { message: String, error_type: i32 },

    #[error("Invalid column: {0}")]
    InvalidColumn(String),

    #[error("{0} is closed")]
    ClosedResource(String),

    #[error("Data format error: {0}")]
    DataFormatError(String),

    #[error("Transfer cancelled")]
    Cancelled,

    #[error("Local I/O error: {0}")]
    LocalIoError(String),
}

impl AceQlLinkError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
            error_type: 0,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError(message.into())
    }

    /// Fault on the local side of a copy, as opposed to the network side.
    pub(crate) fn local_io(err: std::io::Error) -> Self {
        Self::LocalIoError(err.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigurationError(_) => ErrorKind::Configuration,
            Self::AuthenticationError { .. } | Self::ServerError { .. } => ErrorKind::Server,
            Self::TransportError(_) => ErrorKind::Transport,
            Self::ProtocolError { .. } | Self::InvalidColumn(_) | Self::ClosedResource(_) => {
                ErrorKind::Protocol
            },
            Self::DataFormatError(_) => ErrorKind::DataFormat,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::LocalIoError(_) => ErrorKind::LocalIo,
        }
    }

    /// Server-side error code, 0 when the error was raised client-side.
    pub fn error_type(&self) -> i32 {
        match self {
            Self::AuthenticationError { error_type, .. }
            | Self::ServerError { error_type, .. }
            | Self::ProtocolError { error_type, .. } => *error_type,
            _ => 0,
        }
    }

    /// Remote stack trace, informational only.
    pub fn stack_trace(&self) -> Option<&str> {
        match self {
            Self::AuthenticationError { stack_trace, .. } | Self::ServerError { stack_trace, .. } => {
                stack_trace.as_deref()
            },
            _ => None,
        }
    }

    /// HTTP status of the round trip that produced this error, if any.
    pub fn http_status_code(&self) -> Option<u16> {
        match self {
            Self::AuthenticationError {
                http_status_code, ..
            }
            | Self::ServerError {
                http_status_code, ..
            } => Some(*http_status_code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AceQlLinkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AceQlLinkError::TransportError(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            AceQlLinkError::TransportError(format!("Connection failed: {}", err))
        } else {
            AceQlLinkError::TransportError(err.to_string())
        }
    }
}

impl From<std::io::Error> for AceQlLinkError {
    fn from(err: std::io::Error) -> Self {
        AceQlLinkError::TransportError(err.to_string())
    }
}

impl From<url::ParseError> for AceQlLinkError {
    fn from(err: url::ParseError) -> Self {
        AceQlLinkError::TransportError(format!("Malformed URL: {}", err))
    }
}

impl From<serde_json::Error> for AceQlLinkError {
    fn from(err: serde_json::Error) -> Self {
        AceQlLinkError::protocol(format!("Invalid JSON document: {}", err))
    }
}
