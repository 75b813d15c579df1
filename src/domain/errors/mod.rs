// Domain errors - Error types raised by ports and domain rules

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    BadArgs(String),
    /// External process could not be started or awaited
    ProcessFailed(String),
    /// File system operation failed
    FsFail(String),
    /// Record conflicts with an existing one
    Conflict(String),
    /// Record store could not be read or written
    StoreFail(String),
    /// Configuration is unusable
    InvalidConfig(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::ProcessFailed(msg) => write!(f, "Process failed: {}", msg),
            DomainError::FsFail(msg) => write!(f, "File system error: {}", msg),
            DomainError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            DomainError::StoreFail(msg) => write!(f, "Store error: {}", msg),
            DomainError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::FsFail(err.to_string())
    }
}
