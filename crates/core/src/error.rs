//! Error types for Stowage collections.

use crate::value::Value;
use alloc::string::String;
use core::fmt;

/// Result type alias for Stowage operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for collection derivation, materialization and notification.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A filter descriptor could not be applied.
    InvalidFilter {
        message: String,
    },
    /// A sort descriptor is malformed.
    InvalidSort {
        message: String,
    },
    /// A range has `end` before `start`.
    InvalidRange {
        start: usize,
        end: usize,
    },
    /// The backend failed to produce data.
    Backend {
        message: String,
    },
    /// One or more listeners failed while an event was dispatched.
    Listener {
        event: String,
        failures: usize,
        message: String,
    },
    /// Record not found.
    NotFound {
        key: Value,
    },
    /// Invalid operation.
    InvalidOperation {
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidFilter { message } => write!(f, "Invalid filter: {}", message),
            Error::InvalidSort { message } => write!(f, "Invalid sort: {}", message),
            Error::InvalidRange { start, end } => {
                write!(f, "Invalid range: end {} is before start {}", end, start)
            }
            Error::Backend { message } => write!(f, "Backend failure: {}", message),
            Error::Listener {
                event,
                failures,
                message,
            } => write!(
                f,
                "{} listener(s) failed during '{}' dispatch: {}",
                failures, event, message
            ),
            Error::NotFound { key } => write!(f, "Record not found: {}", key),
            Error::InvalidOperation { message } => write!(f, "Invalid operation: {}", message),
        }
    }
}

impl Error {
    /// Creates an invalid filter error.
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Error::InvalidFilter {
            message: message.into(),
        }
    }

    /// Creates an invalid sort error.
    pub fn invalid_sort(message: impl Into<String>) -> Self {
        Error::InvalidSort {
            message: message.into(),
        }
    }

    /// Creates an invalid range error.
    pub fn invalid_range(start: usize, end: usize) -> Self {
        Error::InvalidRange { start, end }
    }

    /// Creates a backend failure.
    pub fn backend(message: impl Into<String>) -> Self {
        Error::Backend {
            message: message.into(),
        }
    }

    /// Creates a listener failure report.
    pub fn listener(event: impl Into<String>, failures: usize, message: impl Into<String>) -> Self {
        Error::Listener {
            event: event.into(),
            failures,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(key: Value) -> Self {
        Error::NotFound { key }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for errors caused by malformed derivation input.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidFilter { .. } | Error::InvalidSort { .. } | Error::InvalidRange { .. }
        )
    }
}
