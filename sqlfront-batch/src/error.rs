//! Error types for batched command aggregation.

use thiserror::Error;

use crate::command::CommandType;

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;

/// Errors from building, dispatching or reading a command batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// A command was appended without text.
    #[error("command text must be set before the command can be batched")]
    EmptyCommandText,

    /// The command type cannot take part in a batch.
    #[error("command type {0:?} is not supported in a batch")]
    UnsupportedCommandType(CommandType),

    /// A parameter name does not follow identifier rules.
    #[error("invalid parameter name '{0}'")]
    InvalidParameterName(String),

    /// The command set was disposed.
    #[error("cannot access a disposed command set")]
    ObjectDisposed,

    /// Outcomes were requested before the batch was dispatched.
    #[error("the batch has not been dispatched")]
    NotDispatched,

    /// No command was appended under the ordinal.
    #[error("command ordinal {ordinal} is out of range for a batch of {count}")]
    OrdinalOutOfRange {
        /// Requested ordinal.
        ordinal: usize,
        /// Number of commands in the batch.
        count: usize,
    },

    /// The command has no parameter at the index.
    #[error("parameter {parameter} is out of range for command {command} with {count} parameters")]
    ParameterOutOfRange {
        /// Command ordinal.
        command: usize,
        /// Requested parameter index.
        parameter: usize,
        /// Number of parameters on the command.
        count: usize,
    },

    /// The executor rejected the batch as a whole.
    #[error("batch dispatch failed: {0}")]
    DispatchFailed(String),
}

impl BatchError {
    /// Create a dispatch failure.
    pub fn dispatch(message: impl Into<String>) -> Self {
        Self::DispatchFailed(message.into())
    }

    /// Check if this error rejected an append and left the batch unchanged.
    pub fn is_append_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyCommandText | Self::UnsupportedCommandType(_) | Self::InvalidParameterName(_)
        )
    }
}

/// A server error attributed to one command of a dispatched batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("error {number} (class {class}): {message}")]
pub struct ExecutionError {
    /// Server error number.
    pub number: i32,
    /// Severity class.
    pub class: u8,
    /// Server message text.
    pub message: String,
}

impl ExecutionError {
    /// Create an execution error.
    pub fn new(number: i32, class: u8, message: impl Into<String>) -> Self {
        Self {
            number,
            class,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            BatchError::InvalidParameterName("@1bad".to_string()).to_string(),
            "invalid parameter name '@1bad'"
        );
        assert_eq!(
            BatchError::OrdinalOutOfRange { ordinal: 3, count: 2 }.to_string(),
            "command ordinal 3 is out of range for a batch of 2"
        );
        assert_eq!(
            ExecutionError::new(2627, 14, "Violation of PRIMARY KEY constraint").to_string(),
            "error 2627 (class 14): Violation of PRIMARY KEY constraint"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(BatchError::EmptyCommandText.is_append_error());
        assert!(BatchError::UnsupportedCommandType(CommandType::TableDirect).is_append_error());
        assert!(!BatchError::ObjectDisposed.is_append_error());
        assert!(!BatchError::dispatch("connection closed").is_append_error());
    }
}
