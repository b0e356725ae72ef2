//! # sqlfront-batch
//!
//! Batched command execution for the sqlfront SQL Server client.
//!
//! Many small commands are appended to a [`CommandSet`] and sent to the
//! server in one round trip. Each command keeps the ordinal it was appended
//! under, and its affected-row count and error are read back by that ordinal.
//!
//! This crate provides:
//! - Parameters snapshotted at append time, including array windows
//! - Parameter name validation against the server identifier grammar
//! - The [`BatchExecutor`] seam a transport implements
//! - The [`CommandSet`] aggregator
//!
//! ## Example
//!
//! ```rust
//! use sqlfront_batch::{Command, CommandSet, SqlParameter};
//!
//! let mut set = CommandSet::new();
//! let ordinal = set
//!     .append(&Command::procedure("dbo.Touch").param(SqlParameter::new("@id", 7)))
//!     .unwrap();
//! assert_eq!(ordinal, 0);
//!
//! assert!(set.append(&Command::text("SELECT @x").param(SqlParameter::new("@1x", 1))).is_err());
//! assert_eq!(set.command_count().unwrap(), 1);
//! ```

pub mod command;
pub mod command_set;
pub mod error;
pub mod executor;
pub mod parameter;
pub mod sanitize;

pub use command::{
    Command, CommandColumnEncryption, CommandDescriptor, CommandType, build_stored_procedure_name,
};
pub use command_set::CommandSet;
pub use error::{BatchError, BatchResult, ExecutionError};
pub use executor::{
    BatchExecutor, BatchOutcomes, DEFAULT_COMMAND_TIMEOUT, ExecutionContext, ExecutionHandle,
    OperationOutcome,
};
pub use parameter::{
    CloneValue, ParameterDirection, ParameterSnapshot, ParameterValue, SqlParameter,
};
pub use sanitize::{copy_window, is_valid_parameter_name, sanitize};
