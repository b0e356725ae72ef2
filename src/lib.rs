//! # sqlfront
//!
//! Client-side building blocks for talking to SQL Server.
//!
//! sqlfront provides:
//! - Connection string resolution: synonyms, defaults, typed values and
//!   cross-field validation into an immutable, hashable options value
//! - Batched commands: many commands sent in one round trip, with results
//!   read back per command
//! - A logging bootstrap driven by `SQLFRONT_*` environment variables
//!
//! ## Quick Start
//!
//! ```rust
//! use sqlfront::prelude::*;
//!
//! let resolver = Resolver::with_host(StaticHost::new());
//! let opts = resolver.resolve("Server=db;Database=orders;Integrated Security=SSPI").unwrap();
//! assert!(opts.integrated_security());
//!
//! let mut batch = CommandSet::new();
//! batch.set_command_timeout(opts.command_timeout() as u32).unwrap();
//! let ordinal = batch
//!     .append(&Command::text("UPDATE orders SET shipped = 1 WHERE id = @id").param(SqlParameter::new("@id", 10)))
//!     .unwrap();
//! assert_eq!(ordinal, 0);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod logging;

/// Connection string grammar, resolution and resolved options.
pub mod options {
    pub use sqlfront_options::*;
}

/// Batched command aggregation.
pub mod batch {
    pub use sqlfront_batch::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::batch::{
        BatchError, BatchExecutor, BatchOutcomes, BatchResult, Command, CommandSet, CommandType,
        ExecutionContext, ExecutionHandle, OperationOutcome, SqlParameter,
    };
    pub use crate::options::{
        AuthenticationMethod, HostEnvironment, OptionsError, OptionsResult, ResolvedConnectionOptions,
        Resolver, StaticHost, SystemHost,
    };
}

// Re-export key types at the crate root
pub use batch::{BatchError, CommandSet};
pub use options::{OptionsError, ResolvedConnectionOptions, Resolver};
