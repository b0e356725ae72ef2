//! # sqlfront-options
//!
//! Connection string handling for the sqlfront SQL Server client.
//!
//! This crate provides:
//! - The option grammar: canonical keys, synonyms and defaults
//! - A tokenizer producing an ordered key/value table
//! - Typed option values (authentication modes, intents, type systems)
//! - A resolver that coerces, defaults and cross-validates every option
//! - Host collaborators for policy, data directory and machine name lookups
//!
//! ## Example
//!
//! ```rust
//! use sqlfront_options::{Resolver, StaticHost};
//!
//! let resolver = Resolver::with_host(StaticHost::new());
//! let opts = resolver
//!     .resolve("Server=tcp:db.example,1433;Database=sales;UID=app;PWD=secret;Encrypt=yes")
//!     .unwrap();
//!
//! assert_eq!(opts.data_source(), "tcp:db.example,1433");
//! assert_eq!(opts.user_id(), "app");
//! assert_eq!(opts.to_redacted_string(), "Data Source=tcp:db.example,1433;Initial Catalog=sales;User ID=app;Encrypt=yes");
//! ```

pub mod attach;
pub mod error;
pub mod grammar;
pub mod host;
pub mod keyvalue;
pub mod options;
pub mod resolver;
pub mod values;

pub use attach::{expand_data_directory, is_local_host};
pub use error::{ContextViolation, OptionsError, OptionsResult};
pub use grammar::OptionSpec;
pub use host::{HostEnvironment, StaticHost, SystemHost};
pub use keyvalue::KeyValueTable;
pub use options::ResolvedConnectionOptions;
pub use resolver::{AuthenticationRule, Credentials, Resolver};
pub use values::{
    ApplicationIntent, AttestationProtocol, AuthenticationMethod, ColumnEncryptionSetting,
    IpAddressPreference, NetworkProtocol, PoolBlockingPeriod, TransactionBinding, TypeSystem,
};
