//! Error types for connection option resolution.

use thiserror::Error;

/// Result type for option resolution.
pub type OptionsResult<T> = Result<T, OptionsError>;

/// Errors produced while turning a connection string into resolved options.
///
/// Every variant is terminal: resolution either produces a complete
/// [`ResolvedConnectionOptions`](crate::ResolvedConnectionOptions) or one of
/// these. Keys are always reported in their canonical spelling, except for
/// [`OptionsError::UnknownOption`] which echoes what the caller wrote.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    /// The key is neither a canonical option name nor a known synonym.
    #[error("keyword not supported: '{0}'")]
    UnknownOption(String),

    /// The value could not be coerced or is out of range.
    #[error("invalid value for key '{key}'")]
    InvalidOptionValue {
        /// Canonical key.
        key: &'static str,
    },

    /// The value exceeds the protocol limit for the key.
    #[error("the value's length for key '{key}' exceeds its limit of '{limit}'")]
    InvalidOptionValueLength {
        /// Canonical key.
        key: &'static str,
        /// Maximum length in characters.
        limit: usize,
    },

    /// A key requires another key to carry a value.
    #[error("the '{key}' option requires the '{depends_on}' option to be set")]
    MissingDependentOption {
        /// Canonical key that was set.
        key: &'static str,
        /// Canonical key that must also be set.
        depends_on: &'static str,
    },

    /// Two options cannot be combined.
    #[error("cannot use '{a}' with '{b}'")]
    IncompatibleOptions {
        /// First canonical key.
        a: &'static str,
        /// Second canonical key.
        b: &'static str,
    },

    /// A context connection was requested in a way the host does not allow.
    #[error("context connection violation: {0}")]
    ContextModeViolation(ContextViolation),

    /// The raw string does not follow the `key=value;` grammar.
    #[error("malformed connection string starting at index {position}")]
    MalformedConnectionString {
        /// Byte offset where parsing failed.
        position: usize,
    },

    /// Environment variable holding the connection string was not found.
    #[error("environment variable not found: {0}")]
    EnvNotFound(String),
}

/// The specific way a context connection was misused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextViolation {
    /// The host is not running inside the database engine.
    OutOfProcess,
    /// Another keyword accompanies `context connection`.
    DisallowedKeyword(&'static str),
    /// Context connections require type system 2005 or later.
    TypeSystem2000,
}

impl std::fmt::Display for ContextViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfProcess => write!(f, "the context connection is only available in process"),
            Self::DisallowedKeyword(key) => write!(
                f,
                "'{key}' cannot be used with 'context connection'; only 'type system version' is allowed"
            ),
            Self::TypeSystem2000 => write!(
                f,
                "the context connection does not support 'type system version=SQL Server 2000'"
            ),
        }
    }
}

impl OptionsError {
    /// Create an invalid value error.
    pub fn invalid_value(key: &'static str) -> Self {
        Self::InvalidOptionValue { key }
    }

    /// Create a value length error.
    pub fn value_length(key: &'static str, limit: usize) -> Self {
        Self::InvalidOptionValueLength { key, limit }
    }

    /// Create an incompatible options error.
    pub fn incompatible(a: &'static str, b: &'static str) -> Self {
        Self::IncompatibleOptions { a, b }
    }

    /// Create a missing dependent option error.
    pub fn missing_dependent(key: &'static str, depends_on: &'static str) -> Self {
        Self::MissingDependentOption { key, depends_on }
    }

    /// The canonical key the error is about, if it names exactly one.
    pub fn key(&self) -> Option<&'static str> {
        match self {
            Self::InvalidOptionValue { key }
            | Self::InvalidOptionValueLength { key, .. }
            | Self::MissingDependentOption { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Check if this error came from validating a well-formed string.
    pub fn is_validation_error(&self) -> bool {
        !matches!(
            self,
            Self::MalformedConnectionString { .. } | Self::EnvNotFound(_)
        )
    }
}
