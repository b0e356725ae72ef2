//! Commands appended by callers and the descriptors kept for dispatch.

use crate::parameter::{ParameterDirection, ParameterSnapshot, SqlParameter};

/// How command text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandType {
    /// A SQL statement.
    #[default]
    Text,
    /// The name of a stored procedure.
    StoredProcedure,
    /// The name of a table. Not supported in batches.
    TableDirect,
}

/// Column encryption behaviour for a single command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandColumnEncryption {
    /// Follow the connection's setting.
    #[default]
    UseConnectionSetting,
    /// Encrypt parameters and decrypt results.
    Enabled,
    /// Decrypt results only.
    ResultSetOnly,
    /// No encryption.
    Disabled,
}

/// A command as written by the caller.
///
/// ```rust
/// use sqlfront_batch::{Command, CommandType, SqlParameter};
///
/// let cmd = Command::procedure("dbo.AddOrder")
///     .param(SqlParameter::new("@customer", 42))
///     .param(SqlParameter::return_value("@rc"));
/// assert_eq!(cmd.command_type, CommandType::StoredProcedure);
/// assert_eq!(cmd.parameters.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Command {
    /// Statement text or procedure name.
    pub text: String,
    /// Parameters in declaration order.
    pub parameters: Vec<SqlParameter>,
    /// How the text is interpreted.
    pub command_type: CommandType,
    /// Column encryption behaviour.
    pub encryption: CommandColumnEncryption,
}

impl Command {
    /// Create a text command.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Create a stored procedure command.
    pub fn procedure(name: impl Into<String>) -> Self {
        Self::text(name).command_type(CommandType::StoredProcedure)
    }

    /// Add a parameter.
    pub fn param(mut self, param: SqlParameter) -> Self {
        self.parameters.push(param);
        self
    }

    /// Add several parameters.
    pub fn params(mut self, params: impl IntoIterator<Item = SqlParameter>) -> Self {
        self.parameters.extend(params);
        self
    }

    /// Set the command type.
    pub fn command_type(mut self, command_type: CommandType) -> Self {
        self.command_type = command_type;
        self
    }

    /// Set the column encryption behaviour.
    pub fn encryption(mut self, encryption: CommandColumnEncryption) -> Self {
        self.encryption = encryption;
        self
    }
}

/// A batched command. Owned by the command set and never changed after append.
#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    pub(crate) text: String,
    pub(crate) parameters: Vec<ParameterSnapshot>,
    pub(crate) command_type: CommandType,
    pub(crate) return_parameter_index: Option<usize>,
    pub(crate) encryption: CommandColumnEncryption,
}

impl CommandDescriptor {
    pub(crate) fn new(
        text: String,
        parameters: Vec<ParameterSnapshot>,
        command_type: CommandType,
        encryption: CommandColumnEncryption,
    ) -> Self {
        let return_parameter_index = parameters
            .iter()
            .position(|p| p.direction() == ParameterDirection::ReturnValue);
        Self {
            text,
            parameters,
            command_type,
            return_parameter_index,
            encryption,
        }
    }

    /// Statement text or procedure name.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parameter snapshots in declaration order.
    pub fn parameters(&self) -> &[ParameterSnapshot] {
        &self.parameters
    }

    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    /// Index of the first return value parameter.
    pub fn return_parameter_index(&self) -> Option<usize> {
        self.return_parameter_index
    }

    pub fn encryption(&self) -> CommandColumnEncryption {
        self.encryption
    }
}

/// Append one part of a multipart procedure name.
///
/// A part that already starts with `[` and holds an odd number of `]` is
/// taken as escaped. Anything else is bracket-quoted with `]` doubled.
/// Empty parts are skipped.
///
/// ```rust
/// use sqlfront_batch::build_stored_procedure_name;
///
/// let mut name = String::new();
/// build_stored_procedure_name(&mut name, "[dbo]");
/// name.push('.');
/// build_stored_procedure_name(&mut name, "odd]name");
/// assert_eq!(name, "[dbo].[odd]]name]");
/// ```
pub fn build_stored_procedure_name(out: &mut String, part: &str) {
    if part.is_empty() {
        return;
    }
    if part.starts_with('[') && part.matches(']').count() % 2 == 1 {
        out.push_str(part);
        return;
    }
    out.push('[');
    out.push_str(&part.replace(']', "]]"));
    out.push(']');
}
