//! Aggregation of many commands into one dispatched batch.

use std::sync::atomic::{AtomicUsize, Ordering};

use smol_str::SmolStr;
use tracing::{debug, debug_span, trace};

use crate::command::{Command, CommandDescriptor, CommandType};
use crate::error::{BatchError, BatchResult, ExecutionError};
use crate::executor::{BatchExecutor, BatchOutcomes, ExecutionContext, ExecutionHandle};
use crate::parameter::ParameterSnapshot;
use crate::sanitize::sanitize;

static NEXT_OBJECT_ID: AtomicUsize = AtomicUsize::new(1);

struct Batch {
    commands: Vec<CommandDescriptor>,
    context: ExecutionContext,
    handle: Option<Box<dyn ExecutionHandle>>,
}

/// Collects commands and sends them to the server in a single round trip.
///
/// The ordinal returned by [`append`](Self::append) identifies the command
/// for the life of the batch and is how its outcome is looked up after
/// [`dispatch`](Self::dispatch). The set is single-writer: callers serialize
/// appends, dispatches and clears.
///
/// ```rust
/// use sqlfront_batch::{BatchOutcomes, Command, CommandSet, OperationOutcome, SqlParameter};
/// # use sqlfront_batch::{BatchExecutor, BatchResult, CommandDescriptor, ExecutionContext};
/// # struct Server;
/// # impl BatchExecutor for Server {
/// #     type Handle = BatchOutcomes;
/// #     fn execute_batch(&mut self, _: &ExecutionContext, commands: &[CommandDescriptor]) -> BatchResult<BatchOutcomes> {
/// #         Ok(commands.iter().map(|_| OperationOutcome::success(1)).collect())
/// #     }
/// # }
///
/// let mut set = CommandSet::new();
/// let first = set.append(&Command::text("DELETE FROM t WHERE id = @id").param(SqlParameter::new("@id", 1))).unwrap();
/// let second = set.append(&Command::text("DELETE FROM t WHERE id = @id").param(SqlParameter::new("@id", 2))).unwrap();
/// assert_eq!((first, second), (0, 1));
///
/// let total = set.dispatch(&mut Server).unwrap();
/// assert_eq!(total, 2);
/// assert_eq!(set.outcome(1).unwrap(), (1, None));
/// ```
pub struct CommandSet {
    object_id: usize,
    batch: Option<Batch>,
}

impl CommandSet {
    /// Create an empty command set.
    pub fn new() -> Self {
        Self::with_context(ExecutionContext::default())
    }

    /// Create an empty command set with the given execution context.
    pub fn with_context(context: ExecutionContext) -> Self {
        Self {
            object_id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            batch: Some(Batch {
                commands: Vec::new(),
                context,
                handle: None,
            }),
        }
    }

    /// Process-unique id used in log output.
    pub fn object_id(&self) -> usize {
        self.object_id
    }

    fn batch(&self) -> BatchResult<&Batch> {
        self.batch.as_ref().ok_or(BatchError::ObjectDisposed)
    }

    fn batch_mut(&mut self) -> BatchResult<&mut Batch> {
        self.batch.as_mut().ok_or(BatchError::ObjectDisposed)
    }

    /// Append a command and return its ordinal.
    ///
    /// Every parameter is validated and copied before anything is stored, so
    /// a rejected command leaves the set unchanged. Outcomes of an earlier
    /// dispatch are dropped once a command is added.
    pub fn append(&mut self, command: &Command) -> BatchResult<usize> {
        let object_id = self.object_id;
        let batch = self.batch_mut()?;

        if command.text.is_empty() {
            return Err(BatchError::EmptyCommandText);
        }
        match command.command_type {
            CommandType::Text | CommandType::StoredProcedure => {}
            CommandType::TableDirect => {
                return Err(BatchError::UnsupportedCommandType(command.command_type));
            }
        }

        let parameters = command
            .parameters
            .iter()
            .map(sanitize)
            .collect::<BatchResult<Vec<_>>>()?;

        let ordinal = batch.commands.len();
        debug!(object_id, ordinal, parameters = parameters.len(), "command appended to batch");
        batch.commands.push(CommandDescriptor::new(
            command.text.clone(),
            parameters,
            command.command_type,
            command.encryption,
        ));
        batch.handle = None;
        Ok(ordinal)
    }

    /// Send every appended command through `executor` in one call.
    ///
    /// Returns the total rows affected. An empty batch is not sent and
    /// affects nothing.
    pub fn dispatch<E: BatchExecutor>(&mut self, executor: &mut E) -> BatchResult<u64> {
        let object_id = self.object_id;
        let batch = self.batch_mut()?;

        let span = debug_span!("command_set.dispatch", object_id, commands = batch.commands.len());
        let _enter = span.enter();

        batch.handle = None;
        if batch.commands.is_empty() {
            batch.handle = Some(Box::new(BatchOutcomes::default()));
            return Ok(0);
        }

        let handle = executor.execute_batch(&batch.context, &batch.commands)?;
        let total = handle.records_affected();
        debug!(records_affected = total, "batch dispatched");
        batch.handle = Some(Box::new(handle));
        Ok(total)
    }

    fn handle(&self, ordinal: usize) -> BatchResult<&dyn ExecutionHandle> {
        let batch = self.batch()?;
        let handle = batch.handle.as_deref().ok_or(BatchError::NotDispatched)?;
        if ordinal >= batch.commands.len() {
            return Err(BatchError::OrdinalOutOfRange {
                ordinal,
                count: batch.commands.len(),
            });
        }
        Ok(handle)
    }

    /// Rows affected and error for the command at `ordinal`.
    ///
    /// A command without a reported count yields zero rows. Use
    /// [`is_recorded`](Self::is_recorded) to tell that apart from a command
    /// that reported zero.
    pub fn outcome(&self, ordinal: usize) -> BatchResult<(u64, Option<ExecutionError>)> {
        let handle = self.handle(ordinal)?;
        Ok((
            handle.affected_rows(ordinal).unwrap_or(0),
            handle.error(ordinal),
        ))
    }

    /// Whether the executor reported a row count for `ordinal`.
    pub fn is_recorded(&self, ordinal: usize) -> BatchResult<bool> {
        Ok(self.handle(ordinal)?.affected_rows(ordinal).is_some())
    }

    /// Drop every command and any dispatched outcomes.
    ///
    /// The execution context is kept, and ordinals start again at zero.
    pub fn clear(&mut self) -> BatchResult<()> {
        let object_id = self.object_id;
        let batch = self.batch_mut()?;
        trace!(object_id, commands = batch.commands.len(), "clearing batch");
        batch.commands.clear();
        batch.handle = None;
        Ok(())
    }

    /// Release everything. All later calls fail with [`BatchError::ObjectDisposed`].
    pub fn dispose(&mut self) {
        trace!(object_id = self.object_id, "disposing batch");
        self.batch = None;
    }

    /// Check if the set was disposed.
    pub fn is_disposed(&self) -> bool {
        self.batch.is_none()
    }

    /// Number of appended commands.
    pub fn command_count(&self) -> BatchResult<usize> {
        Ok(self.batch()?.commands.len())
    }

    /// Appended commands in ordinal order.
    pub fn descriptors(&self) -> BatchResult<&[CommandDescriptor]> {
        Ok(&self.batch()?.commands)
    }

    fn descriptor(&self, command: usize) -> BatchResult<&CommandDescriptor> {
        let commands = &self.batch()?.commands;
        commands.get(command).ok_or(BatchError::OrdinalOutOfRange {
            ordinal: command,
            count: commands.len(),
        })
    }

    /// Number of parameters on the command at `command`.
    pub fn parameter_count(&self, command: usize) -> BatchResult<usize> {
        Ok(self.descriptor(command)?.parameters.len())
    }

    /// A parameter snapshot of the command at `command`.
    pub fn parameter(&self, command: usize, parameter: usize) -> BatchResult<&ParameterSnapshot> {
        let parameters = &self.descriptor(command)?.parameters;
        parameters.get(parameter).ok_or(BatchError::ParameterOutOfRange {
            command,
            parameter,
            count: parameters.len(),
        })
    }

    /// The shared execution context.
    pub fn context(&self) -> BatchResult<&ExecutionContext> {
        Ok(&self.batch()?.context)
    }

    /// Command timeout in seconds.
    pub fn command_timeout(&self) -> BatchResult<u32> {
        Ok(self.batch()?.context.command_timeout)
    }

    /// Set the command timeout in seconds.
    pub fn set_command_timeout(&mut self, seconds: u32) -> BatchResult<()> {
        self.batch_mut()?.context.command_timeout = seconds;
        Ok(())
    }

    /// Set the connection the batch runs on.
    pub fn set_connection(&mut self, connection: Option<impl Into<SmolStr>>) -> BatchResult<()> {
        self.batch_mut()?.context.connection = connection.map(Into::into);
        Ok(())
    }

    /// Set the enclosing transaction.
    pub fn set_transaction(&mut self, transaction: Option<u64>) -> BatchResult<()> {
        self.batch_mut()?.context.transaction = transaction;
        Ok(())
    }
}

impl Default for CommandSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CommandSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("CommandSet");
        s.field("object_id", &self.object_id);
        match &self.batch {
            Some(batch) => s
                .field("commands", &batch.commands.len())
                .field("context", &batch.context)
                .field("dispatched", &batch.handle.is_some()),
            None => s.field("disposed", &true),
        };
        s.finish()
    }
}
