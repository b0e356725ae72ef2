//! The executor seam: whatever actually sends a batch to the server.

use smol_str::SmolStr;

use crate::command::CommandDescriptor;
use crate::error::{BatchResult, ExecutionError};

/// Default command timeout in seconds.
pub const DEFAULT_COMMAND_TIMEOUT: u32 = 30;

/// State shared by every command of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Command timeout in seconds. Zero waits forever.
    pub command_timeout: u32,
    /// Name of the connection the batch runs on.
    pub connection: Option<SmolStr>,
    /// Descriptor of the enclosing transaction.
    pub transaction: Option<u64>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            connection: None,
            transaction: None,
        }
    }
}

/// Per-command results of a dispatched batch, addressed by ordinal.
pub trait ExecutionHandle: Send {
    /// Total rows affected by the batch.
    fn records_affected(&self) -> u64;

    /// Rows affected by one command, if the server reported a count.
    fn affected_rows(&self, ordinal: usize) -> Option<u64>;

    /// The error raised by one command, if any.
    fn error(&self, ordinal: usize) -> Option<ExecutionError>;
}

/// Sends all descriptors of a batch in one round trip.
///
/// Implementations own blocking, cancellation and timeout behaviour.
pub trait BatchExecutor {
    /// Handle returned for a dispatched batch.
    type Handle: ExecutionHandle + 'static;

    /// Execute `commands` in order.
    fn execute_batch(
        &mut self,
        context: &ExecutionContext,
        commands: &[CommandDescriptor],
    ) -> BatchResult<Self::Handle>;
}

/// Outcome of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationOutcome {
    /// Rows affected, when reported.
    pub rows_affected: Option<u64>,
    /// Error raised by the command.
    pub error: Option<ExecutionError>,
}

impl OperationOutcome {
    /// Create a successful outcome.
    pub fn success(rows_affected: u64) -> Self {
        Self {
            rows_affected: Some(rows_affected),
            error: None,
        }
    }

    /// Create a failed outcome.
    pub fn failure(error: ExecutionError) -> Self {
        Self {
            rows_affected: None,
            error: Some(error),
        }
    }

    /// Create an outcome for a command that never ran.
    pub fn skipped() -> Self {
        Self::default()
    }
}

/// A ready-made [`ExecutionHandle`] backed by a list of outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcomes {
    outcomes: Vec<OperationOutcome>,
}

impl BatchOutcomes {
    /// Create from outcomes in ordinal order.
    pub fn new(outcomes: Vec<OperationOutcome>) -> Self {
        Self { outcomes }
    }

    /// Add the next outcome.
    pub fn push(&mut self, outcome: OperationOutcome) {
        self.outcomes.push(outcome);
    }

    /// Outcomes in ordinal order.
    pub fn outcomes(&self) -> &[OperationOutcome] {
        &self.outcomes
    }

    /// Get the number of outcomes.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Check if no command raised an error.
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.error.is_none())
    }
}

impl FromIterator<OperationOutcome> for BatchOutcomes {
    fn from_iter<I: IntoIterator<Item = OperationOutcome>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl ExecutionHandle for BatchOutcomes {
    fn records_affected(&self) -> u64 {
        self.outcomes
            .iter()
            .filter_map(|o| o.rows_affected)
            .fold(0, u64::saturating_add)
    }

    fn affected_rows(&self, ordinal: usize) -> Option<u64> {
        self.outcomes.get(ordinal).and_then(|o| o.rows_affected)
    }

    fn error(&self, ordinal: usize) -> Option<ExecutionError> {
        self.outcomes.get(ordinal).and_then(|o| o.error.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_outcomes() {
        let outcomes: BatchOutcomes = [
            OperationOutcome::success(2),
            OperationOutcome::failure(ExecutionError::new(547, 16, "FK conflict")),
            OperationOutcome::skipped(),
            OperationOutcome::success(5),
        ]
        .into_iter()
        .collect();

        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes.records_affected(), 7);
        assert_eq!(outcomes.affected_rows(0), Some(2));
        assert_eq!(outcomes.affected_rows(1), None);
        assert_eq!(outcomes.affected_rows(9), None);
        assert_eq!(outcomes.error(1).map(|e| e.number), Some(547));
        assert!(outcomes.error(3).is_none());
        assert!(!outcomes.all_succeeded());
    }

    #[test]
    fn test_records_affected_saturates() {
        let outcomes = BatchOutcomes::new(vec![
            OperationOutcome::success(u64::MAX),
            OperationOutcome::success(2),
        ]);
        assert_eq!(outcomes.records_affected(), u64::MAX);
    }

    #[test]
    fn test_default_context() {
        let ctx = ExecutionContext::default();
        assert_eq!(ctx.command_timeout, 30);
        assert!(ctx.connection.is_none());
        assert!(ctx.transaction.is_none());
    }
}
