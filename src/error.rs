//! Domain error types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a reconciliation run.
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("cannot resolve ledger field `{field}`; observed fields: {observed:?}")]
    SchemaResolution {
        field: &'static str,
        observed: Vec<String>,
    },

    #[error("failed to fetch league activities: {0}")]
    Activities(String),

    #[error("failed to fetch participants: {0}")]
    Participants(String),
}

/// A collaborator call that failed for one item. The run continues; the
/// failure is reported alongside the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    /// Collaborator operation, e.g. `participant_info`.
    pub operation: String,
    /// The participant, achievement, or other item the call was for.
    pub item: String,
    pub message: String,
}

impl FetchFailure {
    pub fn new(operation: &str, item: &str, error: &anyhow::Error) -> Self {
        Self {
            operation: operation.to_string(),
            item: item.to_string(),
            message: format!("{error:#}"),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.operation, self.item, self.message)
    }
}

/// Result of an item-scoped collaborator call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Fetched(T),
    Skipped(FetchFailure),
}

impl<T> FetchOutcome<T> {
    /// Wrap a collaborator result; errors become `Skipped` and are logged.
    pub fn from_result(operation: &str, item: &str, result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) => FetchOutcome::Fetched(value),
            Err(e) => {
                tracing::warn!(operation, item, error = %e, "Collaborator call failed, skipping item");
                FetchOutcome::Skipped(FetchFailure::new(operation, item, &e))
            }
        }
    }

    pub fn fetched(self) -> Option<T> {
        match self {
            FetchOutcome::Fetched(value) => Some(value),
            FetchOutcome::Skipped(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            FetchOutcome::Fetched(_) => None,
            FetchOutcome::Skipped(failure) => Some(failure),
        }
    }
}
