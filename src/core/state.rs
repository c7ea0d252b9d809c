//! Entry point build status

use serde::{Deserialize, Serialize};

/// Build status of a single entry point
///
/// The only state machine an entry point carries. `Pending` is the initial
/// state; the executor moves it to `InProgress` when stages start running.
/// The scheduler resets `InProgress` back to `Pending` when the entry point
/// is deferred because a dependency has not been built yet - that regression
/// is a normal control outcome, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    /// Entry point has not been built yet
    Pending,
    /// The pipeline executor is currently running its stages
    InProgress,
    /// All stages completed and the manifest was written
    Success,
    /// An unrecoverable stage failure
    Error,
}

impl BuildStatus {
    /// Check if the status is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildStatus::Success | BuildStatus::Error)
    }

    /// Check if the entry point finished successfully
    pub fn is_built(&self) -> bool {
        matches!(self, BuildStatus::Success)
    }
}

impl Default for BuildStatus {
    fn default() -> Self {
        BuildStatus::Pending
    }
}
