//! Build orchestration: scheduler, pipeline executor, and driver

pub mod driver;
pub mod executor;
pub mod scheduler;

pub use driver::{BuildEvent, BuildReport, EventHandler, PackageBuildDriver};
pub use executor::{BuildOutcome, EntryPointExecutor};
pub use scheduler::EntryPointScheduler;

use crate::tools::ToolError;
use thiserror::Error;

/// Error types for a package build
#[derive(Debug, Error)]
pub enum BuildError {
    /// A unit was dequeued again without any progress being possible;
    /// fatal and never retried
    #[error("cyclic dependency detected while building '{0}'")]
    CyclicDependency(String),

    /// A module id with no matching entry point in the package
    #[error("unknown entry point '{0}'")]
    UnknownEntryPoint(String),

    /// A stage adapter failed; fatal to the whole package build
    #[error("stage '{stage}' failed for '{module_id}': {source}")]
    Stage {
        stage: &'static str,
        module_id: String,
        #[source]
        source: ToolError,
    },

    /// The package descriptor could not be read or resolved
    #[error("invalid package descriptor: {0:#}")]
    Descriptor(anyhow::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
