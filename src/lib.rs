//! flatpack - builds library packages as flat module bundles

pub mod cli;
pub mod core;
pub mod execution;
pub mod tools;
pub mod util;

// Re-export commonly used types
pub use crate::core::config::{EntryPointDescriptor, PackageDescriptor};
pub use crate::core::{ArtifactWorkspace, BuildStatus, CompileConfig, EntryPoint, Package};
pub use crate::execution::{
    BuildError, BuildEvent, BuildOutcome, BuildReport, EntryPointExecutor, EntryPointScheduler,
    EventHandler, PackageBuildDriver,
};
pub use crate::tools::{
    BundleFormat, BundleRequest, CommandToolChain, ManifestPaths, ToolChain, ToolCommands,
    ToolError,
};
