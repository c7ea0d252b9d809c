//! Stage adapter contracts for external build tools

pub mod command;

use crate::core::package::{EntryPoint, Package};
use crate::core::workspace::{ArtifactWorkspace, CompileConfig, CompileOutput, SourceAnalysis};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use command::{CommandToolChain, ToolCommands};

/// Error types for tool invocations
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool} exited with code {code}: {stderr}")]
    CommandFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("{tool} timed out after {secs} seconds")]
    Timeout { tool: String, secs: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

/// Bundle output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleFormat {
    /// Flat ES2015 module
    Es2015,
    /// Universal module addressable by module id
    Umd,
}

impl BundleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleFormat::Es2015 => "es",
            BundleFormat::Umd => "umd",
        }
    }
}

/// Input to the bundle stage
#[derive(Debug, Clone)]
pub struct BundleRequest {
    /// Module name the bundle is addressable by
    pub module_name: String,

    /// Entry file to bundle from
    pub entry: PathBuf,

    /// Output format
    pub format: BundleFormat,

    /// Destination file
    pub dest: PathBuf,

    /// Module ids resolved as runtime imports instead of being inlined
    pub externals: Vec<String>,
}

/// Relative artifact paths recorded in a unit's manifest fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPaths {
    /// Universal-module bundle (the primary entry)
    pub main: String,

    /// ES5 module entry
    pub module: String,

    /// Flat ES2015 module entry
    pub es2015: String,

    /// Type declarations
    pub typings: String,

    /// Auxiliary metadata file
    pub metadata: String,
}

/// The seam to external build tools
///
/// Each method is a pure input -> output operation from the executor's
/// perspective; the executor decides when stages run and what each one
/// receives, never how a tool does its work.
#[async_trait]
pub trait ToolChain: Send + Sync {
    /// Derive this entry point's compiler configuration from the package's
    /// shared base configuration
    async fn prepare_config(
        &self,
        entry: &EntryPoint,
        pkg: &Package,
    ) -> Result<CompileConfig, ToolError>;

    /// First compiler pass: extract asset references and the intra-unit
    /// source dependency graph
    async fn analyse_sources(
        &self,
        entry: &EntryPoint,
        config: &CompileConfig,
    ) -> Result<SourceAnalysis, ToolError>;

    /// Resolve and stage every asset found by the analysis pass, keeping
    /// transformed contents in the workspace
    async fn process_assets(
        &self,
        entry: &EntryPoint,
        workspace: &mut ArtifactWorkspace,
    ) -> Result<(), ToolError>;

    /// Rewrite the staged compiled representation so asset URL references are
    /// replaced by their staged contents
    async fn inline_assets(
        &self,
        entry: &EntryPoint,
        workspace: &mut ArtifactWorkspace,
    ) -> Result<(), ToolError>;

    /// Compile the prepared sources into a primary entry file plus type
    /// declarations, emitted into the workspace's staging directory
    async fn compile(
        &self,
        entry: &EntryPoint,
        config: &CompileConfig,
        workspace: &ArtifactWorkspace,
    ) -> Result<CompileOutput, ToolError>;

    /// Bundle an entry file into a single module file
    async fn bundle(&self, request: &BundleRequest) -> Result<PathBuf, ToolError>;

    /// Transform an ES2015 bundle into an ES5-syntax equivalent, preserving
    /// module semantics
    async fn downlevel(&self, input: &Path, dest: &Path) -> Result<PathBuf, ToolError>;

    /// Produce a minified variant of a bundle, returning its path
    async fn minify(&self, input: &Path) -> Result<PathBuf, ToolError>;

    /// Rewrite a bundle's companion source map in place so map sources point
    /// at original files instead of intermediate staged files
    async fn remap_source_map(&self, file: &Path) -> Result<(), ToolError>;

    /// Rewrite all staged source maps' root references so they are correct
    /// relative to the unit's final published location
    async fn relocate_source_map_roots(
        &self,
        entry: &EntryPoint,
        workspace: &ArtifactWorkspace,
    ) -> Result<(), ToolError>;

    /// Persist a package manifest fragment for the unit
    async fn write_manifest(
        &self,
        entry: &EntryPoint,
        paths: &ManifestPaths,
    ) -> Result<(), ToolError>;
}
