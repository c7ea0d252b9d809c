//! Package descriptor loaded from `flatpack.json`

use crate::core::package::{EntryPoint, Package};
use crate::core::state::BuildStatus;
use crate::tools::command::ToolCommands;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Top-level package descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDescriptor {
    /// Package name
    pub name: String,

    /// Source root, relative to the descriptor's directory
    #[serde(default = "default_src")]
    pub src: String,

    /// Output root, relative to the descriptor's directory
    #[serde(default = "default_dest")]
    pub dest: String,

    /// Scratch directory for intermediate artifacts
    #[serde(default = "default_working_dir")]
    pub working_dir: String,

    /// The primary entry point
    pub primary: EntryPointDescriptor,

    /// Secondary entry points
    #[serde(default)]
    pub secondaries: Vec<EntryPointDescriptor>,

    /// External tool commands, one per pipeline stage that shells out
    #[serde(default)]
    pub tools: ToolCommands,
}

/// One entry point as declared in the descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPointDescriptor {
    /// Module identifier, unique within the package
    pub module_id: String,

    /// Source directory relative to the package source root
    #[serde(default)]
    pub path: Option<String>,

    /// Entry source file relative to the entry point's source directory
    #[serde(default)]
    pub entry_file: Option<String>,

    /// Base name for bundle variants; defaults from the module id
    #[serde(default)]
    pub flat_module_file: Option<String>,

    /// Universal-module id; defaults from the module id
    #[serde(default)]
    pub umd_module_id: Option<String>,

    /// Module ids of other entry points this one depends on
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Module ids the bundler resolves as runtime imports
    #[serde(default)]
    pub externals: Vec<String>,

    /// Destination directory relative to the package output root
    #[serde(default)]
    pub destination: Option<String>,
}

fn default_src() -> String {
    ".".to_string()
}

fn default_dest() -> String {
    "dist".to_string()
}

fn default_working_dir() -> String {
    ".flatpack".to_string()
}

impl PackageDescriptor {
    /// Load a descriptor from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read package descriptor {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Invalid package descriptor {}", path.display()))
    }

    /// Parse a descriptor from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let descriptor: PackageDescriptor =
            serde_json::from_str(json).context("Failed to parse package descriptor")?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Check descriptor-level invariants
    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in self.entry_descriptors() {
            if !seen.insert(entry.module_id.as_str()) {
                bail!("Duplicate entry point module id '{}'", entry.module_id);
            }
        }
        for entry in self.entry_descriptors() {
            for dep in &entry.depends_on {
                if !seen.contains(dep.as_str()) {
                    bail!(
                        "Entry point '{}' depends on unknown module id '{}'",
                        entry.module_id,
                        dep
                    );
                }
            }
        }
        Ok(())
    }

    fn entry_descriptors(&self) -> impl Iterator<Item = &EntryPointDescriptor> {
        std::iter::once(&self.primary).chain(self.secondaries.iter())
    }

    /// Resolve the descriptor into a `Package`, anchoring all relative paths
    /// at `base_dir` (the descriptor's directory)
    pub fn to_package(&self, base_dir: &Path) -> Result<Package> {
        let src = base_dir.join(&self.src);
        let dest = base_dir.join(&self.dest);
        let working_dir = base_dir.join(&self.working_dir);

        let primary = self.primary.resolve(&src, &dest, true);
        let secondaries = self
            .secondaries
            .iter()
            .map(|s| s.resolve(&src, &dest, false))
            .collect();

        Ok(Package {
            name: self.name.clone(),
            src,
            dest,
            working_dir,
            primary,
            secondaries,
        })
    }
}

impl EntryPointDescriptor {
    fn resolve(&self, src: &Path, dest: &Path, is_primary: bool) -> EntryPoint {
        let tail = module_id_tail(&self.module_id);

        let source_dir = match (&self.path, is_primary) {
            (Some(path), _) => src.join(path),
            (None, true) => src.to_path_buf(),
            (None, false) => src.join(&tail),
        };
        let entry_file = source_dir.join(self.entry_file.as_deref().unwrap_or("index.js"));

        let destination = match (&self.destination, is_primary) {
            (Some(d), _) => dest.join(d),
            (None, true) => dest.to_path_buf(),
            (None, false) => dest.join(&tail),
        };

        EntryPoint {
            module_id: self.module_id.clone(),
            source_dir,
            entry_file,
            destination,
            depends_on: self.depends_on.clone(),
            externals: self.externals.clone(),
            flat_module_file: self
                .flat_module_file
                .clone()
                .unwrap_or_else(|| default_flat_module_file(&self.module_id)),
            umd_module_id: self
                .umd_module_id
                .clone()
                .unwrap_or_else(|| default_umd_module_id(&self.module_id)),
            status: BuildStatus::Pending,
        }
    }
}

fn module_id_tail(module_id: &str) -> String {
    module_id
        .rsplit('/')
        .next()
        .unwrap_or(module_id)
        .to_string()
}

/// `@acme/core` -> `acme-core`
fn default_flat_module_file(module_id: &str) -> String {
    module_id.trim_start_matches('@').replace('/', "-")
}

/// `@acme/common-http` -> `acme.common.http`
fn default_umd_module_id(module_id: &str) -> String {
    module_id
        .trim_start_matches('@')
        .replace(['/', '-'], ".")
}
