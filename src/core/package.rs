//! Package and entry point domain model

use crate::core::state::BuildStatus;
use std::path::PathBuf;

/// One buildable unit within a package
#[derive(Debug, Clone)]
pub struct EntryPoint {
    /// Module identifier, unique within the package (e.g. `@acme/core`)
    pub module_id: String,

    /// Directory containing this entry point's sources
    pub source_dir: PathBuf,

    /// The source file the compiler starts from
    pub entry_file: PathBuf,

    /// Directory the built artifacts are published into
    pub destination: PathBuf,

    /// Module identifiers of other entry points this one depends on
    pub depends_on: Vec<String>,

    /// Module identifiers the bundler must not inline
    pub externals: Vec<String>,

    /// Base name shared by all bundle variants of this entry point
    pub flat_module_file: String,

    /// Module identifier used for the universal-module bundle
    pub umd_module_id: String,

    /// Runtime build status
    pub status: BuildStatus,
}

impl EntryPoint {
    /// Dependencies whose entry points have not reached `Success` yet
    pub fn unsatisfied_dependencies(&self, pkg: &Package) -> Vec<String> {
        self.depends_on
            .iter()
            .filter(|dep| {
                pkg.entry_point(dep)
                    .map(|e| !e.status.is_built())
                    .unwrap_or(true)
            })
            .cloned()
            .collect()
    }
}

/// The root aggregate: one primary entry point plus ordered secondaries
#[derive(Debug, Clone)]
pub struct Package {
    /// Package name
    pub name: String,

    /// Source root
    pub src: PathBuf,

    /// Output root; cleaned once by the driver before any unit builds
    pub dest: PathBuf,

    /// Scratch directory holding per-unit staging areas
    pub working_dir: PathBuf,

    /// The package's main entry point
    pub primary: EntryPoint,

    /// Additional entry points, built in declaration order when possible
    pub secondaries: Vec<EntryPoint>,
}

impl Package {
    /// Get an entry point by module id
    pub fn entry_point(&self, module_id: &str) -> Option<&EntryPoint> {
        if self.primary.module_id == module_id {
            return Some(&self.primary);
        }
        self.secondaries.iter().find(|e| e.module_id == module_id)
    }

    /// Get a mutable entry point by module id
    pub fn entry_point_mut(&mut self, module_id: &str) -> Option<&mut EntryPoint> {
        if self.primary.module_id == module_id {
            return Some(&mut self.primary);
        }
        self.secondaries
            .iter_mut()
            .find(|e| e.module_id == module_id)
    }

    /// All entry points, primary first
    pub fn entry_points(&self) -> impl Iterator<Item = &EntryPoint> {
        std::iter::once(&self.primary).chain(self.secondaries.iter())
    }

    /// Module ids in build seed order (primary, then secondaries)
    pub fn module_ids(&self) -> Vec<String> {
        self.entry_points().map(|e| e.module_id.clone()).collect()
    }
}
