//! Per-entry-point artifact workspace

use crate::core::package::{EntryPoint, Package};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Compiler configuration derived for one entry point
///
/// The toolchain produces the base value; the executor extends `paths` during
/// dependency adjustment so cross-unit imports resolve against real build
/// output instead of source.
#[derive(Debug, Clone, Default)]
pub struct CompileConfig {
    /// The source file compilation starts from
    pub entry_file: PathBuf,

    /// Emit type declarations alongside the compiled entry file
    pub declaration: bool,

    /// Module id -> candidate resolution paths
    pub paths: BTreeMap<String, Vec<PathBuf>>,
}

/// Result of the source analysis pass
#[derive(Debug, Clone, Default)]
pub struct SourceAnalysis {
    /// Source files belonging to this entry point, in dependency order
    pub source_files: Vec<PathBuf>,

    /// Template/style assets referenced by the sources
    pub assets: Vec<PathBuf>,
}

/// Output of the compile stage
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Primary compiled entry file
    pub js: PathBuf,

    /// Type declaration file
    pub typings: PathBuf,
}

/// Staging record for one entry point's build
///
/// Pure data. Owned exclusively by the pipeline executor for the duration of
/// one unit's build; on failure the staging directory is left on disk for
/// inspection.
#[derive(Debug, Clone)]
pub struct ArtifactWorkspace {
    /// Scratch directory holding intermediate artifacts before publish
    pub stage_dir: PathBuf,

    /// The entry point's final output directory
    pub out_dir: PathBuf,

    /// Analysis pass output
    pub analysis: Option<SourceAnalysis>,

    /// Asset path -> transformed contents, staged in memory for inlining
    pub staged_assets: HashMap<PathBuf, String>,

    /// Compile stage output
    pub compiled: Option<CompileOutput>,

    /// Flat ES2015 bundle
    pub es2015_bundle: Option<PathBuf>,

    /// Downlevelled ES5 bundle
    pub es5_bundle: Option<PathBuf>,

    /// Universal-module bundle
    pub umd_bundle: Option<PathBuf>,

    /// Minified universal-module bundle
    pub umd_min_bundle: Option<PathBuf>,
}

impl ArtifactWorkspace {
    /// Create a workspace for one entry point's build
    pub fn new(entry: &EntryPoint, pkg: &Package) -> Self {
        let stage_dir = pkg.working_dir.join(sanitize_module_id(&entry.module_id));
        Self {
            stage_dir,
            out_dir: entry.destination.clone(),
            analysis: None,
            staged_assets: HashMap::new(),
            compiled: None,
            es2015_bundle: None,
            es5_bundle: None,
            umd_bundle: None,
            umd_min_bundle: None,
        }
    }

    /// Staging directory for the flat ES2015 bundle
    pub fn es2015_dir(&self) -> PathBuf {
        self.stage_dir.join("esm2015")
    }

    /// Staging directory for the ES5 bundle
    pub fn es5_dir(&self) -> PathBuf {
        self.stage_dir.join("esm5")
    }

    /// Staging directory for the universal-module bundles
    pub fn bundles_dir(&self) -> PathBuf {
        self.stage_dir.join("bundles")
    }

    /// All staged bundle variants produced so far
    pub fn bundle_variants(&self) -> Vec<&Path> {
        [
            &self.es2015_bundle,
            &self.es5_bundle,
            &self.umd_bundle,
            &self.umd_min_bundle,
        ]
        .into_iter()
        .flatten()
        .map(PathBuf::as_path)
        .collect()
    }
}

/// Turn a module id into a directory name safe for the working directory
fn sanitize_module_id(module_id: &str) -> String {
    module_id.trim_start_matches('@').replace('/', "-")
}
