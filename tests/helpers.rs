//! Test utility functions for flatpack

use flatpack::core::{
    ArtifactWorkspace, BuildStatus, CompileConfig, CompileOutput, EntryPoint, Package,
    SourceAnalysis,
};
use flatpack::execution::{BuildError, BuildEvent, BuildReport, PackageBuildDriver};
use flatpack::tools::{BundleRequest, ManifestPaths, ToolChain, ToolError};

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Mock tool chain that records stage invocations and writes real artifact
/// files so the executor's publish and manifest stages operate on disk
pub struct MockToolChain {
    /// `(stage, detail)` pairs in invocation order
    pub stages: Arc<Mutex<Vec<(String, String)>>>,
    fail_at: Option<&'static str>,
}

impl MockToolChain {
    pub fn new() -> Self {
        Self {
            stages: Arc::new(Mutex::new(Vec::new())),
            fail_at: None,
        }
    }

    /// Fail with an injected error the first time `stage` runs
    pub fn failing_at(stage: &'static str) -> Self {
        Self {
            stages: Arc::new(Mutex::new(Vec::new())),
            fail_at: Some(stage),
        }
    }

    fn record(&self, stage: &str, detail: &str) -> Result<(), ToolError> {
        self.stages
            .lock()
            .unwrap()
            .push((stage.to_string(), detail.to_string()));
        if self.fail_at == Some(stage) {
            return Err(ToolError::Internal("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ToolChain for MockToolChain {
    async fn prepare_config(
        &self,
        entry: &EntryPoint,
        _pkg: &Package,
    ) -> Result<CompileConfig, ToolError> {
        self.record("prepare-config", &entry.module_id)?;
        Ok(CompileConfig {
            entry_file: entry.entry_file.clone(),
            declaration: true,
            paths: BTreeMap::new(),
        })
    }

    async fn analyse_sources(
        &self,
        entry: &EntryPoint,
        _config: &CompileConfig,
    ) -> Result<SourceAnalysis, ToolError> {
        self.record("analyse-sources", &entry.module_id)?;
        Ok(SourceAnalysis::default())
    }

    async fn process_assets(
        &self,
        entry: &EntryPoint,
        _workspace: &mut ArtifactWorkspace,
    ) -> Result<(), ToolError> {
        self.record("process-assets", &entry.module_id)
    }

    async fn inline_assets(
        &self,
        entry: &EntryPoint,
        _workspace: &mut ArtifactWorkspace,
    ) -> Result<(), ToolError> {
        self.record("inline-assets", &entry.module_id)
    }

    async fn compile(
        &self,
        entry: &EntryPoint,
        _config: &CompileConfig,
        workspace: &ArtifactWorkspace,
    ) -> Result<CompileOutput, ToolError> {
        self.record("compile", &entry.module_id)?;
        let js = workspace
            .stage_dir
            .join(format!("{}.js", entry.flat_module_file));
        let typings = workspace
            .stage_dir
            .join(format!("{}.d.ts", entry.flat_module_file));
        let metadata = workspace
            .stage_dir
            .join(format!("{}.metadata.json", entry.flat_module_file));
        tokio::fs::write(&js, "export {};\n").await?;
        tokio::fs::write(&typings, "export {};\n").await?;
        tokio::fs::write(&metadata, "{}\n").await?;
        Ok(CompileOutput { js, typings })
    }

    async fn bundle(&self, request: &BundleRequest) -> Result<PathBuf, ToolError> {
        self.record("bundle", &request.module_name)?;
        if let Some(parent) = request.dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&request.dest, "export {};\n").await?;
        let map = PathBuf::from(format!("{}.map", request.dest.display()));
        tokio::fs::write(&map, r#"{"version":3,"sources":[],"sourceRoot":""}"#).await?;
        Ok(request.dest.clone())
    }

    async fn downlevel(&self, input: &Path, dest: &Path) -> Result<PathBuf, ToolError> {
        self.record("downlevel", &input.display().to_string())?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(input, dest).await?;
        let map = PathBuf::from(format!("{}.map", dest.display()));
        tokio::fs::write(&map, r#"{"version":3,"sources":[],"sourceRoot":""}"#).await?;
        Ok(dest.to_path_buf())
    }

    async fn minify(&self, input: &Path) -> Result<PathBuf, ToolError> {
        self.record("minify", &input.display().to_string())?;
        let name = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("bundle");
        let dest = input.with_file_name(format!("{name}.min.js"));
        tokio::fs::copy(input, &dest).await?;
        Ok(dest)
    }

    async fn remap_source_map(&self, file: &Path) -> Result<(), ToolError> {
        self.record("remap-source-map", &file.display().to_string())
    }

    async fn relocate_source_map_roots(
        &self,
        entry: &EntryPoint,
        _workspace: &ArtifactWorkspace,
    ) -> Result<(), ToolError> {
        self.record("relocate-source-maps", &entry.module_id)
    }

    async fn write_manifest(
        &self,
        entry: &EntryPoint,
        paths: &ManifestPaths,
    ) -> Result<(), ToolError> {
        self.record("write-manifest", &entry.module_id)?;
        tokio::fs::create_dir_all(&entry.destination).await?;
        let manifest = serde_json::json!({
            "name": entry.module_id,
            "main": paths.main,
            "module": paths.module,
            "es2015": paths.es2015,
            "typings": paths.typings,
            "metadata": paths.metadata,
        });
        let contents =
            serde_json::to_string_pretty(&manifest).map_err(|e| ToolError::Internal(e.to_string()))?;
        tokio::fs::write(entry.destination.join("package.json"), contents).await?;
        Ok(())
    }
}

/// Short name of a module id: `@acme/http` -> `http`
fn module_tail(module_id: &str) -> String {
    module_id.rsplit('/').next().unwrap_or(module_id).to_string()
}

fn flat_name(module_id: &str) -> String {
    module_id.trim_start_matches('@').replace('/', "-")
}

/// Build an entry point rooted under a test directory
pub fn test_entry(root: &Path, module_id: &str, depends_on: &[&str], primary: bool) -> EntryPoint {
    let tail = module_tail(module_id);
    let source_dir = if primary {
        root.join("src")
    } else {
        root.join("src").join(&tail)
    };
    let destination = if primary {
        root.join("dist")
    } else {
        root.join("dist").join(&tail)
    };
    EntryPoint {
        module_id: module_id.to_string(),
        entry_file: source_dir.join("index.js"),
        source_dir,
        destination,
        depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        externals: vec![],
        flat_module_file: flat_name(module_id),
        umd_module_id: flat_name(module_id).replace('-', "."),
        status: BuildStatus::Pending,
    }
}

/// Build a package rooted under a test directory; each secondary is given as
/// `(module_id, depends_on)`
pub fn test_package(root: &Path, primary_id: &str, secondaries: &[(&str, &[&str])]) -> Package {
    Package {
        name: primary_id.trim_start_matches('@').to_string(),
        src: root.join("src"),
        dest: root.join("dist"),
        working_dir: root.join(".flatpack"),
        primary: test_entry(root, primary_id, &[], true),
        secondaries: secondaries
            .iter()
            .map(|(id, deps)| test_entry(root, id, deps, false))
            .collect(),
    }
}

/// Result of a driver run under test
pub struct BuildTestResult {
    pub result: Result<BuildReport, BuildError>,
    pub events: Vec<BuildEvent>,
    pub stages: Vec<(String, String)>,
}

/// Run a package build with a mock tool chain, capturing events and stage
/// invocations
pub async fn run_build(pkg: &mut Package, tools: MockToolChain) -> BuildTestResult {
    let stages = tools.stages.clone();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();

    let mut driver = PackageBuildDriver::new(tools);
    driver.add_event_handler(move |event| sink.lock().unwrap().push(event.clone()));

    let result = driver.build_package(pkg).await;
    let events = events.lock().unwrap().clone();
    let stages = stages.lock().unwrap().clone();
    BuildTestResult {
        result,
        events,
        stages,
    }
}

/// Assert entry points completed in the given order
pub fn assert_build_order(result: &BuildTestResult, expected: &[&str]) {
    let built: Vec<&str> = result
        .events
        .iter()
        .filter_map(|event| match event {
            BuildEvent::EntryPointBuilt { module_id } => Some(module_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(built, expected, "unexpected build completion order");
}

/// Assert every entry point in the package reached `Success`
pub fn assert_all_built(pkg: &Package) {
    for entry in pkg.entry_points() {
        assert_eq!(
            entry.status,
            BuildStatus::Success,
            "entry point '{}' did not build",
            entry.module_id
        );
    }
}

/// Module ids that were deferred, in order
pub fn deferred_modules(result: &BuildTestResult) -> Vec<&str> {
    result
        .events
        .iter()
        .filter_map(|event| match event {
            BuildEvent::EntryPointDeferred { module_id, .. } => Some(module_id.as_str()),
            _ => None,
        })
        .collect()
}

/// How many times a stage ran, across all entry points
pub fn count_stage(result: &BuildTestResult, stage: &str) -> usize {
    result.stages.iter().filter(|(s, _)| s == stage).count()
}
