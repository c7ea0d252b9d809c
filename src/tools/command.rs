//! Subprocess-backed toolchain
//!
//! Each pipeline stage that shells out is driven by a command template from
//! the package descriptor. Stages with no configured command fall back to a
//! pass-through behavior so the orchestration can run end to end without the
//! real tools installed: bundle/downlevel copy their input (plus companion
//! source map), minify copies to a `.min.js` sibling, and the source-map
//! operations leave files untouched.

use crate::core::package::{EntryPoint, Package};
use crate::core::workspace::{ArtifactWorkspace, CompileConfig, CompileOutput, SourceAnalysis};
use crate::tools::{BundleRequest, ManifestPaths, ToolChain, ToolError};
use crate::util::fs::{copy_file, walk_files};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Command templates for the stages that invoke external tools
///
/// Templates are argv vectors; `{placeholder}` tokens are substituted before
/// spawning (`{entry}`, `{dest}`, `{module}`, `{format}`, `{externals}`,
/// `{file}`, `{outDir}`, `{flatModuleFile}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolCommands {
    pub compile: Option<Vec<String>>,
    pub bundle: Option<Vec<String>>,
    pub downlevel: Option<Vec<String>>,
    pub minify: Option<Vec<String>>,
    pub remap_source_map: Option<Vec<String>>,
    pub inline_assets: Option<Vec<String>>,
}

/// Toolchain that runs configured external commands as subprocesses
#[derive(Debug, Clone)]
pub struct CommandToolChain {
    commands: ToolCommands,
    timeout_secs: u64,
}

impl CommandToolChain {
    pub fn new(commands: ToolCommands) -> Self {
        Self {
            commands,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Spawn one tool command and wait for it, mapping timeout and non-zero
    /// exit codes into `ToolError`
    async fn run(&self, tool: &'static str, argv: &[String]) -> Result<(), ToolError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ToolError::Internal(format!("{tool} command is empty")))?;

        debug!("Spawning {tool}: {program} {}", args.join(" "));

        let result = timeout(
            Duration::from_secs(self.timeout_secs),
            Command::new(program)
                .args(args)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| ToolError::Timeout {
            tool: tool.to_string(),
            secs: self.timeout_secs,
        })?;

        let output =
            result.map_err(|e| ToolError::Internal(format!("Failed to spawn {tool}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let code = output.status.code().unwrap_or(-1);
            warn!("{tool} exited with code {code}: {stderr}");
            return Err(ToolError::CommandFailed {
                tool: tool.to_string(),
                code,
                stderr,
            });
        }

        Ok(())
    }
}

/// Substitute `{key}` tokens in an argv template
fn render(template: &[String], vars: &[(&str, &str)]) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            let mut rendered = arg.clone();
            for (key, value) in vars {
                rendered = rendered.replace(&format!("{{{key}}}"), value);
            }
            rendered
        })
        .collect()
}

/// Copy a file's companion `.map` if one exists next to it
async fn copy_companion_map(src: &Path, dest: &Path) -> Result<(), ToolError> {
    let src_map = map_path(src);
    if fs::try_exists(&src_map).await? {
        copy_file(&src_map, &map_path(dest)).await?;
    }
    Ok(())
}

fn map_path(file: &Path) -> PathBuf {
    let mut name = file.file_name().unwrap_or_default().to_os_string();
    name.push(".map");
    file.with_file_name(name)
}

fn is_asset(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("html" | "css" | "scss" | "less")
    )
}

#[async_trait]
impl ToolChain for CommandToolChain {
    async fn prepare_config(
        &self,
        entry: &EntryPoint,
        _pkg: &Package,
    ) -> Result<CompileConfig, ToolError> {
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
        let files = walk_files(&entry.source_dir).await?;
        let (assets, source_files) = files.into_iter().partition(|f| is_asset(f));
        Ok(SourceAnalysis {
            source_files,
            assets,
        })
    }

    async fn process_assets(
        &self,
        _entry: &EntryPoint,
        workspace: &mut ArtifactWorkspace,
    ) -> Result<(), ToolError> {
        let assets = workspace
            .analysis
            .as_ref()
            .map(|a| a.assets.clone())
            .unwrap_or_default();
        for asset in assets {
            let contents = fs::read_to_string(&asset).await?;
            workspace.staged_assets.insert(asset, contents);
        }
        Ok(())
    }

    async fn inline_assets(
        &self,
        entry: &EntryPoint,
        workspace: &mut ArtifactWorkspace,
    ) -> Result<(), ToolError> {
        if let Some(template) = &self.commands.inline_assets {
            let stage_dir = workspace.stage_dir.to_string_lossy().into_owned();
            let argv = render(
                template,
                &[
                    ("entry", &entry.entry_file.to_string_lossy()),
                    ("outDir", &stage_dir),
                ],
            );
            return self.run("inline-assets", &argv).await;
        }
        debug!(
            "No inline command configured; {} staged assets left as-is",
            workspace.staged_assets.len()
        );
        Ok(())
    }

    async fn compile(
        &self,
        entry: &EntryPoint,
        config: &CompileConfig,
        workspace: &ArtifactWorkspace,
    ) -> Result<CompileOutput, ToolError> {
        let js = workspace
            .stage_dir
            .join(format!("{}.js", entry.flat_module_file));
        let typings = workspace
            .stage_dir
            .join(format!("{}.d.ts", entry.flat_module_file));

        if let Some(template) = &self.commands.compile {
            let argv = render(
                template,
                &[
                    ("entry", &config.entry_file.to_string_lossy()),
                    ("outDir", &workspace.stage_dir.to_string_lossy()),
                    ("flatModuleFile", &entry.flat_module_file),
                ],
            );
            self.run("compile", &argv).await?;
        } else {
            copy_file(&config.entry_file, &js).await?;
            fs::write(&typings, "export {};\n").await?;
        }

        let metadata = workspace
            .stage_dir
            .join(format!("{}.metadata.json", entry.flat_module_file));
        if !fs::try_exists(&metadata).await? {
            let doc = json!({ "version": 1, "moduleId": entry.module_id });
            fs::write(&metadata, serde_json::to_string_pretty(&doc)? + "\n")
                .await
                .map_err(ToolError::Io)?;
        }

        Ok(CompileOutput { js, typings })
    }

    async fn bundle(&self, request: &BundleRequest) -> Result<PathBuf, ToolError> {
        if let Some(parent) = request.dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Some(template) = &self.commands.bundle {
            let argv = render(
                template,
                &[
                    ("entry", &request.entry.to_string_lossy()),
                    ("dest", &request.dest.to_string_lossy()),
                    ("module", &request.module_name),
                    ("format", request.format.as_str()),
                    ("externals", &request.externals.join(",")),
                ],
            );
            self.run("bundle", &argv).await?;
        } else {
            copy_file(&request.entry, &request.dest).await?;
            copy_companion_map(&request.entry, &request.dest).await?;
        }

        Ok(request.dest.clone())
    }

    async fn downlevel(&self, input: &Path, dest: &Path) -> Result<PathBuf, ToolError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Some(template) = &self.commands.downlevel {
            let argv = render(
                template,
                &[
                    ("entry", &input.to_string_lossy()),
                    ("dest", &dest.to_string_lossy()),
                ],
            );
            self.run("downlevel", &argv).await?;
        } else {
            copy_file(input, dest).await?;
            copy_companion_map(input, dest).await?;
        }

        Ok(dest.to_path_buf())
    }

    async fn minify(&self, input: &Path) -> Result<PathBuf, ToolError> {
        let name = input
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ToolError::Internal(format!("Invalid bundle path {}", input.display())))?;
        let min_name = match name.strip_suffix(".js") {
            Some(stem) => format!("{stem}.min.js"),
            None => format!("{name}.min"),
        };
        let dest = input.with_file_name(min_name);

        if let Some(template) = &self.commands.minify {
            let argv = render(
                template,
                &[
                    ("entry", &input.to_string_lossy()),
                    ("dest", &dest.to_string_lossy()),
                ],
            );
            self.run("minify", &argv).await?;
        } else {
            copy_file(input, &dest).await?;
            copy_companion_map(input, &dest).await?;
        }

        Ok(dest)
    }

    async fn remap_source_map(&self, file: &Path) -> Result<(), ToolError> {
        if let Some(template) = &self.commands.remap_source_map {
            let argv = render(template, &[("file", &file.to_string_lossy())]);
            return self.run("remap-source-map", &argv).await;
        }
        Ok(())
    }

    async fn relocate_source_map_roots(
        &self,
        _entry: &EntryPoint,
        workspace: &ArtifactWorkspace,
    ) -> Result<(), ToolError> {
        for bundle in workspace.bundle_variants() {
            let map = map_path(bundle);
            if !fs::try_exists(&map).await? {
                continue;
            }

            let contents = fs::read_to_string(&map).await?;
            let mut doc: serde_json::Value = serde_json::from_str(&contents)
                .map_err(|e| ToolError::Internal(format!("Invalid source map {}: {e}", map.display())))?;

            doc["sourceRoot"] = json!("");
            if let Some(sources) = doc.get_mut("sources").and_then(|s| s.as_array_mut()) {
                for source in sources {
                    if let Some(path) = source.as_str() {
                        let file_name = Path::new(path)
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_else(|| path.to_string());
                        *source = json!(file_name);
                    }
                }
            }

            let rewritten = serde_json::to_string(&doc)?;
            if rewritten != contents {
                fs::write(&map, rewritten).await?;
            }
        }
        Ok(())
    }

    async fn write_manifest(
        &self,
        entry: &EntryPoint,
        paths: &ManifestPaths,
    ) -> Result<(), ToolError> {
        let manifest = json!({
            "name": entry.module_id,
            "main": paths.main,
            "module": paths.module,
            "es2015": paths.es2015,
            "typings": paths.typings,
            "metadata": paths.metadata,
        });
        fs::create_dir_all(&entry.destination).await?;
        fs::write(
            entry.destination.join("package.json"),
            serde_json::to_string_pretty(&manifest)? + "\n",
        )
        .await?;
        Ok(())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Internal(err.to_string())
    }
}
