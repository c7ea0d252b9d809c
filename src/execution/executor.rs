//! Pipeline executor - runs one entry point through the fixed stage sequence

use crate::core::{ArtifactWorkspace, BuildStatus, EntryPoint, Package};
use crate::execution::BuildError;
use crate::tools::{BundleFormat, BundleRequest, ManifestPaths, ToolChain};
use crate::util::fs::{copy_dir, rimraf};
use crate::util::path::relative_unix;
use tokio::fs;
use tracing::{info, warn};

/// Outcome of running one entry point through the pipeline
///
/// Replaces the string sentinel of queue-based build tools with a tagged
/// value so the scheduler's dispatch is exhaustive. Fatal errors propagate
/// through `Result`, not through this enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// All fourteen stages completed; the entry point's status is `Success`
    Success,

    /// A declared dependency has not been built yet; the entry point must be
    /// requeued and retried after the missing dependencies finish
    DependenciesNotSatisfied { missing: Vec<String> },
}

/// Runs a single entry point through the stage sequence, threading artifact
/// locations between stages through an [`ArtifactWorkspace`]
pub struct EntryPointExecutor<T> {
    tools: T,
}

impl<T: ToolChain> EntryPointExecutor<T> {
    pub fn new(tools: T) -> Self {
        Self { tools }
    }

    /// Build one entry point
    ///
    /// Stages run strictly in order, each awaited before the next starts.
    /// Returns the dependency sentinel without touching stages 5-14 when a
    /// declared dependency is not `Success` yet. Any stage failure leaves the
    /// entry point `InProgress` and propagates as [`BuildError::Stage`].
    pub async fn build(
        &self,
        pkg: &mut Package,
        module_id: &str,
    ) -> Result<BuildOutcome, BuildError> {
        let entry = pkg
            .entry_point(module_id)
            .ok_or_else(|| BuildError::UnknownEntryPoint(module_id.to_string()))?
            .clone();
        let mut workspace = ArtifactWorkspace::new(&entry, pkg);

        pkg.entry_point_mut(module_id)
            .ok_or_else(|| BuildError::UnknownEntryPoint(module_id.to_string()))?
            .status = BuildStatus::InProgress;
        info!("Building entry point '{}'", entry.module_id);

        // 1. Clean output and staging directories. The package's root output
        // directory belongs to the driver and is cleaned exactly once before
        // any unit builds; only a unit-owned subdirectory is removed here.
        info!("Cleaning build directories");
        if workspace.out_dir != pkg.dest {
            rimraf(&workspace.out_dir).await?;
        }
        rimraf(&workspace.stage_dir).await?;
        fs::create_dir_all(workspace.es2015_dir()).await?;
        fs::create_dir_all(workspace.es5_dir()).await?;
        fs::create_dir_all(workspace.bundles_dir()).await?;

        // 2. Per-unit compiler configuration
        let mut config = self
            .tools
            .prepare_config(&entry, pkg)
            .await
            .map_err(stage_err("prepare-config", module_id))?;

        // 3. First compiler pass: asset references and intra-unit dependencies
        let analysis = self
            .tools
            .analyse_sources(&entry, &config)
            .await
            .map_err(stage_err("analyse-sources", module_id))?;
        workspace.analysis = Some(analysis);

        // 4. Dependency-path adjustment
        if !entry.depends_on.is_empty() {
            info!(
                "'{}' depends on {}",
                entry.module_id,
                entry.depends_on.join(", ")
            );
            let missing = entry.unsatisfied_dependencies(pkg);
            if !missing.is_empty() {
                warn!("Need to build {} first", missing.join(", "));
                return Ok(BuildOutcome::DependenciesNotSatisfied { missing });
            }
            for dep in &entry.depends_on {
                let dep_entry = pkg
                    .entry_point(dep)
                    .ok_or_else(|| BuildError::UnknownEntryPoint(dep.clone()))?;
                config
                    .paths
                    .entry(dep.clone())
                    .or_default()
                    .push(dep_entry.destination.clone());
            }
        }

        // 5. Stage referenced assets in the workspace
        info!("Processing assets");
        self.tools
            .process_assets(&entry, &mut workspace)
            .await
            .map_err(stage_err("process-assets", module_id))?;

        // 6. Inline templates and styles
        info!("Inlining templates and styles");
        self.tools
            .inline_assets(&entry, &mut workspace)
            .await
            .map_err(stage_err("inline-assets", module_id))?;

        // 7. Compile
        info!("Compiling sources");
        let compiled = self
            .tools
            .compile(&entry, &config, &workspace)
            .await
            .map_err(stage_err("compile", module_id))?;

        // 8. Flat ES2015 bundle
        info!("Bundling to flat ES2015 module");
        let es2015_dest = workspace
            .es2015_dir()
            .join(format!("{}.js", entry.flat_module_file));
        let es2015_file = self
            .tools
            .bundle(&BundleRequest {
                module_name: entry.module_id.clone(),
                entry: compiled.js.clone(),
                format: BundleFormat::Es2015,
                dest: es2015_dest,
                externals: entry.externals.clone(),
            })
            .await
            .map_err(stage_err("bundle-es2015", module_id))?;
        self.tools
            .remap_source_map(&es2015_file)
            .await
            .map_err(stage_err("remap-source-map", module_id))?;
        workspace.compiled = Some(compiled);

        // 9. ES5 downlevel
        info!("Downlevelling to ES5");
        let es5_dest = workspace
            .es5_dir()
            .join(format!("{}.js", entry.flat_module_file));
        let es5_file = self
            .tools
            .downlevel(&es2015_file, &es5_dest)
            .await
            .map_err(stage_err("downlevel", module_id))?;
        self.tools
            .remap_source_map(&es5_file)
            .await
            .map_err(stage_err("remap-source-map", module_id))?;
        workspace.es2015_bundle = Some(es2015_file);

        // 10. Universal-module bundle
        info!("Bundling to universal module");
        let umd_dest = workspace
            .bundles_dir()
            .join(format!("{}.umd.js", entry.flat_module_file));
        let umd_file = self
            .tools
            .bundle(&BundleRequest {
                module_name: entry.umd_module_id.clone(),
                entry: es5_file.clone(),
                format: BundleFormat::Umd,
                dest: umd_dest,
                externals: entry.externals.clone(),
            })
            .await
            .map_err(stage_err("bundle-umd", module_id))?;
        self.tools
            .remap_source_map(&umd_file)
            .await
            .map_err(stage_err("remap-source-map", module_id))?;
        workspace.es5_bundle = Some(es5_file);

        // 11. Minify
        info!("Minifying universal-module bundle");
        let min_file = self
            .tools
            .minify(&umd_file)
            .await
            .map_err(stage_err("minify", module_id))?;
        self.tools
            .remap_source_map(&min_file)
            .await
            .map_err(stage_err("remap-source-map", module_id))?;
        workspace.umd_bundle = Some(umd_file);
        workspace.umd_min_bundle = Some(min_file);

        // 12. Fix staged source-map roots for the final published location
        info!("Relocating source map roots");
        self.tools
            .relocate_source_map_roots(&entry, &workspace)
            .await
            .map_err(stage_err("relocate-source-maps", module_id))?;

        // 13. Publish staged artifacts to the destination directory
        info!("Publishing artifacts to {}", workspace.out_dir.display());
        copy_dir(&workspace.stage_dir, &workspace.out_dir).await?;

        // 14. Manifest fragment
        info!("Writing package manifest");
        let manifest = manifest_paths(&entry, &workspace);
        self.tools
            .write_manifest(&entry, &manifest)
            .await
            .map_err(stage_err("write-manifest", module_id))?;

        pkg.entry_point_mut(module_id)
            .ok_or_else(|| BuildError::UnknownEntryPoint(module_id.to_string()))?
            .status = BuildStatus::Success;
        info!("Built '{}'", entry.module_id);
        Ok(BuildOutcome::Success)
    }
}

/// Manifest fields, relative to the unit's destination with forward slashes
fn manifest_paths(entry: &EntryPoint, workspace: &ArtifactWorkspace) -> ManifestPaths {
    let out = &workspace.out_dir;
    let flat = &entry.flat_module_file;
    let rel = |path: &std::path::Path| relative_unix(out, path);

    ManifestPaths {
        main: rel(&out.join("bundles").join(format!("{flat}.umd.js"))),
        module: rel(&out.join("esm5").join(format!("{flat}.js"))),
        es2015: rel(&out.join("esm2015").join(format!("{flat}.js"))),
        typings: rel(&out.join(format!("{flat}.d.ts"))),
        metadata: rel(&out.join(format!("{flat}.metadata.json"))),
    }
}

fn stage_err<'a>(
    stage: &'static str,
    module_id: &'a str,
) -> impl FnOnce(crate::tools::ToolError) -> BuildError + 'a {
    move |source| BuildError::Stage {
        stage,
        module_id: module_id.to_string(),
        source,
    }
}
