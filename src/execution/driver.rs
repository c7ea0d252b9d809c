//! Package build driver - end-to-end sequencing around the scheduler

use crate::core::config::PackageDescriptor;
use crate::core::{BuildStatus, Package};
use crate::execution::executor::EntryPointExecutor;
use crate::execution::scheduler::EntryPointScheduler;
use crate::execution::BuildError;
use crate::tools::ToolChain;
use crate::util::fs::{copy_file, rimraf};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{error, info};
use uuid::Uuid;

/// Ancillary files copied verbatim from the source root to the output root
const ANCILLARY_FILES: &[&str] = &["README.md", "LICENSE"];

/// Events emitted while a package builds
#[derive(Debug, Clone)]
pub enum BuildEvent {
    PackageStarted {
        build_id: Uuid,
        name: String,
        total_entry_points: usize,
    },
    EntryPointStarted {
        module_id: String,
    },
    EntryPointDeferred {
        module_id: String,
        missing: Vec<String>,
    },
    EntryPointBuilt {
        module_id: String,
    },
    PackageCompleted {
        build_id: Uuid,
    },
    PackageFailed {
        build_id: Uuid,
        error: String,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&BuildEvent) + Send + Sync>;

/// Final status of one entry point, for reporting
#[derive(Debug, Clone, Serialize)]
pub struct EntryPointReport {
    pub module_id: String,
    pub status: BuildStatus,
}

/// Summary of a completed package build
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub build_id: Uuid,
    pub package_name: String,
    pub src: PathBuf,
    pub dest: PathBuf,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub entry_points: Vec<EntryPointReport>,
}

/// Top-level controller for one package build
///
/// Resolves the package model, cleans the root output directory once, runs
/// the scheduler to completion, copies ancillary files, and prunes the
/// working directory only on full success. On failure the working directory
/// is deliberately preserved and its location reported.
pub struct PackageBuildDriver<T> {
    executor: EntryPointExecutor<T>,
    handlers: Vec<EventHandler>,
}

impl<T: ToolChain> PackageBuildDriver<T> {
    pub fn new(tools: T) -> Self {
        Self {
            executor: EntryPointExecutor::new(tools),
            handlers: Vec::new(),
        }
    }

    /// Register an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&BuildEvent) + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(handler));
    }

    fn emit(&self, event: &BuildEvent) {
        for handler in &self.handlers {
            handler(event);
        }
    }

    /// Build the package described by a descriptor file
    ///
    /// A descriptor that cannot be read or resolved fails before any build
    /// state exists, so no working-directory note is reported for it.
    pub async fn build(&self, descriptor: &Path) -> Result<BuildReport, BuildError> {
        info!("Building package from {}", descriptor.display());

        let base_dir = descriptor.parent().unwrap_or_else(|| Path::new("."));
        let mut pkg = match PackageDescriptor::from_file(descriptor)
            .and_then(|d| d.to_package(base_dir))
        {
            Ok(pkg) => pkg,
            Err(e) => {
                let err = BuildError::Descriptor(e);
                error!("{err}");
                return Err(err);
            }
        };

        self.build_package(&mut pkg).await
    }

    /// Build an already-resolved package
    pub async fn build_package(&self, pkg: &mut Package) -> Result<BuildReport, BuildError> {
        let build_id = Uuid::new_v4();
        let started_at = Utc::now();

        self.emit(&BuildEvent::PackageStarted {
            build_id,
            name: pkg.name.clone(),
            total_entry_points: 1 + pkg.secondaries.len(),
        });

        match self.run_to_completion(pkg).await {
            Ok(()) => {
                info!(
                    "Built package '{}'\n - from: {}\n - to:   {}",
                    pkg.name,
                    pkg.src.display(),
                    pkg.dest.display()
                );
                self.emit(&BuildEvent::PackageCompleted { build_id });
                Ok(BuildReport {
                    build_id,
                    package_name: pkg.name.clone(),
                    src: pkg.src.clone(),
                    dest: pkg.dest.clone(),
                    started_at,
                    completed_at: Utc::now(),
                    entry_points: pkg
                        .entry_points()
                        .map(|e| EntryPointReport {
                            module_id: e.module_id.clone(),
                            status: e.status,
                        })
                        .collect(),
                })
            }
            Err(e) => {
                error!("{e}");
                info!(
                    "Build failed. The working directory was not pruned; files are kept at {}",
                    pkg.working_dir.display()
                );
                self.emit(&BuildEvent::PackageFailed {
                    build_id,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_to_completion(&self, pkg: &mut Package) -> Result<(), BuildError> {
        // The root output directory is cleaned exactly once, covering every
        // secondary destination nested under it.
        rimraf(&pkg.dest).await?;

        let mut scheduler = EntryPointScheduler::for_package(pkg);
        let emit = |event: &BuildEvent| self.emit(event);
        scheduler.run(&self.executor, pkg, &emit).await?;

        for name in ANCILLARY_FILES {
            let src = pkg.src.join(name);
            if fs::try_exists(&src).await? {
                copy_file(&src, &pkg.dest.join(name)).await?;
            }
        }

        // Prune scratch space for a successful build only.
        rimraf(&pkg.working_dir).await?;
        Ok(())
    }
}
