//! Entry-point scheduler - orders builds across dependency edges

use crate::core::{BuildStatus, Package};
use crate::execution::driver::BuildEvent;
use crate::execution::executor::{BuildOutcome, EntryPointExecutor};
use crate::execution::BuildError;
use crate::tools::ToolChain;
use std::collections::VecDeque;
use tracing::{info, warn};

/// FIFO scheduler over a package's entry points
///
/// No topological pre-sort: build order emerges from repeated passes. A unit
/// whose dependencies are not built yet is reset to `Pending` and re-appended
/// to the back of the queue. The queue is an owned value, never aliased, so
/// the in-progress re-dequeue check is exact under single-threaded
/// scheduling.
pub struct EntryPointScheduler {
    queue: VecDeque<String>,
}

impl EntryPointScheduler {
    /// Seed the queue with `[primary, secondaries...]`
    pub fn for_package(pkg: &Package) -> Self {
        Self {
            queue: pkg.module_ids().into(),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drive every entry point to `Success`
    ///
    /// Two cycle guards, both fatal and never retried: an entry point
    /// dequeued while still `InProgress`, and a full round of deferrals with
    /// no unit completing in between (which is how a true dependency cycle
    /// manifests under retry-by-requeue).
    pub async fn run<T: ToolChain>(
        &mut self,
        executor: &EntryPointExecutor<T>,
        pkg: &mut Package,
        on_event: &(dyn Fn(&BuildEvent) + Send + Sync),
    ) -> Result<(), BuildError> {
        let mut deferrals_since_progress = 0usize;

        while let Some(module_id) = self.queue.pop_front() {
            let status = pkg
                .entry_point(&module_id)
                .ok_or_else(|| BuildError::UnknownEntryPoint(module_id.clone()))?
                .status;
            if status == BuildStatus::InProgress {
                warn!("'{}' dequeued while still in progress", module_id);
                return Err(BuildError::CyclicDependency(module_id));
            }

            on_event(&BuildEvent::EntryPointStarted {
                module_id: module_id.clone(),
            });

            match executor.build(pkg, &module_id).await? {
                BuildOutcome::Success => {
                    deferrals_since_progress = 0;
                    on_event(&BuildEvent::EntryPointBuilt {
                        module_id: module_id.clone(),
                    });
                }
                BuildOutcome::DependenciesNotSatisfied { missing } => {
                    pkg.entry_point_mut(&module_id)
                        .ok_or_else(|| BuildError::UnknownEntryPoint(module_id.clone()))?
                        .status = BuildStatus::Pending;
                    info!("Deferring '{}' until {} built", module_id, missing.join(", "));
                    on_event(&BuildEvent::EntryPointDeferred {
                        module_id: module_id.clone(),
                        missing,
                    });
                    self.queue.push_back(module_id.clone());

                    deferrals_since_progress += 1;
                    if deferrals_since_progress > self.queue.len() {
                        warn!("No entry point can make progress");
                        return Err(BuildError::CyclicDependency(module_id));
                    }
                }
            }
        }

        Ok(())
    }
}
