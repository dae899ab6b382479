// src/engine/scheduler.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::engine::plugin::{BuildPlugin, EventKind, PassBuilder};
use crate::errors::BuildError;

/// Per-plugin outcome of one pass.
#[derive(Debug, Clone)]
pub struct PluginReport {
    pub task_name: String,
    /// Handler invocations dispatched (one per matched (registration, path)).
    pub matched: usize,
    /// Handler invocations that returned an error (isolated, not fatal).
    pub failed: usize,
    /// Completion callbacks run.
    pub completions: usize,
}

/// Outcome of a whole pass.
#[derive(Debug, Clone, Default)]
pub struct PassSummary {
    pub plugins: Vec<PluginReport>,
}

impl PassSummary {
    pub fn report(&self, name: &str) -> Option<&PluginReport> {
        self.plugins.iter().find(|p| p.task_name == name)
    }
}

/// Run one build pass over the candidate paths.
///
/// Phases, in order:
///
/// 1. Registration: each plugin declares its watches and completions; a
///    pattern-config failure here aborts before anything is dispatched.
/// 2. Watch phase: one handler future is spawned per (plugin, matched path)
///    pair. Handlers from all plugins interleave freely; a failing handler is
///    logged with its path and task name and does not disturb its siblings.
/// 3. Settle barrier: the pass waits until every handler has settled.
/// 4. Completion phase: each plugin's completion callbacks run in
///    registration order. A completion failure is fatal and aborts the
///    remaining sequence.
///
/// The barrier between 3 and 4 is what guarantees a completion callback can
/// never observe an in-flight handler of its own plugin.
pub async fn run_pass(
    plugins: &[&dyn BuildPlugin],
    candidates: &[PathBuf],
) -> Result<PassSummary> {
    let mut plans = Vec::with_capacity(plugins.len());
    for plugin in plugins {
        let mut builder = PassBuilder::new(plugin.name());
        plugin.register(&mut builder)?;
        plans.push(builder.into_plan());
    }

    let mut summary = PassSummary::default();
    for plan in &plans {
        summary.plugins.push(PluginReport {
            task_name: plan.task_name.clone(),
            matched: 0,
            failed: 0,
            completions: 0,
        });
    }

    // Watch phase: dispatch every matched (plugin, path) pair.
    let mut handlers: JoinSet<(usize, PathBuf, Result<()>)> = JoinSet::new();

    for (index, plan) in plans.iter().enumerate() {
        for registration in &plan.watches {
            for path in candidates {
                let rel = match candidate_str(path) {
                    Some(rel) => rel,
                    None => continue,
                };
                let Some(info) = registration.spec.matches(&rel) else {
                    continue;
                };

                debug!(
                    task = %plan.task_name,
                    label = %registration.label,
                    path = %rel,
                    "watch match -> dispatching handler"
                );

                summary.plugins[index].matched += 1;
                let future = (registration.handler)(path.clone(), EventKind::Added, info);
                let path = path.clone();
                handlers.spawn(async move { (index, path, future.await) });
            }
        }
    }

    // Settle barrier: every handler reaches completion before any
    // completion callback runs.
    while let Some(joined) = handlers.join_next().await {
        match joined {
            Ok((_, _, Ok(()))) => {}
            Ok((index, path, Err(err))) => {
                let report = &mut summary.plugins[index];
                report.failed += 1;
                let classified = BuildError::Handler {
                    task: report.task_name.clone(),
                    path,
                    source: err,
                };
                warn!(error = %classified, "handler failed; continuing with siblings");
            }
            Err(join_err) => {
                // A panicking handler is reported like a failing one, but we
                // cannot attribute it to a path anymore.
                warn!(error = %join_err, "handler task aborted");
            }
        }
    }

    // Completion phase, in registration order.
    for (index, plan) in plans.into_iter().enumerate() {
        let task_name = plan.task_name;
        for callback in plan.completions {
            callback().await.map_err(|err| BuildError::Completion {
                task: task_name.clone(),
                source: err,
            })?;
            summary.plugins[index].completions += 1;
        }

        let report = &summary.plugins[index];
        info!(
            task = %report.task_name,
            matched = report.matched,
            failed = report.failed,
            "plugin pass complete"
        );
    }

    Ok(summary)
}

/// Candidate paths are matched as forward-slash strings relative to the
/// project root.
fn candidate_str(path: &Path) -> Option<String> {
    let s = path.to_str()?;
    Some(s.replace('\\', "/"))
}
