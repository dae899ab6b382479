// src/engine/orchestrator.rs

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::engine::plugin::BuildPlugin;
use crate::engine::scheduler::{self, PassSummary};

/// Drives one build pass over an explicit, ordered plugin list.
///
/// Order matters semantically: content/data plugins are registered before the
/// plugins that consume their output, and the variant/bundle plugin's
/// completion (which rewrites the build tree) runs last. Plugins do not
/// self-order; whoever assembles the orchestrator decides.
#[derive(Default)]
pub struct Orchestrator {
    plugins: Vec<Box<dyn BuildPlugin>>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin; registration order is execution order.
    pub fn register(&mut self, plugin: Box<dyn BuildPlugin>) {
        debug!(task = %plugin.name(), "plugin registered");
        self.plugins.push(plugin);
    }

    /// Run one watch-then-complete pass for every participating plugin.
    ///
    /// Plugins whose `participates_in_build()` is false are skipped for this
    /// pass but stay registered.
    pub async fn run(&self, candidates: &[PathBuf]) -> Result<PassSummary> {
        let participating: Vec<&dyn BuildPlugin> = self
            .plugins
            .iter()
            .filter(|p| p.participates_in_build())
            .map(|p| p.as_ref())
            .collect();

        info!(
            plugins = participating.len(),
            candidates = candidates.len(),
            "starting build pass"
        );

        scheduler::run_pass(&participating, candidates).await
    }
}
