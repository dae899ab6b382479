// src/engine/mod.rs

//! Build-pass engine for siteforge.
//!
//! This module ties together:
//! - the plugin registration protocol (`watch` / `on_complete`)
//! - the pass scheduler that runs per-file handlers to settlement and then
//!   the completion callbacks
//! - the orchestrator that holds the explicit, ordered plugin list

pub mod orchestrator;
pub mod plugin;
pub mod scheduler;

pub use orchestrator::Orchestrator;
pub use plugin::{
    completion, handler, BuildPlugin, Completion, EventKind, Handler, PassBuilder, PassPlan,
    TaskFuture, WatchRegistration,
};
pub use scheduler::{run_pass, PassSummary, PluginReport};
