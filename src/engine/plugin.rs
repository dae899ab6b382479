// src/engine/plugin.rs

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;

use crate::watch::{MatchInfo, WatchSpec};

/// What happened to a dispatched path.
///
/// A batch pass over a freshly scanned tree dispatches everything as `Added`;
/// incremental rebuild passes dispatch `Changed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Added,
    Changed,
}

/// A suspendable unit of per-file (or completion) work.
pub type TaskFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// Per-file handler: invoked once per (registration, matched path) pair.
///
/// The path is relative to the project root. Handlers are cheap to call many
/// times; all real work happens inside the returned future.
pub type Handler = Arc<dyn Fn(std::path::PathBuf, EventKind, MatchInfo) -> TaskFuture + Send + Sync>;

/// Completion callback: runs exactly once, after every handler invocation of
/// the owning plugin has settled.
pub type Completion = Box<dyn FnOnce() -> TaskFuture + Send>;

/// Adapter so plugins can register plain async closures as handlers.
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(std::path::PathBuf, EventKind, MatchInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |path, event, info| -> TaskFuture { Box::pin(f(path, event, info)) })
}

/// Adapter so plugins can register plain async closures as completions.
pub fn completion<F, Fut>(f: F) -> Completion
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Box::new(move || -> TaskFuture { Box::pin(f()) })
}

/// One `watch(patterns, handler, label)` registration.
pub struct WatchRegistration {
    pub spec: WatchSpec,
    pub handler: Handler,
    pub label: String,
}

/// Everything one plugin registered for the current pass.
pub struct PassPlan {
    pub task_name: String,
    pub watches: Vec<WatchRegistration>,
    pub completions: Vec<Completion>,
}

/// Registration context handed to [`BuildPlugin::register`].
///
/// Multiple `watch` and `on_complete` calls are permitted and independent;
/// handlers registered here run interleaved during the watch phase, and the
/// completions run afterwards in registration order.
pub struct PassBuilder {
    task_name: String,
    watches: Vec<WatchRegistration>,
    completions: Vec<Completion>,
}

impl PassBuilder {
    pub fn new(task_name: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            watches: Vec::new(),
            completions: Vec::new(),
        }
    }

    /// Register a handler for a compiled pattern set.
    pub fn watch(&mut self, spec: WatchSpec, handler: Handler, label: impl Into<String>) {
        self.watches.push(WatchRegistration {
            spec,
            handler,
            label: label.into(),
        });
    }

    /// Register a callback to run after all of this plugin's handlers settle.
    pub fn on_complete(&mut self, callback: Completion) {
        self.completions.push(callback);
    }

    pub fn into_plan(self) -> PassPlan {
        PassPlan {
            task_name: self.task_name,
            watches: self.watches,
            completions: self.completions,
        }
    }
}

/// A build plugin.
///
/// Plugins are constructed from an options record with defaults already
/// applied; `register` is called once per pass and creates that pass's
/// watch registrations and completion callbacks. Per-pass accumulator state
/// (e.g. matched variant lists) belongs in `Arc`s created inside `register`
/// and shared between the handler and completion closures, so a plugin value
/// can be registered again for a later pass with a clean slate.
pub trait BuildPlugin: Send + Sync {
    /// Task name used in logs and summaries.
    fn name(&self) -> &str;

    /// Whether this plugin takes part in the build pass.
    fn participates_in_build(&self) -> bool {
        true
    }

    /// Declare watch patterns and completion callbacks for one pass.
    ///
    /// Pattern compilation failures returned here abort the pass before any
    /// handler is dispatched.
    fn register(&self, pass: &mut PassBuilder) -> Result<()>;
}
