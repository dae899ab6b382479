// src/errors.rs

//! Crate-wide error taxonomy.
//!
//! Most functions propagate `anyhow::Result` with context attached at I/O and
//! parse boundaries. The variants below classify the failures a build pass
//! treats differently:
//!
//! - pattern compilation problems are fatal at plugin registration time,
//! - per-file handler failures are logged and isolated to that (task, path),
//! - completion-callback failures abort the whole pass,
//! - a variant recorded during the watch phase but absent at overlay time is
//!   a data inconsistency and also aborts the pass.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("invalid pattern '{pattern}' in task '{task}': {reason}")]
    PatternConfig {
        task: String,
        pattern: String,
        reason: String,
    },

    #[error("handler failed for {path:?} in task '{task}'")]
    Handler {
        task: String,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("completion callback failed in task '{task}'")]
    Completion {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("variant {path:?} was matched during the watch phase but no longer exists")]
    ResourceMissing { path: PathBuf },
}
