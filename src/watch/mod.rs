// src/watch/mod.rs

//! Watch-pattern compilation and matching.
//!
//! This module is responsible for:
//! - Compiling a plugin's inclusion globs and exclusion tokens into a
//!   [`patterns::WatchSpec`].
//! - Deciding whether a candidate path is of interest to a plugin.
//!
//! It does **not** know about plugins or scheduling; it only answers
//! "does this relative path match this pattern set".

pub mod patterns;

pub use patterns::{MatchInfo, WatchSpec, WatchSpecBuilder};
