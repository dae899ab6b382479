// src/watch/patterns.rs

use std::fmt;

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;

use crate::errors::BuildError;

/// Metadata handed to a handler about why a path was dispatched.
#[derive(Debug, Clone)]
pub struct MatchInfo {
    /// The inclusion pattern that matched (first match wins for reporting).
    pub pattern: String,
}

/// Compiled inclusion/exclusion pattern set for one `watch` registration.
///
/// Patterns are evaluated against paths relative to the project root, with
/// forward slashes (e.g. `"src/app.js"`). Glob semantics come from `globset`:
/// `*` stays within a path segment, `**` crosses segments.
///
/// A path matches when it satisfies at least one inclusion glob and none of
/// the exclusion tokens. Exclusions always win, and the plugin's own
/// destination directory is excluded even when the caller never listed it —
/// otherwise a plugin would re-process its own output on the next pass.
#[derive(Clone)]
pub struct WatchSpec {
    include_patterns: Vec<String>,
    include_set: GlobSet,
    exclude_dirs: Vec<String>,
    exclude_set: Option<GlobSet>,
    exclude_regexes: Vec<Regex>,
}

impl fmt::Debug for WatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchSpec")
            .field("include_patterns", &self.include_patterns)
            .field("exclude_dirs", &self.exclude_dirs)
            .finish_non_exhaustive()
    }
}

impl WatchSpec {
    /// Start building a spec for a plugin writing into `destination`.
    ///
    /// The destination directory is seeded as an implied exclusion; explicit
    /// exclusions add to it and never replace it.
    pub fn builder(destination: impl Into<String>) -> WatchSpecBuilder {
        WatchSpecBuilder::new(destination)
    }

    /// Test a relative path against this spec.
    ///
    /// Returns the matched inclusion pattern, or `None` when no inclusion
    /// matches or any exclusion does. Pure; no side effects.
    pub fn matches(&self, rel_path: &str) -> Option<MatchInfo> {
        let matched = self.include_set.matches(rel_path);
        let first = matched.first()?;

        if self.is_excluded(rel_path) {
            return None;
        }

        Some(MatchInfo {
            pattern: self.include_patterns[*first].clone(),
        })
    }

    /// Convenience boolean form of [`WatchSpec::matches`].
    pub fn is_match(&self, rel_path: &str) -> bool {
        self.matches(rel_path).is_some()
    }

    fn is_excluded(&self, rel_path: &str) -> bool {
        if self
            .exclude_dirs
            .iter()
            .any(|dir| rel_path == dir || rel_path.starts_with(&format!("{dir}/")))
        {
            return true;
        }

        if let Some(set) = &self.exclude_set {
            if set.is_match(rel_path) {
                return true;
            }
        }

        self.exclude_regexes.iter().any(|re| re.is_match(rel_path))
    }
}

/// Builder for [`WatchSpec`].
///
/// All patterns are compiled exactly once in [`WatchSpecBuilder::build`];
/// a malformed glob or regex fails the build with a pattern-config error,
/// which callers treat as fatal at plugin registration time.
#[derive(Debug, Clone)]
pub struct WatchSpecBuilder {
    task: String,
    includes: Vec<String>,
    exclude_dirs: Vec<String>,
    exclude_globs: Vec<String>,
    exclude_regexes: Vec<String>,
}

impl WatchSpecBuilder {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            task: String::new(),
            includes: Vec::new(),
            exclude_dirs: vec![normalize_dir(&destination.into())],
            exclude_globs: Vec::new(),
            exclude_regexes: Vec::new(),
        }
    }

    /// Task name used in pattern-error messages.
    pub fn task(mut self, name: impl Into<String>) -> Self {
        self.task = name.into();
        self
    }

    /// Add an inclusion glob.
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.includes.push(pattern.into());
        self
    }

    /// Add a pattern token in the original `!`-prefixed form.
    ///
    /// - `"!dir/"` excludes the `dir/` subtree,
    /// - `"!<glob>"` excludes by glob,
    /// - anything else is an inclusion glob.
    pub fn token(self, token: &str) -> Self {
        match token.strip_prefix('!') {
            Some(rest) if rest.ends_with('/') => self.exclude_dir(rest),
            Some(rest) => self.exclude_glob(rest),
            None => self.include(token),
        }
    }

    /// Exclude everything under a directory.
    pub fn exclude_dir(mut self, dir: impl Into<String>) -> Self {
        self.exclude_dirs.push(normalize_dir(&dir.into()));
        self
    }

    /// Exclude by glob.
    pub fn exclude_glob(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_globs.push(pattern.into());
        self
    }

    /// Exclude by regular expression (compiled once at build time).
    pub fn exclude_regex(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_regexes.push(pattern.into());
        self
    }

    /// Compile the pattern set.
    pub fn build(self) -> Result<WatchSpec> {
        let include_set = build_globset(&self.task, &self.includes)?;

        let exclude_set = if self.exclude_globs.is_empty() {
            None
        } else {
            Some(build_globset(&self.task, &self.exclude_globs)?)
        };

        let mut exclude_regexes = Vec::with_capacity(self.exclude_regexes.len());
        for pattern in &self.exclude_regexes {
            let re = Regex::new(pattern).map_err(|err| BuildError::PatternConfig {
                task: self.task.clone(),
                pattern: pattern.clone(),
                reason: err.to_string(),
            })?;
            exclude_regexes.push(re);
        }

        Ok(WatchSpec {
            include_patterns: self.includes,
            include_set,
            exclude_dirs: self.exclude_dirs,
            exclude_set,
            exclude_regexes,
        })
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(task: &str, patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|err| BuildError::PatternConfig {
            task: task.to_string(),
            pattern: pattern.clone(),
            reason: err.to_string(),
        })?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Directory exclusions are stored without the trailing slash.
fn normalize_dir(dir: &str) -> String {
    dir.trim_end_matches('/').to_string()
}
