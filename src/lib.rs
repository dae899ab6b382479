// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod fsutil;
pub mod logging;
pub mod overlay;
pub mod plugins;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use walkdir::WalkDir;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::context::BuildContext;
use crate::engine::{Orchestrator, PassSummary};
use crate::plugins::{
    ClientBuildOptions, ClientBuildPlugin, DataOptions, DataPlugin, NullBundler,
    PassthroughTransform, TranspileOptions, TranspilePlugin,
};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the source-tree candidate scan
/// - the ordered plugin list (data, then transpile, then client/dev build)
/// - one build pass
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;

    if args.quiet {
        cfg.site.quiet = true;
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let root = config_root_dir(&config_path);
    let ctx = Arc::new(BuildContext::new());

    let summary = run_build(&root, &cfg, ctx).await?;

    for report in &summary.plugins {
        info!(
            task = %report.task_name,
            matched = report.matched,
            failed = report.failed,
            "pass summary"
        );
    }

    Ok(())
}

/// Scan the tree, assemble the orchestrator and run one pass.
///
/// Split out of [`run`] so callers (and tests) can supply their own
/// [`BuildContext`] and inspect it afterwards.
pub async fn run_build(
    root: &Path,
    cfg: &ConfigFile,
    ctx: Arc<BuildContext>,
) -> Result<PassSummary> {
    let candidates = scan_candidates(root, &cfg.site.destination)?;
    let orchestrator = build_orchestrator(root, cfg, ctx);
    orchestrator.run(&candidates).await
}

/// Assemble the fixed, ordered plugin list from configuration.
///
/// Data loading runs first so later content consumers see a fully populated
/// context; the client/dev builder is last because its completion phase
/// rewrites the build tree it depends on.
pub fn build_orchestrator(root: &Path, cfg: &ConfigFile, ctx: Arc<BuildContext>) -> Orchestrator {
    let mut orchestrator = Orchestrator::new();

    if cfg.tasks.data.enabled {
        orchestrator.register(Box::new(DataPlugin::new(
            root.to_path_buf(),
            data_options(cfg),
            ctx,
        )));
    }

    orchestrator.register(Box::new(TranspilePlugin::new(
        root.to_path_buf(),
        transpile_options(cfg),
        Arc::new(PassthroughTransform),
    )));

    orchestrator.register(Box::new(ClientBuildPlugin::new(
        root.to_path_buf(),
        client_options(cfg),
        Arc::new(NullBundler),
    )));

    orchestrator
}

fn data_options(cfg: &ConfigFile) -> DataOptions {
    let section = &cfg.tasks.data;
    DataOptions {
        dirs: section.dirs.clone(),
        quiet: cfg.site.quiet,
        ..DataOptions::new(&cfg.site.destination)
    }
}

fn transpile_options(cfg: &ConfigFile) -> TranspileOptions {
    let section = &cfg.tasks.transpile;
    TranspileOptions {
        extensions: section.extensions.clone(),
        excluded_directories: section.excluded_directories.clone(),
        excluded_patterns: section.excluded_patterns.clone(),
        blacklist: section.blacklist.clone(),
        task_name: section.task_name.clone(),
        quiet: section.quiet.unwrap_or(cfg.site.quiet),
        ..TranspileOptions::new(&cfg.site.destination)
    }
}

fn client_options(cfg: &ConfigFile) -> ClientBuildOptions {
    let section = &cfg.tasks.client;
    ClientBuildOptions {
        extensions: section.extensions.clone(),
        dirs_exclude: section.dirs_exclude.clone(),
        patterns_exclude: section.patterns_exclude.clone(),
        client_js_suffix: section.client_js_suffix.clone(),
        dev_js_suffix: section.dev_js_suffix.clone(),
        original_js_suffix: section.original_js_suffix.clone(),
        build_dev: section.build_dev,
        entry_point: section.entry_point.clone(),
        client_bundle_name: section.client_bundle_name.clone(),
        dev_bundle_name: section.dev_bundle_name.clone(),
        dir_client_build: section.dir_client_build.clone(),
        dir_dev_build: section.dir_dev_build.clone(),
        bundle_debug: section.bundle_debug,
        externals: section.externals.clone(),
        task_name: section.task_name.clone(),
        quiet: section.quiet.unwrap_or(cfg.site.quiet),
        ..ClientBuildOptions::new(&cfg.site.source, &cfg.site.destination)
    }
}

/// Collect candidate paths under `root`, relative to it.
///
/// The destination subtree is skipped outright (it is also an implied
/// pattern exclusion for every plugin, but there is no reason to walk it),
/// as are dot-directories like `.git`.
pub fn scan_candidates(root: &Path, destination: &str) -> Result<Vec<PathBuf>> {
    let destination = destination.trim_end_matches('/');
    let mut candidates = Vec::new();

    let walker = WalkDir::new(root).min_depth(1).into_iter();
    let entries = walker.filter_entry(|entry| {
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') {
            return false;
        }
        if entry.depth() == 1 && entry.file_type().is_dir() && name == destination {
            return false;
        }
        true
    });

    for entry in entries {
        let entry = entry.with_context(|| format!("walking source tree under {:?}", root))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("relativizing {:?} against {:?}", entry.path(), root))?;
        candidates.push(rel.to_path_buf());
    }

    candidates.sort();
    Ok(candidates)
}

/// Figure out the project root: directory containing the config file, or `.`.
fn config_root_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Simple dry-run output: print the plugin plan.
fn print_dry_run(cfg: &ConfigFile) {
    println!("siteforge dry-run");
    println!("  site.source = {}", cfg.site.source);
    println!("  site.destination = {}", cfg.site.destination);
    println!();

    if cfg.tasks.data.enabled {
        println!("task load-data:");
        println!("    data dirs: {:?}", cfg.tasks.data.dirs);
    }

    println!("task {}:", cfg.tasks.transpile.task_name);
    println!("    extensions: {:?}", cfg.tasks.transpile.extensions);
    if !cfg.tasks.transpile.excluded_directories.is_empty() {
        println!(
            "    excluded dirs: {:?}",
            cfg.tasks.transpile.excluded_directories
        );
    }

    let client = &cfg.tasks.client;
    println!("task {}:", client.task_name);
    println!(
        "    client: {}/{} (bundle {})",
        cfg.site.destination, client.dir_client_build, client.client_bundle_name
    );
    if client.build_dev {
        println!(
            "    dev: {}/{} (bundle {})",
            cfg.site.destination, client.dir_dev_build, client.dev_bundle_name
        );
    }
}
