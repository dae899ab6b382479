// src/plugins/client_build.rs

/*
    Assembles the browser-facing build targets.

    Two targets can exist: "client" and (when build_dev is set) "dev". Dev
    needs isomorphic versions of every file available; the client target may
    leave server-only modules out. The split is driven by suffixed variant
    files: `app~client.js` wins in the client target, `app~dev.js` wins in
    the dev target, and neither may leak into the other target's tree.
*/

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::engine::{completion, handler, BuildPlugin, PassBuilder, TaskFuture};
use crate::fsutil;
use crate::overlay::VariantOverlay;
use crate::watch::WatchSpec;

/// Options passed through to the bundler payload.
#[derive(Debug, Clone, Default)]
pub struct BundleOptions {
    pub debug: bool,
    /// Module names resolved outside the bundle.
    pub externals: Vec<String>,
}

/// The bundling payload seam.
///
/// Invoked once per build target during the completion phase, after variant
/// overlay has produced the final file layout for that target.
pub trait Bundler: Send + Sync {
    fn bundle(&self, entry: PathBuf, output: PathBuf, options: BundleOptions) -> TaskFuture;
}

/// Default payload: no bundling, just a log line.
#[derive(Debug, Clone, Default)]
pub struct NullBundler;

impl Bundler for NullBundler {
    fn bundle(&self, entry: PathBuf, output: PathBuf, _options: BundleOptions) -> TaskFuture {
        Box::pin(async move {
            debug!(
                entry = %entry.display(),
                output = %output.display(),
                "no bundler configured; skipping"
            );
            Ok(())
        })
    }
}

/// Options for [`ClientBuildPlugin`], with defaults applied at construction.
#[derive(Debug, Clone)]
pub struct ClientBuildOptions {
    pub source: String,
    pub destination: String,
    pub extensions: Vec<String>,
    pub dirs_exclude: Vec<String>,
    pub patterns_exclude: Vec<String>,
    pub client_js_suffix: String,
    pub dev_js_suffix: String,
    pub original_js_suffix: String,
    pub build_dev: bool,
    pub entry_point: String,
    pub client_bundle_name: String,
    pub dev_bundle_name: String,
    pub dir_client_build: String,
    pub dir_dev_build: String,
    pub bundle_debug: bool,
    pub externals: Vec<String>,
    pub task_name: String,
    pub quiet: bool,
}

impl ClientBuildOptions {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            extensions: vec!["js".to_string()],
            dirs_exclude: Vec::new(),
            patterns_exclude: Vec::new(),
            client_js_suffix: "~client".to_string(),
            dev_js_suffix: "~dev".to_string(),
            original_js_suffix: "_base".to_string(),
            build_dev: false,
            entry_point: "app.js".to_string(),
            client_bundle_name: "bundle.js".to_string(),
            dev_bundle_name: "bundle.js".to_string(),
            dir_client_build: "js".to_string(),
            dir_dev_build: "js-dev".to_string(),
            bundle_debug: false,
            externals: Vec::new(),
            task_name: "build-client".to_string(),
            quiet: false,
        }
    }
}

/// Copies js/json sources into the per-target build directories, keeping the
/// other target's variants out, then (on completion) overlays each target's
/// variants onto their canonical paths and bundles the entry point.
pub struct ClientBuildPlugin {
    root: PathBuf,
    options: Arc<ClientBuildOptions>,
    bundler: Arc<dyn Bundler>,
}

impl ClientBuildPlugin {
    pub fn new(root: PathBuf, options: ClientBuildOptions, bundler: Arc<dyn Bundler>) -> Self {
        Self {
            root,
            options: Arc::new(options),
            bundler,
        }
    }
}

impl BuildPlugin for ClientBuildPlugin {
    fn name(&self) -> &str {
        &self.options.task_name
    }

    fn register(&self, pass: &mut PassBuilder) -> Result<()> {
        let options = &self.options;

        let mut builder = WatchSpec::builder(&options.destination).task(&options.task_name);
        for ext in options.extensions.iter().map(String::as_str).chain(["json"]) {
            builder = builder.include(format!("{}/**/*.{}", options.source, ext));
        }
        for dir in &options.dirs_exclude {
            builder = builder.exclude_dir(dir);
        }
        for pattern in &options.patterns_exclude {
            builder = builder.exclude_regex(pattern);
        }
        let spec = builder.build()?;

        // Suffix markers compile once per pass, here.
        let client_overlay =
            VariantOverlay::new(&options.client_js_suffix, &options.original_js_suffix)?;
        let dev_overlay = VariantOverlay::new(&options.dev_js_suffix, &options.original_js_suffix)?;

        let client_files: Arc<Mutex<Vec<PathBuf>>> = Arc::new(Mutex::new(Vec::new()));
        let dev_files: Arc<Mutex<Vec<PathBuf>>> = Arc::new(Mutex::new(Vec::new()));

        let watch_handler = {
            let root = self.root.clone();
            let options = Arc::clone(options);
            let client_overlay = client_overlay.clone();
            let dev_overlay = dev_overlay.clone();
            let client_files = Arc::clone(&client_files);
            let dev_files = Arc::clone(&dev_files);

            handler(move |path, _event, _info| {
                let root = root.clone();
                let options = Arc::clone(&options);
                let client_overlay = client_overlay.clone();
                let dev_overlay = dev_overlay.clone();
                let client_files = Arc::clone(&client_files);
                let dev_files = Arc::clone(&dev_files);

                async move {
                    let is_client = client_overlay.canonical_path(&path).is_some();
                    let is_dev = dev_overlay.canonical_path(&path).is_some();

                    // In the client target, keep the ~dev files out.
                    if is_client {
                        client_files.lock().push(path.clone());
                    }
                    if !is_dev {
                        copy_into_target(&root, &options, &options.dir_client_build, &path).await?;
                    }

                    // In the dev target, keep the ~client files out.
                    if options.build_dev {
                        if is_dev {
                            dev_files.lock().push(path.clone());
                        }
                        if !is_client {
                            copy_into_target(&root, &options, &options.dir_dev_build, &path)
                                .await?;
                        }
                    }

                    Ok(())
                }
            })
        };

        pass.watch(spec, watch_handler, options.task_name.clone());

        let root = self.root.clone();
        let options = Arc::clone(options);
        let bundler = Arc::clone(&self.bundler);
        pass.on_complete(completion(move || async move {
            // Client target: overlay the ~client variants, then bundle.
            let variants = target_variant_paths(
                &root,
                &options,
                &options.dir_client_build,
                &client_files.lock(),
            )?;
            client_overlay.resolve(&variants).await?;
            bundle_target(
                &root,
                &options,
                &bundler,
                &options.dir_client_build,
                &options.client_bundle_name,
            )
            .await?;

            if !options.quiet {
                info!(
                    task = %options.task_name,
                    variants = variants.len(),
                    target = %options.dir_client_build,
                    "client target assembled"
                );
            }

            // Dev target, when requested.
            if options.build_dev {
                let variants = target_variant_paths(
                    &root,
                    &options,
                    &options.dir_dev_build,
                    &dev_files.lock(),
                )?;
                dev_overlay.resolve(&variants).await?;
                bundle_target(
                    &root,
                    &options,
                    &bundler,
                    &options.dir_dev_build,
                    &options.dev_bundle_name,
                )
                .await?;

                if !options.quiet {
                    info!(
                        task = %options.task_name,
                        variants = variants.len(),
                        target = %options.dir_dev_build,
                        "dev target assembled"
                    );
                }
            }

            Ok(())
        }));

        Ok(())
    }
}

/// Copy a matched source file into one build target, mirroring its
/// source-relative path and normalizing the extension to `js`.
async fn copy_into_target(
    root: &Path,
    options: &ClientBuildOptions,
    build_dir: &str,
    path: &Path,
) -> Result<()> {
    let target = build_tree_path(root, options, build_dir, path)?;
    fsutil::copy(&root.join(path), &target).await
}

/// Where a source-relative path lands inside one build target.
fn build_tree_path(
    root: &Path,
    options: &ClientBuildOptions,
    build_dir: &str,
    path: &Path,
) -> Result<PathBuf> {
    let rel = path
        .strip_prefix(&options.source)
        .with_context(|| format!("{:?} is not under source '{}'", path, options.source))?;
    let target = root
        .join(&options.destination)
        .join(build_dir)
        .join(rel);
    Ok(fsutil::change_extension(&target, "js", &options.extensions))
}

/// Map the variant paths recorded during the watch phase (source-relative)
/// to their locations in one build target's tree.
fn target_variant_paths(
    root: &Path,
    options: &ClientBuildOptions,
    build_dir: &str,
    files: &[PathBuf],
) -> Result<Vec<PathBuf>> {
    files
        .iter()
        .map(|path| build_tree_path(root, options, build_dir, path))
        .collect()
}

async fn bundle_target(
    root: &Path,
    options: &ClientBuildOptions,
    bundler: &Arc<dyn Bundler>,
    build_dir: &str,
    bundle_name: &str,
) -> Result<()> {
    let build_root = root.join(&options.destination).join(build_dir);
    bundler
        .bundle(
            build_root.join(&options.entry_point),
            build_root.join(bundle_name),
            BundleOptions {
                debug: options.bundle_debug,
                externals: options.externals.clone(),
            },
        )
        .await
}
