// src/plugins/transpile.rs

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::engine::{completion, handler, BuildPlugin, PassBuilder};
use crate::fsutil;
use crate::watch::WatchSpec;

/// Options passed through to the transform payload.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Transform features to disable. Client and server builds may carry
    /// different blacklists (e.g. generator lowering only on one of them).
    pub blacklist: Vec<String>,
}

/// The transpilation payload seam.
///
/// The core never inspects file contents; whatever rewriting happens is the
/// payload's business. Output bytes replace the input bytes at the
/// destination path.
pub trait Transform: Send + Sync {
    fn apply(&self, source: &[u8], path: &Path, options: &TransformOptions) -> Result<Vec<u8>>;
}

/// Byte-preserving default payload.
#[derive(Debug, Clone, Default)]
pub struct PassthroughTransform;

impl Transform for PassthroughTransform {
    fn apply(&self, source: &[u8], _path: &Path, _options: &TransformOptions) -> Result<Vec<u8>> {
        Ok(source.to_vec())
    }
}

/// Options for [`TranspilePlugin`], with defaults applied at construction.
#[derive(Debug, Clone)]
pub struct TranspileOptions {
    pub destination: String,
    pub extensions: Vec<String>,
    pub excluded_directories: Vec<String>,
    pub excluded_patterns: Vec<String>,
    pub blacklist: Vec<String>,
    pub task_name: String,
    pub quiet: bool,
}

impl TranspileOptions {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            extensions: vec!["js".to_string()],
            excluded_directories: Vec::new(),
            excluded_patterns: Vec::new(),
            blacklist: Vec::new(),
            task_name: "transpile".to_string(),
            quiet: false,
        }
    }
}

/// Transforms every matched source file into the destination tree,
/// normalizing the extension to `js`.
///
/// The plugin's own destination is excluded from its watch set so a second
/// pass never re-transpiles previously written output.
pub struct TranspilePlugin {
    root: PathBuf,
    options: Arc<TranspileOptions>,
    transform: Arc<dyn Transform>,
}

impl TranspilePlugin {
    pub fn new(root: PathBuf, options: TranspileOptions, transform: Arc<dyn Transform>) -> Self {
        Self {
            root,
            options: Arc::new(options),
            transform,
        }
    }
}

impl BuildPlugin for TranspilePlugin {
    fn name(&self) -> &str {
        &self.options.task_name
    }

    fn register(&self, pass: &mut PassBuilder) -> Result<()> {
        let options = &self.options;

        let mut builder = WatchSpec::builder(&options.destination).task(&options.task_name);
        for ext in &options.extensions {
            builder = builder.include(format!("**/*.{ext}"));
        }
        for dir in &options.excluded_directories {
            builder = builder.exclude_dir(dir);
        }
        for pattern in &options.excluded_patterns {
            builder = builder.exclude_regex(pattern);
        }
        let spec = builder.build()?;

        let rewritten = Arc::new(AtomicUsize::new(0));

        let watch_handler = {
            let root = self.root.clone();
            let options = Arc::clone(options);
            let transform = Arc::clone(&self.transform);
            let rewritten = Arc::clone(&rewritten);

            handler(move |path, _event, _info| {
                let root = root.clone();
                let options = Arc::clone(&options);
                let transform = Arc::clone(&transform);
                let rewritten = Arc::clone(&rewritten);

                async move {
                    let output_rel = fsutil::change_extension(
                        &Path::new(&options.destination).join(&path),
                        "js",
                        &options.extensions,
                    );
                    let output = root.join(&output_rel);

                    let contents = fsutil::read(&root.join(&path)).await?;
                    let transform_options = TransformOptions {
                        blacklist: options.blacklist.clone(),
                    };
                    let result = transform.apply(&contents, &path, &transform_options)?;
                    fsutil::write(&output, &result).await?;

                    rewritten.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        task = %options.task_name,
                        from = %path.display(),
                        to = %output_rel.display(),
                        "transpiled"
                    );
                    Ok(())
                }
            })
        };

        pass.watch(spec, watch_handler, format!("{}-all", options.task_name));

        let options = Arc::clone(options);
        pass.on_complete(completion(move || async move {
            if !options.quiet {
                info!(
                    task = %options.task_name,
                    count = rewritten.load(Ordering::Relaxed),
                    "rewrote files"
                );
            }
            Ok(())
        }));

        Ok(())
    }
}
