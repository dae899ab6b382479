// src/plugins/load_data.rs

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use tracing::info;

use crate::context::BuildContext;
use crate::engine::{completion, handler, BuildPlugin, PassBuilder};
use crate::fsutil;
use crate::watch::WatchSpec;

/// Options for [`DataPlugin`], with defaults applied at construction.
#[derive(Debug, Clone)]
pub struct DataOptions {
    /// Directories scanned for data files.
    pub dirs: Vec<String>,
    /// The build destination; always excluded from the watch set.
    pub destination: String,
    pub task_name: String,
    pub quiet: bool,
}

impl DataOptions {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            dirs: vec!["data".to_string()],
            destination: destination.into(),
            task_name: "load-data".to_string(),
            quiet: false,
        }
    }
}

/// Loads YAML/JSON files from the data directories into the build context.
///
/// `data/songs.yaml` lands under the key `songs`. Several files feeding the
/// same key concatenate when both hold arrays. A file that fails to parse is
/// reported for that file only; the rest of the batch proceeds.
pub struct DataPlugin {
    root: PathBuf,
    options: Arc<DataOptions>,
    ctx: Arc<BuildContext>,
}

impl DataPlugin {
    pub fn new(root: PathBuf, options: DataOptions, ctx: Arc<BuildContext>) -> Self {
        Self {
            root,
            options: Arc::new(options),
            ctx,
        }
    }
}

impl BuildPlugin for DataPlugin {
    fn name(&self) -> &str {
        &self.options.task_name
    }

    fn register(&self, pass: &mut PassBuilder) -> Result<()> {
        let options = &self.options;

        let mut builder = WatchSpec::builder(&options.destination).task(&options.task_name);
        for dir in &options.dirs {
            for ext in ["yaml", "yml", "json"] {
                builder = builder.include(format!("{dir}/**/*.{ext}"));
            }
        }
        let spec = builder.build()?;

        let loaded = Arc::new(AtomicUsize::new(0));

        let watch_handler = {
            let root = self.root.clone();
            let options = Arc::clone(options);
            let ctx = Arc::clone(&self.ctx);
            let loaded = Arc::clone(&loaded);

            handler(move |path, _event, _info| {
                let root = root.clone();
                let options = Arc::clone(&options);
                let ctx = Arc::clone(&ctx);
                let loaded = Arc::clone(&loaded);

                async move {
                    let key = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .ok_or_else(|| anyhow!("data file {:?} has no usable stem", path))?
                        .to_string();

                    let bytes = fsutil::read(&root.join(&path)).await?;
                    let records = parse_records(&path, &bytes)?;

                    if !records.is_null() {
                        ctx.merge_data(&key, records);
                        loaded.fetch_add(1, Ordering::Relaxed);
                        if !options.quiet {
                            info!(
                                task = %options.task_name,
                                file = %path.display(),
                                key = %key,
                                "loaded data file"
                            );
                        }
                    }

                    Ok(())
                }
            })
        };

        pass.watch(spec, watch_handler, options.task_name.clone());

        let options = Arc::clone(options);
        pass.on_complete(completion(move || async move {
            if !options.quiet {
                info!(
                    task = %options.task_name,
                    count = loaded.load(Ordering::Relaxed),
                    "data load complete"
                );
            }
            Ok(())
        }));

        Ok(())
    }
}

/// Parse a data file by extension into a JSON value.
fn parse_records(path: &std::path::Path, bytes: &[u8]) -> Result<Value> {
    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    if is_json {
        serde_json::from_slice(bytes).with_context(|| format!("parsing JSON from {:?}", path))
    } else {
        serde_yaml::from_slice(bytes).with_context(|| format!("parsing YAML from {:?}", path))
    }
}
