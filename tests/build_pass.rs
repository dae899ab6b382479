use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use siteforge::config::ConfigFile;
use siteforge::context::BuildContext;
use siteforge::engine::{run_pass, BuildPlugin, TaskFuture};
use siteforge::plugins::{BundleOptions, Bundler, ClientBuildOptions, ClientBuildPlugin};
use siteforge::{run_build, scan_candidates};
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn Error>>;

fn write(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|_| panic!("missing {path:?}"))
}

fn site_fixture(root: &Path) -> std::io::Result<()> {
    write(&root.join("src/app.js"), "base")?;
    write(&root.join("src/app~client.js"), "client")?;
    write(&root.join("src/app~dev.js"), "dev")?;
    write(&root.join("src/lib/util.js"), "util")?;
    write(&root.join("data/songs.yaml"), "- first\n- second\n")?;
    Ok(())
}

fn fixture_config() -> ConfigFile {
    let mut cfg = ConfigFile::default();
    cfg.site.source = "src".to_string();
    cfg.site.destination = "out".to_string();
    cfg.tasks.client.build_dev = true;
    cfg
}

#[test]
fn scan_skips_destination_and_dot_dirs() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path();
    site_fixture(root)?;
    write(&root.join("out/js/stale.js"), "stale")?;
    write(&root.join(".git/objects/blob.js"), "not a source")?;

    let candidates = scan_candidates(root, "out")?;

    assert!(candidates.contains(&PathBuf::from("src/app.js")));
    assert!(candidates.contains(&PathBuf::from("data/songs.yaml")));
    assert!(!candidates.iter().any(|p| p.starts_with("out")));
    assert!(!candidates.iter().any(|p| p.starts_with(".git")));

    Ok(())
}

#[tokio::test]
async fn full_pass_assembles_both_targets() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path();
    site_fixture(root)?;

    let cfg = fixture_config();
    let ctx = Arc::new(BuildContext::new());
    let summary = run_build(root, &cfg, Arc::clone(&ctx)).await?;

    // Client target: ~client wins, base archived, ~dev never copied.
    assert_eq!(read(&root.join("out/js/app.js")), "client");
    assert_eq!(read(&root.join("out/js/app_base.js")), "base");
    assert!(!root.join("out/js/app~client.js").exists());
    assert!(!root.join("out/js/app~dev.js").exists());
    assert_eq!(read(&root.join("out/js/lib/util.js")), "util");

    // Dev target: ~dev wins, base archived, ~client never copied.
    assert_eq!(read(&root.join("out/js-dev/app.js")), "dev");
    assert_eq!(read(&root.join("out/js-dev/app_base.js")), "base");
    assert!(!root.join("out/js-dev/app~client.js").exists());
    assert!(!root.join("out/js-dev/app~dev.js").exists());

    // Transpile mirrors the whole tree (passthrough payload).
    assert_eq!(read(&root.join("out/src/app.js")), "base");
    assert_eq!(read(&root.join("out/src/lib/util.js")), "util");

    // Data landed in the context under the file stem.
    let songs = ctx.data("songs").expect("songs loaded");
    assert_eq!(songs, serde_json::json!(["first", "second"]));

    // Per-plugin summary counts.
    assert_eq!(summary.report("load-data").unwrap().matched, 1);
    assert_eq!(summary.report("transpile").unwrap().matched, 4);
    assert_eq!(summary.report("build-client").unwrap().matched, 4);

    Ok(())
}

#[tokio::test]
async fn second_pass_reproduces_the_same_layout() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path();
    site_fixture(root)?;

    let cfg = fixture_config();
    for _ in 0..2 {
        run_build(root, &cfg, Arc::new(BuildContext::new())).await?;
    }

    assert_eq!(read(&root.join("out/js/app.js")), "client");
    assert_eq!(read(&root.join("out/js/app_base.js")), "base");
    assert!(!root.join("out/js/app~client.js").exists());

    Ok(())
}

/// Bundler payload that records what it was asked to bundle, plus the entry
/// file's contents at bundling time.
#[derive(Default)]
struct RecordingBundler {
    calls: Arc<Mutex<Vec<(PathBuf, PathBuf, String)>>>,
}

impl Bundler for RecordingBundler {
    fn bundle(&self, entry: PathBuf, output: PathBuf, _options: BundleOptions) -> TaskFuture {
        let calls = Arc::clone(&self.calls);
        Box::pin(async move {
            let contents = std::fs::read_to_string(&entry).unwrap_or_default();
            calls.lock().unwrap().push((entry, output, contents));
            Ok(())
        })
    }
}

#[tokio::test]
async fn bundling_happens_after_overlay_per_target() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path();
    site_fixture(root)?;

    let calls = Arc::new(Mutex::new(Vec::new()));
    let bundler = Arc::new(RecordingBundler {
        calls: Arc::clone(&calls),
    });

    let mut options = ClientBuildOptions::new("src", "out");
    options.build_dev = true;
    let plugin = ClientBuildPlugin::new(root.to_path_buf(), options, bundler);

    let candidates = scan_candidates(root, "out")?;
    run_pass(&[&plugin as &dyn BuildPlugin], &candidates).await?;

    let calls = calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 2);

    // Client target bundles first, and sees the overlaid entry point.
    assert_eq!(calls[0].0, root.join("out/js/app.js"));
    assert_eq!(calls[0].1, root.join("out/js/bundle.js"));
    assert_eq!(calls[0].2, "client");

    assert_eq!(calls[1].0, root.join("out/js-dev/app.js"));
    assert_eq!(calls[1].1, root.join("out/js-dev/bundle.js"));
    assert_eq!(calls[1].2, "dev");

    Ok(())
}
