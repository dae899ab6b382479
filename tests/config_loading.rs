use std::error::Error;

use siteforge::config::{load_and_validate, load_from_path, validate_config, ConfigFile};
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> Result<(tempfile::TempDir, std::path::PathBuf), Box<dyn Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("Siteforge.toml");
    std::fs::write(&path, contents)?;
    Ok((dir, path))
}

#[test]
fn empty_config_gets_full_defaults() -> TestResult {
    let (_dir, path) = write_config("")?;
    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.site.source, "src");
    assert_eq!(cfg.site.destination, "out");
    assert_eq!(cfg.tasks.data.dirs, vec!["data".to_string()]);
    assert_eq!(cfg.tasks.transpile.extensions, vec!["js".to_string()]);
    assert_eq!(cfg.tasks.client.client_js_suffix, "~client");
    assert_eq!(cfg.tasks.client.dev_js_suffix, "~dev");
    assert_eq!(cfg.tasks.client.original_js_suffix, "_base");
    assert_eq!(cfg.tasks.client.entry_point, "app.js");
    assert!(!cfg.tasks.client.build_dev);

    Ok(())
}

#[test]
fn sections_override_defaults() -> TestResult {
    let (_dir, path) = write_config(
        r#"
[site]
source = "content"
destination = "public"

[tasks.transpile]
extensions = ["js", "jsx"]
blacklist = ["regenerator"]

[tasks.client]
build_dev = true
dir_dev_build = "dev-js"
externals = ["react"]
"#,
    )?;
    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.site.source, "content");
    assert_eq!(cfg.site.destination, "public");
    assert_eq!(
        cfg.tasks.transpile.extensions,
        vec!["js".to_string(), "jsx".to_string()]
    );
    assert_eq!(cfg.tasks.transpile.blacklist, vec!["regenerator".to_string()]);
    assert!(cfg.tasks.client.build_dev);
    assert_eq!(cfg.tasks.client.dir_dev_build, "dev-js");
    assert_eq!(cfg.tasks.client.externals, vec!["react".to_string()]);

    Ok(())
}

#[test]
fn source_equal_to_destination_is_rejected() -> TestResult {
    let (_dir, path) = write_config(
        r#"
[site]
source = "site"
destination = "site"
"#,
    )?;

    assert!(load_and_validate(&path).is_err());
    // Raw loading still works; only validation rejects it.
    assert!(load_from_path(&path).is_ok());

    Ok(())
}

#[test]
fn identical_variant_suffixes_are_rejected() {
    let mut cfg = ConfigFile::default();
    cfg.tasks.client.client_js_suffix = "~x".to_string();
    cfg.tasks.client.dev_js_suffix = "~x".to_string();

    assert!(validate_config(&cfg).is_err());
}

#[test]
fn shared_build_dir_is_rejected_only_with_build_dev() {
    let mut cfg = ConfigFile::default();
    cfg.tasks.client.dir_client_build = "js".to_string();
    cfg.tasks.client.dir_dev_build = "js".to_string();

    assert!(validate_config(&cfg).is_ok());

    cfg.tasks.client.build_dev = true;
    assert!(validate_config(&cfg).is_err());
}

#[test]
fn malformed_toml_is_an_error() -> TestResult {
    let (_dir, path) = write_config("[site\nsource = ")?;
    assert!(load_from_path(&path).is_err());
    Ok(())
}
