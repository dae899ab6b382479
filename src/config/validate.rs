// src/config/validate.rs

use anyhow::{anyhow, Result};

use crate::config::model::ConfigFile;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - `site.source` and `site.destination` are non-empty and distinct
/// - variant suffixes are non-empty and distinct from each other and from
///   the original-archive suffix
/// - client and dev build directories are distinct when `build_dev` is on
/// - the bundle entry point is non-empty
///
/// It does **not** compile exclusion patterns; those are compiled (and can
/// fail) at plugin registration time.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_site(cfg)?;
    validate_client(cfg)?;
    Ok(())
}

fn validate_site(cfg: &ConfigFile) -> Result<()> {
    if cfg.site.source.is_empty() {
        return Err(anyhow!("[site].source must not be empty"));
    }
    if cfg.site.destination.is_empty() {
        return Err(anyhow!("[site].destination must not be empty"));
    }
    if cfg.site.source == cfg.site.destination {
        return Err(anyhow!(
            "[site].source and [site].destination must differ (got '{}')",
            cfg.site.source
        ));
    }
    Ok(())
}

fn validate_client(cfg: &ConfigFile) -> Result<()> {
    let client = &cfg.tasks.client;

    for (field, value) in [
        ("client_js_suffix", &client.client_js_suffix),
        ("dev_js_suffix", &client.dev_js_suffix),
        ("original_js_suffix", &client.original_js_suffix),
        ("entry_point", &client.entry_point),
    ] {
        if value.is_empty() {
            return Err(anyhow!("[tasks.client].{} must not be empty", field));
        }
    }

    if client.client_js_suffix == client.dev_js_suffix {
        return Err(anyhow!(
            "[tasks.client].client_js_suffix and dev_js_suffix must differ (got '{}')",
            client.client_js_suffix
        ));
    }

    if client.build_dev && client.dir_client_build == client.dir_dev_build {
        return Err(anyhow!(
            "[tasks.client].dir_client_build and dir_dev_build must differ when build_dev is set (got '{}')",
            client.dir_client_build
        ));
    }

    Ok(())
}
