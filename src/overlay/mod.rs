// src/overlay/mod.rs

//! Variant-file overlay resolution.
//!
//! A logical file may exist in up to three suffixed forms in the source tree:
//! the base (`app.js`), a client variant (`app~client.js`) and a dev variant
//! (`app~dev.js`). After the copy phase a target's build directory contains
//! the base plus that target's variant; this module decides final placement:
//!
//! 1. the winning variant replaces the base at its canonical path,
//! 2. the displaced base is archived under a renamed sibling (`app_base.js`),
//! 3. the variant file itself is removed from the build tree.
//!
//! Client and dev targets resolve into distinct build directories, so two
//! variant groups never share a canonical path and per-group sequencing is
//! the only mutual exclusion needed.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use regex::Regex;
use tracing::debug;

use crate::errors::BuildError;
use crate::fsutil;

/// Resolver for one suffix marker (e.g. `~client`) within one build target.
///
/// Both regexes are compiled once, at construction; `resolve` is called with
/// the variant paths accumulated during the watch phase.
#[derive(Debug, Clone)]
pub struct VariantOverlay {
    suffix: String,
    /// Matches `<suffix>.<ext>` at the end of a path, capturing the extension.
    marker: Regex,
    /// Matches the bare `.<ext>` of a canonical path.
    extension: Regex,
    original_suffix: String,
}

impl VariantOverlay {
    /// `suffix` is the variant marker (e.g. `~client`); `original_suffix` is
    /// appended to the displaced base's stem (e.g. `_base`).
    pub fn new(suffix: &str, original_suffix: &str) -> Result<Self> {
        let marker = Regex::new(&format!(r"{}\.(js|json)$", regex::escape(suffix)))?;
        let extension = Regex::new(r"\.(js|json)$")?;
        Ok(Self {
            suffix: suffix.to_string(),
            marker,
            extension,
            original_suffix: original_suffix.to_string(),
        })
    }

    /// The canonical path a variant overlays: the same path with the suffix
    /// marker stripped. `None` when the path does not carry the marker.
    pub fn canonical_path(&self, variant: &Path) -> Option<PathBuf> {
        let s = path_str(variant);
        if !self.marker.is_match(&s) {
            return None;
        }
        Some(PathBuf::from(self.marker.replace(&s, ".$1").into_owned()))
    }

    /// Where the displaced base is archived: the canonical path with
    /// `original_suffix` inserted before the extension.
    pub fn archive_path(&self, canonical: &Path) -> Result<PathBuf> {
        let s = path_str(canonical);
        if !self.extension.is_match(&s) {
            return Err(anyhow!(
                "cannot derive archive path for {:?}: unrecognized extension",
                canonical
            ));
        }
        let replacement = format!("{}.$1", self.original_suffix);
        Ok(PathBuf::from(
            self.extension.replace(&s, replacement.as_str()).into_owned(),
        ))
    }

    /// Overlay every variant in `variants` onto its canonical path.
    ///
    /// Per variant, strictly in order: read the current base (if any) and
    /// archive it, write the variant's bytes to the canonical path, remove
    /// the variant. A missing base just skips the archive step; a missing
    /// variant is a data inconsistency (it was recorded as matched) and
    /// fails the resolution.
    ///
    /// Groups are independent; processing order across variants does not
    /// affect the outcome.
    pub async fn resolve(&self, variants: &[PathBuf]) -> Result<()> {
        for variant in variants {
            let canonical = self.canonical_path(variant).ok_or_else(|| {
                anyhow!(
                    "path {:?} does not carry the '{}' marker",
                    variant,
                    self.suffix
                )
            })?;

            if let Some(base) = fsutil::try_read(&canonical).await? {
                let archived = self.archive_path(&canonical)?;
                fsutil::write(&archived, &base).await?;
                debug!(base = %canonical.display(), archived = %archived.display(), "archived base");
            }

            let Some(contents) = fsutil::try_read(variant).await? else {
                return Err(BuildError::ResourceMissing {
                    path: variant.clone(),
                }
                .into());
            };
            fsutil::write(&canonical, &contents).await?;
            fsutil::remove(variant).await?;

            debug!(
                variant = %variant.display(),
                canonical = %canonical.display(),
                "variant overlaid onto canonical path"
            );
        }

        Ok(())
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
