// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [site]
/// source = "src"
/// destination = "out"
///
/// [tasks.data]
/// dirs = ["data"]
///
/// [tasks.transpile]
/// extensions = ["js"]
///
/// [tasks.client]
/// build_dev = true
/// entry_point = "app.js"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    /// Global site layout from `[site]`.
    #[serde(default)]
    pub site: SiteSection,

    /// Per-task options from `[tasks.<name>]`.
    #[serde(default)]
    pub tasks: TasksSection,
}

/// `[site]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSection {
    /// Directory holding the site sources, relative to the config file.
    #[serde(default = "default_source")]
    pub source: String,

    /// Directory the build writes into, relative to the config file.
    #[serde(default = "default_destination")]
    pub destination: String,

    /// Suppress per-file info logging for every task.
    #[serde(default)]
    pub quiet: bool,
}

fn default_source() -> String {
    "src".to_string()
}

fn default_destination() -> String {
    "out".to_string()
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            destination: default_destination(),
            quiet: false,
        }
    }
}

/// `[tasks]` container.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TasksSection {
    #[serde(default)]
    pub data: DataSection,

    #[serde(default)]
    pub transpile: TranspileSection,

    #[serde(default)]
    pub client: ClientSection,
}

/// `[tasks.data]` — YAML/JSON data loading.
#[derive(Debug, Clone, Deserialize)]
pub struct DataSection {
    /// Directories scanned for data files.
    #[serde(default = "default_data_dirs")]
    pub dirs: Vec<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_data_dirs() -> Vec<String> {
    vec!["data".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            dirs: default_data_dirs(),
            enabled: true,
        }
    }
}

/// `[tasks.transpile]` — per-file transform into the destination tree.
#[derive(Debug, Clone, Deserialize)]
pub struct TranspileSection {
    /// Extensions handled (and normalized to `js` on output).
    #[serde(default = "default_js_extensions")]
    pub extensions: Vec<String>,

    /// Extra excluded directories. The destination directory is always
    /// excluded, listed here or not.
    #[serde(default)]
    pub excluded_directories: Vec<String>,

    /// Regex exclusion patterns, compiled at plugin registration.
    #[serde(default)]
    pub excluded_patterns: Vec<String>,

    /// Transform feature blacklist, passed through to the transform payload.
    #[serde(default)]
    pub blacklist: Vec<String>,

    #[serde(default = "default_transpile_task_name")]
    pub task_name: String,

    /// Per-task quiet override; falls back to `site.quiet`.
    #[serde(default)]
    pub quiet: Option<bool>,
}

fn default_js_extensions() -> Vec<String> {
    vec!["js".to_string()]
}

fn default_transpile_task_name() -> String {
    "transpile".to_string()
}

impl Default for TranspileSection {
    fn default() -> Self {
        Self {
            extensions: default_js_extensions(),
            excluded_directories: Vec::new(),
            excluded_patterns: Vec::new(),
            blacklist: Vec::new(),
            task_name: default_transpile_task_name(),
            quiet: None,
        }
    }
}

/// `[tasks.client]` — client/dev target assembly: copy, variant overlay,
/// bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSection {
    /// JS extensions copied into the build targets (JSON is always included).
    #[serde(default = "default_js_extensions")]
    pub extensions: Vec<String>,

    /// Extra excluded directories under the source tree.
    #[serde(default)]
    pub dirs_exclude: Vec<String>,

    /// Regex exclusion patterns, compiled at plugin registration.
    #[serde(default)]
    pub patterns_exclude: Vec<String>,

    /// Marker identifying client-only variants.
    #[serde(default = "default_client_js_suffix")]
    pub client_js_suffix: String,

    /// Marker identifying dev-only variants.
    #[serde(default = "default_dev_js_suffix")]
    pub dev_js_suffix: String,

    /// Suffix given to a displaced base when a variant overlays it.
    #[serde(default = "default_original_js_suffix")]
    pub original_js_suffix: String,

    /// Also assemble the dev target.
    #[serde(default)]
    pub build_dev: bool,

    /// Bundle entry point, relative to the build directory.
    #[serde(default = "default_entry_point")]
    pub entry_point: String,

    #[serde(default = "default_bundle_name")]
    pub client_bundle_name: String,

    #[serde(default = "default_bundle_name")]
    pub dev_bundle_name: String,

    /// Client build directory, under the destination.
    #[serde(default = "default_dir_client_build")]
    pub dir_client_build: String,

    /// Dev build directory, under the destination.
    #[serde(default = "default_dir_dev_build")]
    pub dir_dev_build: String,

    /// Emit source maps / debug info from the bundler payload.
    #[serde(default)]
    pub bundle_debug: bool,

    /// Module names the bundler should treat as external.
    #[serde(default)]
    pub externals: Vec<String>,

    #[serde(default = "default_client_task_name")]
    pub task_name: String,

    /// Per-task quiet override; falls back to `site.quiet`.
    #[serde(default)]
    pub quiet: Option<bool>,
}

fn default_client_js_suffix() -> String {
    "~client".to_string()
}

fn default_dev_js_suffix() -> String {
    "~dev".to_string()
}

fn default_original_js_suffix() -> String {
    "_base".to_string()
}

fn default_entry_point() -> String {
    "app.js".to_string()
}

fn default_bundle_name() -> String {
    "bundle.js".to_string()
}

fn default_dir_client_build() -> String {
    "js".to_string()
}

fn default_dir_dev_build() -> String {
    "js-dev".to_string()
}

fn default_client_task_name() -> String {
    "build-client".to_string()
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            extensions: default_js_extensions(),
            dirs_exclude: Vec::new(),
            patterns_exclude: Vec::new(),
            client_js_suffix: default_client_js_suffix(),
            dev_js_suffix: default_dev_js_suffix(),
            original_js_suffix: default_original_js_suffix(),
            build_dev: false,
            entry_point: default_entry_point(),
            client_bundle_name: default_bundle_name(),
            dev_bundle_name: default_bundle_name(),
            dir_client_build: default_dir_client_build(),
            dir_dev_build: default_dir_dev_build(),
            bundle_debug: false,
            externals: Vec::new(),
            task_name: default_client_task_name(),
            quiet: None,
        }
    }
}
