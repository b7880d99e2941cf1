//! Configuration types for casebook.
//!
//! [`Config::load`] reads `~/.config/casebook/config.toml` (or an explicit
//! path), creating the default file if it does not yet exist.
//! [`Config::defaults`] returns the same defaults without touching the
//! filesystem (useful in tests).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::NormalizationError;
use crate::pipeline::PipelineOptions;
use crate::schema::Schema;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[store]
path            = "output.sqlite"
busy_timeout_ms = 5000

[pipeline]
concurrency = 1
resume      = false
enrich      = ["NAME", "AGE", "ARREST LOCATION"]

[fetch]
base_url     = "http://127.0.0.1:8080/cases"
timeout_secs = 30
user_agent   = "casebook/0.1"
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_store_path() -> PathBuf { PathBuf::from("output.sqlite") }
fn default_busy_timeout_ms() -> u64 { 5000 }

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub resume: bool,
    /// Labels of the fields overwritten from fetched detail records.
    #[serde(default = "default_enrich")]
    pub enrich: Vec<String>,
}

fn default_concurrency() -> usize { 1 }
fn default_enrich() -> Vec<String> {
    ["NAME", "AGE", "ARREST LOCATION"].map(String::from).to_vec()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            resume: false,
            enrich: default_enrich(),
        }
    }
}

impl PipelineConfig {
    /// Resolve the configured labels against `schema`. An unknown label is a
    /// startup error, not something to discover per record.
    pub fn options(&self, schema: &Schema) -> Result<PipelineOptions, NormalizationError> {
        Ok(PipelineOptions {
            concurrency: self.concurrency.max(1),
            resume: self.resume,
            enrich: schema.resolve_all(&self.enrich)?,
        })
    }
}

/// `[fetch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String { "http://127.0.0.1:8080/cases".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_user_agent() -> String { "casebook/0.1".to_string() }

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from `path`, or from `~/.config/casebook/config.toml` when `path`
    /// is `None`, layered on top of the built-in defaults. The default
    /// location is created with the defaults if it does not exist; an
    /// explicit path must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => {
                let p = config_path();
                if !p.exists() {
                    if let Some(parent) = p.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&p, DEFAULT_CONFIG.trim_start())?;
                }
                (p, false)
            }
        };

        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path.as_path()).required(required))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("casebook")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
