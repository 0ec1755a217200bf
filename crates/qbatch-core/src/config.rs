//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates sections, e.g. `APP_SEARCH__PAGE_SIZE`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name of the word-vector dictionary inside the index directory.
pub const KNN_DICT_FILE: &str = "knn-dict";

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    /// Config over an explicit provider chain, with the built-in defaults underneath.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment: Figment::from(Serialized::defaults(AppConfig::default())).merge(figment) }
    }

    /// The whole typed configuration, validated.
    pub fn app(&self) -> Result<AppConfig> {
        let app: AppConfig = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        app.validate()?;
        Ok(app)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub index: IndexConfig,
    pub search: SearchConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    pub path: String,
    /// Word-vector dictionary; `<path>/knn-dict` when unset.
    pub vector_dict: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { path: "index".to_string(), vector_dict: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Default field of the parser and target field of term extraction.
    pub field: String,
    pub vector_field: String,
    pub page_size: usize,
    /// Nearest neighbours added per query; 0 disables semantic augmentation.
    pub knn: usize,
    pub raw: bool,
    /// Benchmark repetitions per query; 0 disables timing.
    pub repeat: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            field: "contents".to_string(),
            vector_field: "contents-vector".to_string(),
            page_size: 50,
            knn: 0,
            raw: false,
            repeat: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    pub query_dir: String,
    pub output_dir: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { query_dir: "queries".to_string(), output_dir: "out".to_string() }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.search.page_size == 0 {
            return Err(Error::InvalidConfig("search.page_size must be greater than 0".into()));
        }
        if self.search.field.is_empty() {
            return Err(Error::InvalidConfig("search.field must not be empty".into()));
        }
        if self.search.knn > 0 && self.search.vector_field.is_empty() {
            return Err(Error::InvalidConfig("search.vector_field must be set when knn > 0".into()));
        }
        Ok(())
    }

    pub fn index_path(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.index.path)
    }

    pub fn vector_dict_path(&self, base: &Path) -> PathBuf {
        match &self.index.vector_dict {
            Some(p) => resolve_with_base(base, p),
            None => self.index_path(base).join(KNN_DICT_FILE),
        }
    }

    pub fn query_dir(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.batch.query_dir)
    }

    pub fn output_dir(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.batch.output_dir)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
