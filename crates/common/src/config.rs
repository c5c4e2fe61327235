use crate::error::{IndexError, Result};
use crate::types::CatalogField;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_URL: &str = "FILE_INDEX_URL";
pub const ENV_USER: &str = "FILE_INDEX_USER";
pub const ENV_PASSWORD: &str = "FILE_INDEX_PASSWORD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub opensearch: OpenSearchConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSearchConfig {
    #[serde(default = "default_opensearch_url")]
    pub url: String,
    #[serde(default = "default_username")]
    pub username: String,
    /// Only read from the environment, never written back out
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    #[serde(default = "default_directory_batch_size")]
    pub directory_batch_size: usize,
    #[serde(default = "default_catalog_batch_size")]
    pub catalog_batch_size: usize,
    /// Fall back to magic-byte sniffing when the extension lookup misses
    #[serde(default = "default_true")]
    pub sniff_content: bool,
    #[serde(default)]
    pub hash_contents: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_extension")]
    pub file_extension: String,
    /// Additional column labels per canonical field, keyed by the snake_case field name
    #[serde(default)]
    pub extra_labels: HashMap<String, Vec<String>>,
    #[serde(default = "default_folder_labels")]
    pub folder_labels: Vec<String>,
    /// Free-text columns whose embedded line breaks get the extra-tab correction
    #[serde(default = "default_free_text_labels")]
    pub free_text_labels: Vec<String>,
}

fn default_opensearch_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_directory_batch_size() -> usize {
    100_000
}

fn default_catalog_batch_size() -> usize {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("log")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_catalog_extension() -> String {
    "txt".to_string()
}

fn default_folder_labels() -> Vec<String> {
    vec!["Ordner".to_string(), "Folder".to_string()]
}

fn default_free_text_labels() -> Vec<String> {
    vec!["Beschreibung:".to_string()]
}

impl Default for OpenSearchConfig {
    fn default() -> Self {
        Self {
            url: default_opensearch_url(),
            username: default_username(),
            password: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            directory_batch_size: default_directory_batch_size(),
            catalog_batch_size: default_catalog_batch_size(),
            sniff_content: true,
            hash_contents: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            file_extension: default_catalog_extension(),
            extra_labels: HashMap::new(),
            folder_labels: default_folder_labels(),
            free_text_labels: default_free_text_labels(),
        }
    }
}

impl SystemConfig {
    /// Parse and validate a TOML configuration file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SystemConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the optional config file, then apply environment overrides.
    /// A missing file falls back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            SystemConfig::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_URL) {
            self.opensearch.url = url;
        }
        if let Some(user) = lookup(ENV_USER) {
            self.opensearch.username = user;
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.opensearch.password = Some(password);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.indexing.directory_batch_size == 0 {
            return Err(IndexError::Config(
                "indexing.directory_batch_size must be greater than 0".to_string(),
            ));
        }
        if self.indexing.catalog_batch_size == 0 {
            return Err(IndexError::Config(
                "indexing.catalog_batch_size must be greater than 0".to_string(),
            ));
        }
        if self.opensearch.url.trim().is_empty() {
            return Err(IndexError::Config("opensearch.url must not be empty".to_string()));
        }
        for key in self.catalog.extra_labels.keys() {
            if CatalogField::from_str(key).is_err() {
                return Err(IndexError::Config(format!(
                    "catalog.extra_labels: unknown field '{}'",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Password is required only when pushing to the search engine
    pub fn require_password(&self) -> Result<&str> {
        self.opensearch.password.as_deref().ok_or_else(|| {
            IndexError::Config(format!("{} environment variable not found!", ENV_PASSWORD))
        })
    }

    /// All labels accepted for a canonical field: built-in ones first, then configured extras.
    pub fn labels_for(&self, field: CatalogField) -> Vec<String> {
        let mut labels: Vec<String> = field
            .default_labels()
            .iter()
            .map(|label| label.to_string())
            .collect();
        if let Some(extra) = self.catalog.extra_labels.get(&field.to_string()) {
            labels.extend(extra.iter().cloned());
        }
        labels
    }
}
