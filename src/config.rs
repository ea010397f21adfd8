//! TOML configuration.
//!
//! Every section and field is optional. Without an explicit `--config` the
//! CLI reads `<data_dir>/config.toml` when it exists and otherwise runs on
//! defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `ollama.url`.
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// `~/.ragbase`, or `./.ragbase` when there is no home directory.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ragbase")
}

#[derive(Debug, Deserialize, Clone)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub url: String,
    /// Per-request timeout in seconds. Unset leaves reqwest's defaults,
    /// which impose no overall timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            timeout_secs: None,
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

/// Sampling options sent with every completion request.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            num_predict: default_num_predict(),
        }
    }
}

fn default_temperature() -> f32 {
    0.7
}
fn default_top_p() -> f32 {
    0.9
}
fn default_num_predict() -> u32 {
    1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// Allow shelling out to pdftotext, pandoc and tesseract.
    #[serde(default = "default_true")]
    pub external_tools: bool,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            external_tools: true,
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_max_file_bytes() -> u64 {
    50 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3001".to_string()
}

impl Config {
    /// Apply environment overrides and expand `~` in paths.
    fn finish(mut self, ollama_host: Option<String>) -> Self {
        if let Some(host) = ollama_host.filter(|h| !h.trim().is_empty()) {
            self.ollama.url = normalize_host(host.trim());
        }
        self.ollama.url = self.ollama.url.trim_end_matches('/').to_string();
        self.storage.data_dir = expand_tilde(&self.storage.data_dir);
        self
    }

    fn validate(&self) -> Result<()> {
        let url = &self.ollama.url;
        if url.is_empty() {
            anyhow::bail!("ollama.url must not be empty");
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("ollama.url must start with http:// or https:// (got '{}')", url);
        }
        if self.ollama.timeout_secs == Some(0) {
            anyhow::bail!("ollama.timeout_secs must be > 0");
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            anyhow::bail!("generation.temperature must be in [0.0, 2.0]");
        }
        if !(self.generation.top_p > 0.0 && self.generation.top_p <= 1.0) {
            anyhow::bail!("generation.top_p must be in (0.0, 1.0]");
        }
        if self.generation.num_predict == 0 {
            anyhow::bail!("generation.num_predict must be > 0");
        }

        if self.extraction.max_file_bytes == 0 {
            anyhow::bail!("extraction.max_file_bytes must be > 0");
        }

        Ok(())
    }
}

/// Parse and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content, std::env::var(OLLAMA_HOST_ENV).ok())
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

/// Resolve the effective config.
///
/// An explicit path must exist. Otherwise `<default data dir>/config.toml`
/// is used if present, and defaults if not.
pub fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let implicit = default_data_dir().join("config.toml");
    if implicit.is_file() {
        return load_config(&implicit);
    }
    parse_config("", std::env::var(OLLAMA_HOST_ENV).ok())
}

fn parse_config(content: &str, ollama_host: Option<String>) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    let config = config.finish(ollama_host);
    config.validate()?;
    Ok(config)
}

fn normalize_host(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
