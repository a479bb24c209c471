//! Application configuration for arxivdigest.
//!
//! User config lives at `~/.arxivdigest/arxivdigest.toml`.
//! CLI flags override the `CATEGORIES` env var, which overrides config
//! file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ArxivDigestError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "arxivdigest.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".arxivdigest";

/// Env var consulted for the category list when no CLI flag is given.
pub const CATEGORIES_ENV: &str = "CATEGORIES";

// ---------------------------------------------------------------------------
// Config structs (matching arxivdigest.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// LLM endpoint settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Target category codes, in priority order. The order defines both
    /// the fetch order and the ranking used by the renderer.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Output language for the AI digest.
    #[serde(default = "default_language")]
    pub language: String,

    /// Directory where the JSONL and markdown outputs are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            language: default_language(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_categories() -> Vec<String> {
    vec!["cs.CV".into()]
}
fn default_language() -> String {
    "Chinese".into()
}
fn default_output_dir() -> String {
    ".".into()
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL of the OpenAI-compatible endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for digest generation.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            model: default_model(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_base_url() -> String {
    "https://ai-maas.wair.ac.cn/maas/v1".into()
}
fn default_model() -> String {
    "deepseek_v31".into()
}

// ---------------------------------------------------------------------------
// Category list resolution
// ---------------------------------------------------------------------------

/// Split a comma-separated category list, trimming whitespace and
/// dropping empty segments.
pub fn parse_categories(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Resolve the effective category list: CLI flag first, then the
/// `CATEGORIES` env var, then the config file.
pub fn resolve_categories(cli_flag: Option<&str>, config: &AppConfig) -> Vec<String> {
    if let Some(raw) = cli_flag {
        return parse_categories(raw);
    }
    if let Ok(raw) = std::env::var(CATEGORIES_ENV) {
        let parsed = parse_categories(&raw);
        if !parsed.is_empty() {
            return parsed;
        }
    }
    config.defaults.categories.clone()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.arxivdigest/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ArxivDigestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.arxivdigest/arxivdigest.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ArxivDigestError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ArxivDigestError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ArxivDigestError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ArxivDigestError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ArxivDigestError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the LLM API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    let var_name = &config.llm.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(ArxivDigestError::config(format!(
            "LLM API key not found. Set the {var_name} environment variable."
        ))),
    }
}
