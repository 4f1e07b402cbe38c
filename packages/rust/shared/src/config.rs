//! Application configuration for LearnGen.
//!
//! User config lives at `~/.learngen/learngen.toml`.
//! CLI flags override config file values, which override defaults.
//! API keys are read from environment variables named in the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LearnGenError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "learngen.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".learngen";

// ---------------------------------------------------------------------------
// Config structs (matching learngen.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generative model settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Video search settings.
    #[serde(default)]
    pub youtube: YouTubeConfig,

    /// Lookup cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Bulk lesson enrichment settings.
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

/// `[gemini]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_gemini_key_env")]
    pub api_key_env: String,

    /// Model identifier used for every generation call.
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API root, without the `/v1beta` suffix.
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_gemini_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_gemini_key_env(),
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
            timeout_secs: default_gemini_timeout(),
        }
    }
}

fn default_gemini_key_env() -> String {
    "GOOGLE_AI_API_KEY".into()
}
fn default_gemini_model() -> String {
    "gemini-1.5-pro".into()
}
fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_gemini_timeout() -> u64 {
    60
}

/// `[youtube]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_youtube_key_env")]
    pub api_key_env: String,

    /// Data API root.
    #[serde(default = "default_youtube_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_youtube_timeout")]
    pub timeout_secs: u64,

    /// Videos requested per lesson during bulk enrichment.
    #[serde(default = "default_videos_per_lesson")]
    pub videos_per_lesson: u32,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_youtube_key_env(),
            base_url: default_youtube_base_url(),
            timeout_secs: default_youtube_timeout(),
            videos_per_lesson: default_videos_per_lesson(),
        }
    }
}

fn default_youtube_key_env() -> String {
    "YOUTUBE_API_KEY".into()
}
fn default_youtube_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".into()
}
fn default_youtube_timeout() -> u64 {
    15
}
fn default_videos_per_lesson() -> u32 {
    5
}

/// `[cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of cached search results and video details.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
        }
    }
}

fn default_ttl_hours() -> u64 {
    24
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Maximum lesson searches in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Upper bound for a single lesson lookup, in seconds.
    #[serde(default = "default_lesson_timeout")]
    pub lesson_timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            lesson_timeout_secs: default_lesson_timeout(),
        }
    }
}

fn default_concurrency() -> u32 {
    3
}
fn default_lesson_timeout() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Runtime configs (resolved from config file + environment)
// ---------------------------------------------------------------------------

/// Runtime settings for the generative model client.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GenerationConfig {
    /// Resolve settings, reading the API key from the configured env var.
    pub fn resolve(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            api_key: read_api_key(&config.gemini.api_key_env, "Gemini")?,
            model: config.gemini.model.clone(),
            base_url: config.gemini.base_url.clone(),
            timeout_secs: config.gemini.timeout_secs,
        })
    }
}

/// Runtime settings for video search, caching, and bulk enrichment.
#[derive(Debug, Clone)]
pub struct VideoConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub videos_per_lesson: u32,
    pub cache_ttl_hours: u64,
    pub concurrency: u32,
    pub lesson_timeout_secs: u64,
}

impl VideoConfig {
    /// Resolve settings, reading the API key from the configured env var.
    pub fn resolve(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            api_key: read_api_key(&config.youtube.api_key_env, "YouTube")?,
            base_url: config.youtube.base_url.clone(),
            timeout_secs: config.youtube.timeout_secs,
            videos_per_lesson: config.youtube.videos_per_lesson,
            cache_ttl_hours: config.cache.ttl_hours,
            concurrency: config.enrichment.concurrency,
            lesson_timeout_secs: config.enrichment.lesson_timeout_secs,
        })
    }
}

fn read_api_key(var_name: &str, service: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(LearnGenError::config(format!(
            "{service} API key not found. Set the {var_name} environment variable."
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.learngen/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LearnGenError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.learngen/learngen.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| LearnGenError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        LearnGenError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LearnGenError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| LearnGenError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LearnGenError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
