//! PalaceBuilder configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::imagegen::ImageSize;

/// Main PalaceBuilder configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Chat-completion endpoint used for task decomposition
    pub llm: LlmConfig,

    /// Text-to-image endpoint used for palace generation
    pub image: ImageConfig,

    /// Compositing parameters
    pub palace: PalaceConfig,

    /// Database and media locations
    pub storage: StorageConfig,

    /// HTTP server
    pub server: ServerConfig,

    /// Palace worker pool
    pub workers: WorkersConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the API key environment variables are set.
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        for env_name in [&self.llm.api_key_env, &self.image.api_key_env] {
            if std::env::var(env_name).is_err() {
                return Err(eyre::eyre!("API key not found. Set the {} environment variable.", env_name));
            }
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .palacebuilder.yml
        let local_config = PathBuf::from(".palacebuilder.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/palacebuilder/palacebuilder.yml
        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed: a broken config file is reported later by `load`.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates: Vec<PathBuf> = match config_path {
            Some(path) => vec![path.clone()],
            None => std::iter::once(PathBuf::from(".palacebuilder.yml"))
                .chain(user_config_path())
                .collect(),
        };

        candidates
            .into_iter()
            .find(|p| p.exists())
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("palacebuilder").join("palacebuilder.yml"))
}

/// Chat-completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL (the client appends `/v1/chat/completions`)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "Qwen/Qwen3-235B-A22B".to_string(),
            api_key_env: "NEBIUS_API_KEY".to_string(),
            base_url: "https://api.studio.nebius.ai".to_string(),
            max_tokens: 512,
            temperature: 0.1,
            timeout_ms: 120_000,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| eyre::eyre!("Environment variable {} is not set", self.api_key_env))
    }
}

/// Image generation provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL (the client appends `/v1/images/generations`)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Output resolution, e.g. "512x512"
    pub size: ImageSize,

    /// Number of inference steps
    pub steps: u32,

    /// Negative prompt sent with every request
    #[serde(rename = "negative-prompt")]
    pub negative_prompt: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            model: "black-forest-labs/flux-dev".to_string(),
            api_key_env: "NEBIUS_API_KEY".to_string(),
            base_url: "https://api.studio.nebius.ai".to_string(),
            size: ImageSize::default(),
            steps: 28,
            negative_prompt: "fantasy, magical, unrealistic, cartoon, anime, abstract, surreal".to_string(),
            timeout_ms: 300_000,
        }
    }
}

impl ImageConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| eyre::eyre!("Environment variable {} is not set", self.api_key_env))
    }
}

/// Compositing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PalaceConfig {
    /// Background colour for hidden layers
    pub grey: [u8; 3],

    /// Gaussian blur sigma applied to band edges
    #[serde(rename = "blur-sigma")]
    pub blur_sigma: f32,
}

impl Default for PalaceConfig {
    fn default() -> Self {
        Self {
            grey: [128, 128, 128],
            blur_sigma: 2.0,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file
    #[serde(rename = "db-path")]
    pub db_path: PathBuf,

    /// Root directory for generated images
    #[serde(rename = "media-dir")]
    pub media_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/palacebuilder on Linux)
        let data_dir = dirs::data_dir()
            .map(|d| d.join("palacebuilder"))
            .unwrap_or_else(|| PathBuf::from(".palacebuilder"));

        Self {
            db_path: data_dir.join("palace.db"),
            media_dir: data_dir.join("media"),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Palace worker pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    /// Number of workers rendering palaces
    pub count: usize,

    /// Maximum number of queued palace jobs
    #[serde(rename = "queue-capacity")]
    pub queue_capacity: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            count: 2,
            queue_capacity: 64,
        }
    }
}
