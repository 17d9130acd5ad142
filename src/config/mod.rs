//! Configuration Module
//!
//! Handles application configuration loading, validation, and management.

pub mod secrets;

pub use secrets::SecretString;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::AudioFormat;
use crate::speech::{Voice, MAX_INPUT_CHARS};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// OpenAI-compatible API settings
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Speech synthesis defaults
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Meditation script generation
    #[serde(default)]
    pub meditation: MeditationConfig,

    /// Where and how the final artifact is written
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log to file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key. Read from the file or `OPENAI_API_KEY`, never written back.
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// API base URL, without the endpoint path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for `/audio/speech`
    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    /// Model used for `/chat/completions` when writing meditation scripts
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            tts_model: default_tts_model(),
            chat_model: default_chat_model(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_tts_model() -> String {
    "tts-1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Voice used when `--voice` is not given
    #[serde(default)]
    pub voice: Voice,

    /// Maximum characters per synthesis request
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            voice: Voice::default(),
            max_chunk_chars: default_max_chunk_chars(),
        }
    }
}

fn default_max_chunk_chars() -> usize {
    MAX_INPUT_CHARS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeditationConfig {
    /// Approximate total length of a generated session
    #[serde(default = "default_target_seconds")]
    pub target_seconds: u32,
}

impl Default for MeditationConfig {
    fn default() -> Self {
        Self {
            target_seconds: default_target_seconds(),
        }
    }
}

fn default_target_seconds() -> u32 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the artifact is written to
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Container format of the artifact
    #[serde(default)]
    pub format: AudioFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: AudioFormat::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. Default values
    /// 2. System config: ~/.config/speechcraft/config.toml
    /// 3. Local config: ./speechcraft.toml
    /// 4. Environment variables
    pub fn load() -> Result<Self> {
        tracing::debug!("Loading configuration...");

        let mut config = Self::default();

        if let Some(system_config_path) = Self::system_config_path()
            && system_config_path.exists()
        {
            tracing::debug!("Loading system config from: {:?}", system_config_path);
            config = Self::merge_from_file(config, &system_config_path)?;
        }

        let local_config_path = Self::local_config_path();
        if local_config_path.exists() {
            tracing::debug!("Loading local config from: {:?}", local_config_path);
            config = Self::merge_from_file(config, &local_config_path)?;
        }

        config.apply_env_overrides();

        tracing::debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply environment
    /// overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from custom path: {:?}", path);

        if !path.exists() {
            anyhow::bail!("Config file not found: {:?}", path);
        }

        let mut config = Self::merge_from_file(Self::default(), path)?;
        config.apply_env_overrides();

        Ok(config)
    }

    /// Get the system config path: ~/.config/speechcraft/config.toml
    pub fn system_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("speechcraft").join("config.toml"))
    }

    /// Get the local config path: ./speechcraft.toml
    fn local_config_path() -> PathBuf {
        PathBuf::from("./speechcraft.toml")
    }

    fn merge_from_file(base: Self, path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let file_config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(Self::merge(base, file_config))
    }

    /// Sections in the overlay replace the base. The API key is kept from the
    /// base when the overlay does not set one.
    fn merge(base: Self, mut overlay: Self) -> Self {
        if overlay.openai.api_key.is_none() {
            overlay.openai.api_key = base.openai.api_key;
        }
        overlay
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("SPEECHCRAFT_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(dir) = std::env::var("SPEECHCRAFT_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }

        if let Some(key) = SecretString::from_env_optional("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }

        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            self.openai.base_url = base_url;
        }

        if let Ok(model) = std::env::var("SPEECHCRAFT_TTS_MODEL") {
            self.openai.tts_model = model;
        }

        if let Ok(model) = std::env::var("SPEECHCRAFT_CHAT_MODEL") {
            self.openai.chat_model = model;
        }
    }

    /// Check whether a non-blank API key is configured
    pub fn has_api_key(&self) -> bool {
        self.openai.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        tracing::debug!("Validating configuration...");

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        if self.synthesis.max_chunk_chars == 0 || self.synthesis.max_chunk_chars > MAX_INPUT_CHARS
        {
            anyhow::bail!(
                "synthesis.max_chunk_chars must be between 1 and {}, got {}",
                MAX_INPUT_CHARS,
                self.synthesis.max_chunk_chars
            );
        }

        if self.meditation.target_seconds == 0 {
            anyhow::bail!("meditation.target_seconds must be greater than zero");
        }

        if self.openai.base_url.trim().is_empty() {
            anyhow::bail!("openai.base_url is empty");
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Save configuration to a file. The API key is never written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        tracing::info!("Configuration saved to: {:?}", path);
        Ok(())
    }
}
