use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const ENV_API_KEY: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the mock inbox document
    #[serde(default = "default_inbox_path")]
    pub inbox_path: PathBuf,
    /// Path to the prompt template document
    #[serde(default = "default_prompts_path")]
    pub prompts_path: PathBuf,
    /// Model provider settings
    #[serde(default)]
    pub ai: AiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inbox_path: default_inbox_path(),
            prompts_path: default_prompts_path(),
            ai: AiConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Gemini API key (falls back to the GEMINI_API_KEY environment variable)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
        }
    }
}

impl AiConfig {
    /// Resolve the API key from config or environment. `None` means the
    /// process cannot start; the credential is a hard requirement.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(ENV_API_KEY).ok())
            .filter(|key| !key.is_empty())
    }
}

fn default_inbox_path() -> PathBuf {
    PathBuf::from("inbox.json")
}

fn default_prompts_path() -> PathBuf {
    PathBuf::from("prompts.json")
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("mailsift");
        Ok(dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the config file, or defaults when none exists.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}
