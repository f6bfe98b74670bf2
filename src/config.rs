//! Settings loaded from `clarity.toml` in the working directory.
//!
//! Every field has a default, so the file is optional. `ANTHROPIC_API_KEY`
//! takes precedence over the file's `api_key`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::estimate::{DEFAULT_MODEL, OverloadPolicy};

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "clarity.toml";
/// Environment variable that overrides `api_key`.
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Top-level settings read from `clarity.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClarityConfig {
    /// Anthropic API key. Empty means estimates run offline.
    #[serde(default)]
    pub api_key: String,

    /// Model id sent with every estimation request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Reply budget per request. Both replies are a small JSON object.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Whole-request timeout for each estimation call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Directory holding the persisted task slot.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Minutes of work that fit in one day before a warning is raised.
    #[serde(default = "default_daily_capacity_minutes")]
    pub daily_capacity_minutes: u64,

    /// Per-task assumption when there is no completion history.
    #[serde(default = "default_task_minutes")]
    pub default_task_minutes: u64,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".clarity")
}

fn default_daily_capacity_minutes() -> u64 {
    OverloadPolicy::default().daily_capacity_minutes
}

fn default_task_minutes() -> u64 {
    OverloadPolicy::default().default_task_minutes
}

impl Default for ClarityConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            data_dir: default_data_dir(),
            daily_capacity_minutes: default_daily_capacity_minutes(),
            default_task_minutes: default_task_minutes(),
        }
    }
}

impl ClarityConfig {
    /// Loads `clarity.toml` from the current directory, then applies the
    /// environment override for the API key.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(Path::new(CONFIG_FILE))?;
        config.apply_api_key_override(std::env::var(API_KEY_VAR).ok());
        Ok(config)
    }

    /// Loads the given file, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str::<ClarityConfig>(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// A non-empty key wins over whatever the file said.
    pub fn apply_api_key_override(&mut self, key: Option<String>) {
        if let Some(key) = key
            && !key.trim().is_empty()
        {
            self.api_key = key.trim().to_string();
        }
    }

    /// Whether the model-backed estimator can be used.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// `request_timeout_secs` as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The capacity settings bundled for the estimators.
    pub fn overload_policy(&self) -> OverloadPolicy {
        OverloadPolicy {
            daily_capacity_minutes: self.daily_capacity_minutes,
            default_task_minutes: self.default_task_minutes,
        }
    }
}
