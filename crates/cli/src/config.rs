//! Client configuration (`~/.config/xeneon/config.toml`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::client::{DEFAULT_AGENT_URL, DEFAULT_TIMEOUT};
use crate::panels::PanelSettings;
use crate::poller::{DEFAULT_POLL_INTERVAL, MAX_POLL_INTERVAL, MIN_POLL_INTERVAL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub agent_url: String,
    pub poll_interval_secs: u64,
    /// Per-request timeout. Keep it above the agent's `--tool-timeout-secs`.
    pub request_timeout_secs: u64,
    pub panels: PanelSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            agent_url: DEFAULT_AGENT_URL.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            panels: PanelSettings::default(),
        }
    }
}

impl ClientConfig {
    /// `~/.config/xeneon/config.toml` on every platform.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("xeneon").join("config.toml"))
    }

    /// Load from `explicit` if given (it must exist), otherwise from the
    /// default path if present, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Flags win over the file.
    pub fn with_agent_url(mut self, agent_url: Option<String>) -> Self {
        if let Some(url) = agent_url {
            self.agent_url = url;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs).clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL)
    }
}
