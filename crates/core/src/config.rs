use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    endpoints::Endpoints,
    error::{Result, TrackerError},
    types::EventKind,
};

pub const ENDPOINT_ENV_VAR: &str = "CLICKTRAIL_ENDPOINT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerConfig {
    pub endpoint: String,
    pub cookie_key: String,
    pub tracked_events: Vec<EventKind>,
    pub tracked_region: String,
    pub replay_control: String,
    pub output_region: String,
    pub request_timeout_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            cookie_key: "sid".to_string(),
            tracked_events: vec![EventKind::Click, EventKind::MouseMove],
            tracked_region: "#canvas".to_string(),
            replay_control: "#replay".to_string(),
            output_region: "#data".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl TrackerConfig {
    /// `<config dir>/clicktrail/config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clicktrail")
            .join("config.json")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| TrackerError::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let config: TrackerConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Loads `path` when given, else the default path if it exists, else the
    /// built-in defaults. The endpoint env var wins over the file.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::load(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV_VAR) {
            config.endpoint = endpoint;
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn endpoints(&self) -> Result<Endpoints> {
        Endpoints::parse(&self.endpoint)
    }

    pub fn validate(&self) -> Result<()> {
        check(self).map_err(|e| TrackerError::InvalidConfig {
            reason: e.to_string(),
        })?;
        self.endpoints()?;
        Ok(())
    }
}

fn check(cfg: &TrackerConfig) -> anyhow::Result<()> {
    anyhow::ensure!(!cfg.cookie_key.trim().is_empty(), "empty cookieKey");
    anyhow::ensure!(!cfg.tracked_events.is_empty(), "trackedEvents is empty");

    let mut seen = HashSet::new();
    for kind in &cfg.tracked_events {
        if !seen.insert(kind) {
            anyhow::bail!("duplicate tracked event kind={}", kind);
        }
    }

    for (name, selector) in [
        ("trackedRegion", &cfg.tracked_region),
        ("replayControl", &cfg.replay_control),
        ("outputRegion", &cfg.output_region),
    ] {
        if selector.trim().is_empty() {
            anyhow::bail!("empty selector for {}", name);
        }
    }

    anyhow::ensure!(cfg.request_timeout_secs > 0, "requestTimeoutSecs must be > 0");
    Ok(())
}
