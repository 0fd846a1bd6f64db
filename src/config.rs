use std::env;
use std::path::PathBuf;

use log::warn;
use serde::Deserialize;

use crate::session::SessionStore;

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_WS_URL: &str = "ws://localhost:5000/ws";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Polling,
    Event,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub ws_url: String,
    pub channel: ChannelKind,
    pub storage_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            channel: ChannelKind::Event,
            storage_dir: None,
        }
    }
}

impl Config {
    /// Config file under the platform config dir, then env overrides, then
    /// localhost defaults. A broken file is ignored with a warning.
    pub fn load() -> Self {
        let mut config = dirs::config_dir()
            .map(|d| d.join("binomi").join("config.toml"))
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|raw| Self::from_toml(&raw))
            .unwrap_or_default();

        if let Ok(url) = env::var("BINOMI_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(url) = env::var("BINOMI_WS_URL") {
            config.ws_url = url;
        }
        config
    }

    fn from_toml(raw: &str) -> Option<Self> {
        match toml::from_str(raw) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("ignoring invalid config file: {}", e);
                None
            }
        }
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(SessionStore::default_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.ws_url, "ws://localhost:5000/ws");
        assert_eq!(config.channel, ChannelKind::Event);
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let config = Config::from_toml(
            r#"
            base_url = "https://api.binomi.tn"
            channel = "polling"
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://api.binomi.tn");
        assert_eq!(config.channel, ChannelKind::Polling);
        assert_eq!(config.ws_url, DEFAULT_WS_URL);
    }

    #[test]
    fn invalid_file_is_ignored() {
        assert!(Config::from_toml("channel = 42").is_none());
    }
}
