use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;

use crate::config::AppConfig;
use crate::error::{AgentError, Result};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by layering defaults, `config/Follower.toml`, and
    /// `FOLLOWER_`-prefixed environment variables (nested keys split on
    /// `__`, e.g. `FOLLOWER_AGENT__POLL_INTERVAL_SECS=5`).
    ///
    /// # Errors
    /// Returns [`AgentError::Configuration`] if a layer cannot be parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Follower.toml")
    }

    /// Loads configuration with an explicit TOML path.
    ///
    /// # Errors
    /// Returns [`AgentError::Configuration`] if a layer cannot be parsed.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("FOLLOWER_").split("__"))
            .extract()
            .map_err(|e| AgentError::Configuration(e.to_string()))
    }
}
