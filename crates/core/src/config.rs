//! Agent configuration.
//!
//! Non-secret settings merge from an optional TOML file and
//! `FOLLOWER_`-prefixed environment variables. Credentials (user API key,
//! exchange key/secret) are read from the environment by the adapters
//! themselves and never pass through this struct.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::sizing::default_risk_fraction;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub signal_source: SignalSourceConfig,
    pub exchange: ExchangeConfig,
    pub agent: AgentConfig,
    pub server: ServerConfig,
}

/// Signal-source endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalSourceConfig {
    /// Base URL of the signal API.
    pub base_url: String,
}

/// Exchange endpoint selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// When true, trade against the demo (testnet) endpoint.
    pub use_testnet: bool,
}

/// Polling-loop behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Seconds between poll cycles.
    pub poll_interval_secs: u64,

    /// Fraction of equity risked per trade.
    pub risk_fraction: Decimal,

    /// Re-verify access at the top of every cycle instead of once at startup.
    pub verify_each_cycle: bool,

    /// Exit the process when access is denied, instead of idling and polling.
    pub exit_on_access_denied: bool,
}

/// Liveness endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            signal_source: SignalSourceConfig {
                base_url: "http://localhost:8000".to_string(),
            },
            exchange: ExchangeConfig { use_testnet: true },
            agent: AgentConfig {
                poll_interval_secs: 10,
                risk_fraction: default_risk_fraction(),
                verify_each_cycle: false,
                exit_on_access_denied: true,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 10000,
            },
        }
    }
}
