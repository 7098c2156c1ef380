//! Command implementations.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use follower_agent::AgentLoop;
use follower_core::{AppConfig, ConfigLoader, ExchangeClient, SignalSource};
use follower_kraken::{KrakenClientConfig, KrakenFuturesClient, PaperExchangeClient};
use follower_signal_api::{SignalApiClient, SignalApiConfig, API_KEY_ENV};
use follower_web_api::ServerStatus;

/// Checks that every credential the selected mode needs is present before
/// any network call is made. A partially configured agent must not start.
fn validate_credentials(paper: bool) -> Result<()> {
    let mut missing = Vec::new();

    if std::env::var(API_KEY_ENV).is_err() {
        missing.push(API_KEY_ENV);
    }
    if !paper {
        for var in ["KRAKEN_API_KEY", "KRAKEN_API_SECRET"] {
            if std::env::var(var).is_err() {
                missing.push(var);
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        bail!("missing required environment variables: {}", missing.join(", "));
    }
}

/// Loads config, applying the hosting platform's `PORT` override if set.
fn load_config(path: &str) -> Result<AppConfig> {
    let mut config = ConfigLoader::load_from(path).context("failed to load configuration")?;

    if let Ok(port) = std::env::var("PORT") {
        config.server.port = port
            .parse()
            .with_context(|| format!("PORT is not a valid port number: {port}"))?;
    }

    Ok(config)
}

fn signal_client(config: &AppConfig) -> Result<SignalApiClient> {
    SignalApiClient::from_env(SignalApiConfig::new(config.signal_source.base_url.clone()))
        .context("failed to build signal source client")
}

pub async fn run(config_path: &str, paper: bool) -> Result<()> {
    validate_credentials(paper)?;
    let config = load_config(config_path)?;

    let source: Arc<dyn SignalSource> = Arc::new(signal_client(&config)?);

    let exchange: Arc<dyn ExchangeClient> = if paper {
        warn!("paper mode: orders will not reach the exchange");
        Arc::new(PaperExchangeClient::default())
    } else {
        let exchange_config = if config.exchange.use_testnet {
            KrakenClientConfig::demo()
        } else {
            KrakenClientConfig::live()
        };
        Arc::new(
            KrakenFuturesClient::new(exchange_config)
                .context("failed to build Kraken Futures client")?,
        )
    };

    info!(
        signal_source = %config.signal_source.base_url,
        testnet = config.exchange.use_testnet,
        paper,
        "starting follower agent"
    );

    // Liveness endpoint runs on its own task for the life of the process.
    let server_config = config.server.clone();
    let status_state = ServerStatus {
        testnet: config.exchange.use_testnet,
    };
    tokio::spawn(async move {
        if let Err(e) = follower_web_api::serve(&server_config, status_state).await {
            warn!("liveness endpoint stopped: {e}");
        }
    });

    let mut agent = AgentLoop::new(source, exchange, config.agent);
    agent.run().await?;
    Ok(())
}

pub async fn verify(config_path: &str) -> Result<()> {
    if std::env::var(API_KEY_ENV).is_err() {
        bail!("missing required environment variable: {API_KEY_ENV}");
    }
    let config = load_config(config_path)?;
    let client = signal_client(&config)?;

    let access = client.verify_access().await?;
    if access.access_granted {
        println!("access granted");
        Ok(())
    } else {
        if let Some(due) = access.amount_due {
            println!("amount due: {due}");
        }
        bail!(
            "access denied: {}",
            access.reason.as_deref().unwrap_or("no reason given")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_credentials_paper_needs_only_user_key() {
        // Paper mode must not require exchange credentials.
        std::env::remove_var("KRAKEN_API_KEY");
        std::env::remove_var("KRAKEN_API_SECRET");
        std::env::set_var(API_KEY_ENV, "k");

        assert!(validate_credentials(true).is_ok());
        assert!(validate_credentials(false).is_err());

        std::env::remove_var(API_KEY_ENV);
    }
}
