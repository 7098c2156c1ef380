//! Kraken Futures REST API client with rate limiting.
//!
//! Talks to the authenticated `/derivatives/api/v3` surface directly. One
//! client instance holds a single `reqwest::Client` and is reused across
//! poll cycles; only the per-request signature changes.

use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use follower_core::{
    AccountBalance, AgentError, ExchangeClient, OpenPosition, OrderAck, OrderKind, OrderRequest,
    OrderSide, Result,
};

use crate::auth::{KrakenAuth, KrakenAuthConfig};

// =============================================================================
// Constants
// =============================================================================

/// Kraken Futures production base URL.
pub const KRAKEN_LIVE_URL: &str = "https://futures.kraken.com";

/// Kraken Futures demo (testnet) base URL.
pub const KRAKEN_DEMO_URL: &str = "https://demo-futures.kraken.com";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Kraken Futures client.
#[derive(Debug, Clone)]
pub struct KrakenClientConfig {
    /// Base URL for the API.
    pub base_url: String,

    /// Environment variable names for credentials.
    pub auth_config: KrakenAuthConfig,

    /// Requests per minute limit.
    pub requests_per_minute: NonZeroU32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Decimal places allowed in order quantities.
    pub quantity_precision: u32,

    /// Decimal places allowed in order prices.
    pub price_precision: u32,
}

impl Default for KrakenClientConfig {
    fn default() -> Self {
        Self {
            base_url: KRAKEN_LIVE_URL.to_string(),
            auth_config: KrakenAuthConfig::default(),
            requests_per_minute: nonzero!(60u32),
            timeout_secs: 30,
            quantity_precision: 3,
            price_precision: 4,
        }
    }
}

impl KrakenClientConfig {
    /// Creates a configuration for live trading.
    #[must_use]
    pub fn live() -> Self {
        Self::default()
    }

    /// Creates a configuration for the demo environment.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            base_url: KRAKEN_DEMO_URL.to_string(),
            ..Default::default()
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the rate limit.
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_minute: NonZeroU32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }
}

// =============================================================================
// API Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawAccountsResponse {
    accounts: Option<RawAccounts>,
}

#[derive(Debug, Deserialize)]
struct RawAccounts {
    flex: Option<RawFlexAccount>,
}

#[derive(Debug, Deserialize)]
struct RawFlexAccount {
    currencies: Option<HashMap<String, RawFlexCurrency>>,
    #[serde(rename = "balanceValue")]
    balance_value: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct RawFlexCurrency {
    quantity: Option<Decimal>,
    available: Option<Decimal>,
}

impl From<RawAccountsResponse> for AccountBalance {
    fn from(raw: RawAccountsResponse) -> Self {
        let mut balance = Self::default();

        let Some(flex) = raw.accounts.and_then(|a| a.flex) else {
            return balance;
        };

        for (currency, data) in flex.currencies.unwrap_or_default() {
            let currency = currency.to_uppercase();
            if let Some(quantity) = data.quantity {
                balance.total.insert(currency.clone(), quantity);
            }
            if let Some(available) = data.available {
                balance.free.insert(currency, available);
            }
        }

        // The flex account also reports a USD-denominated portfolio value.
        if let Some(value) = flex.balance_value {
            balance.total.insert("USD".to_string(), value);
            balance.free.insert("USD".to_string(), value);
        }

        balance
    }
}

#[derive(Debug, Deserialize)]
struct RawOpenPositionsResponse {
    #[serde(rename = "openPositions")]
    open_positions: Option<Vec<RawOpenPosition>>,
}

#[derive(Debug, Deserialize)]
struct RawOpenPosition {
    symbol: String,
    side: Option<String>,
    size: Option<Decimal>,
    #[serde(rename = "fillPrice", alias = "price")]
    fill_price: Option<Decimal>,
}

impl From<RawOpenPosition> for OpenPosition {
    fn from(raw: RawOpenPosition) -> Self {
        let side = match raw.side.as_deref() {
            Some("short" | "sell") => OrderSide::Sell,
            _ => OrderSide::Buy,
        };

        Self {
            symbol: raw.symbol,
            side,
            size: raw.size.unwrap_or_default(),
            fill_price: raw.fill_price.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSendOrderResponse {
    #[serde(rename = "sendStatus")]
    send_status: Option<RawSendStatus>,
}

#[derive(Debug, Deserialize)]
struct RawSendStatus {
    #[serde(rename = "order_id", alias = "orderId")]
    order_id: Option<String>,
    status: Option<String>,
}

// =============================================================================
// KrakenFuturesClient
// =============================================================================

/// Kraken Futures REST client. All private calls are rate-limited and
/// signed per request.
pub struct KrakenFuturesClient {
    config: KrakenClientConfig,
    http: Client,
    rate_limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
    auth: KrakenAuth,
}

impl std::fmt::Debug for KrakenFuturesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KrakenFuturesClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

fn map_reqwest_err(err: reqwest::Error) -> AgentError {
    if err.is_timeout() {
        AgentError::Timeout(err.to_string())
    } else if err.is_connect() {
        AgentError::Network(format!("connection failed: {err}"))
    } else {
        AgentError::Network(err.to_string())
    }
}

impl KrakenFuturesClient {
    /// Creates a new client, loading credentials from the environment.
    ///
    /// # Errors
    /// Returns an error if credentials are missing or the HTTP client cannot
    /// be built.
    pub fn new(config: KrakenClientConfig) -> Result<Self> {
        let auth = KrakenAuth::from_env(&config.auth_config)?;
        Self::with_auth(config, auth)
    }

    /// Creates a new client with an explicit signer (used in tests).
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_auth(config: KrakenClientConfig, auth: KrakenAuth) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Network(format!("failed to build HTTP client: {e}")))?;

        let quota = Quota::per_minute(config.requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            config,
            http,
            rate_limiter,
            auth,
        })
    }

    /// Creates a live-trading client from environment credentials.
    ///
    /// # Errors
    /// Returns an error if credentials are missing.
    pub fn live() -> Result<Self> {
        Self::new(KrakenClientConfig::live())
    }

    /// Creates a demo-environment client from environment credentials.
    ///
    /// # Errors
    /// Returns an error if credentials are missing.
    pub fn demo() -> Result<Self> {
        Self::new(KrakenClientConfig::demo())
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Waits for the rate limiter and makes a signed POST request with
    /// form-encoded parameters. Verifies the `"result": "success"` envelope
    /// before handing the body back.
    async fn post_signed(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value> {
        self.rate_limiter.until_ready().await;

        let nonce = KrakenAuth::nonce();
        let postdata = {
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for (key, value) in params {
                serializer.append_pair(key, value);
            }
            serializer.append_pair("nonce", &nonce);
            serializer.finish()
        };

        let headers = self.auth.sign(endpoint, &postdata, &nonce)?;
        let url = format!("{}{}", self.config.base_url, endpoint);

        tracing::debug!("POST {} body_len={}", url, postdata.len());

        let response = self
            .http
            .post(&url)
            .header("APIKey", &headers.api_key)
            .header("Authent", &headers.authent)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(postdata)
            .send()
            .await
            .map_err(map_reqwest_err)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::api(status.as_u16(), text));
        }

        let body: serde_json::Value = response.json().await.map_err(map_reqwest_err)?;

        if body.get("result").and_then(|r| r.as_str()) == Some("success") {
            Ok(body)
        } else {
            let message = body
                .get("error")
                .or_else(|| body.get("errors"))
                .map_or_else(|| "unknown error".to_string(), ToString::to_string);
            Err(AgentError::api(status.as_u16(), message))
        }
    }

    /// Fetches the flex-account balance, normalized per currency.
    ///
    /// # Errors
    /// Returns an error if the API call fails.
    pub async fn accounts(&self) -> Result<AccountBalance> {
        let body = self
            .post_signed("/derivatives/api/v3/accounts", &[])
            .await?;
        let raw: RawAccountsResponse = serde_json::from_value(body)?;
        Ok(raw.into())
    }

    /// Fetches all open positions.
    ///
    /// # Errors
    /// Returns an error if the API call fails.
    pub async fn open_positions(&self) -> Result<Vec<OpenPosition>> {
        let body = self
            .post_signed("/derivatives/api/v3/openpositions", &[])
            .await?;
        let raw: RawOpenPositionsResponse = serde_json::from_value(body)?;
        Ok(raw
            .open_positions
            .unwrap_or_default()
            .into_iter()
            .map(OpenPosition::from)
            .collect())
    }

    /// Submits one order leg via `sendorder`.
    ///
    /// # Errors
    /// Returns an error if the API call fails or the order is not accepted.
    pub async fn send_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        let order_type = match order.kind {
            OrderKind::Market => "mkt",
            OrderKind::Limit => "lmt",
            OrderKind::Stop => "stp",
            OrderKind::TakeProfit => "take_profit",
        };

        let mut params: Vec<(&str, String)> = vec![
            ("orderType", order_type.to_string()),
            ("symbol", order.symbol.clone()),
            ("side", order.side.as_str().to_string()),
            ("size", order.size.to_string()),
        ];

        match order.kind {
            OrderKind::Limit | OrderKind::TakeProfit => {
                if let Some(price) = order.price {
                    params.push(("limitPrice", price.to_string()));
                }
            }
            OrderKind::Market | OrderKind::Stop => {}
        }

        if matches!(order.kind, OrderKind::Stop | OrderKind::TakeProfit) {
            if let Some(trigger) = order.trigger_price {
                params.push(("stopPrice", trigger.to_string()));
            }
            // Trigger off the mark price, not last trade.
            params.push(("triggerSignal", "mark".to_string()));
        }

        if order.reduce_only {
            params.push(("reduceOnly", "true".to_string()));
        }

        if let Some(ref cli_ord_id) = order.client_order_id {
            params.push(("cliOrdId", cli_ord_id.clone()));
        }

        let body = self
            .post_signed("/derivatives/api/v3/sendorder", &params)
            .await?;
        let raw: RawSendOrderResponse = serde_json::from_value(body)?;

        let send_status = raw
            .send_status
            .ok_or_else(|| AgentError::api(0, "no sendStatus in order response"))?;

        send_status.order_id.map(|order_id| OrderAck { order_id }).ok_or_else(|| {
            AgentError::api(
                0,
                format!(
                    "order not accepted: {}",
                    send_status.status.as_deref().unwrap_or("unknown status")
                ),
            )
        })
    }

    /// Cancels all resting orders, optionally only for one symbol.
    ///
    /// # Errors
    /// Returns an error if the API call fails.
    pub async fn cancel_all(&self, symbol: Option<&str>) -> Result<()> {
        let params: Vec<(&str, String)> = symbol
            .map(|s| vec![("symbol", s.to_string())])
            .unwrap_or_default();

        self.post_signed("/derivatives/api/v3/cancelallorders", &params)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ExchangeClient for KrakenFuturesClient {
    async fn fetch_equity(&self) -> Result<AccountBalance> {
        self.accounts().await
    }

    async fn fetch_open_positions(&self, symbol: &str) -> Result<Vec<OpenPosition>> {
        let positions = self.open_positions().await?;
        Ok(positions.into_iter().filter(|p| p.symbol == symbol).collect())
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        self.send_order(order).await
    }

    async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<()> {
        self.cancel_all(symbol).await
    }

    fn quantity_precision(&self, _symbol: &str) -> u32 {
        self.config.quantity_precision
    }

    fn price_precision(&self, _symbol: &str) -> u32 {
        self.config.price_precision
    }
}
