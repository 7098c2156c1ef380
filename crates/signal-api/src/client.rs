//! HTTP client for the signal source API.
//!
//! The source authenticates every call with an `X-API-Key` header. The
//! `/latest-signal` endpoint has been observed answering in two shapes: an
//! access refusal (`{"access_granted": false, ...}`) and a poll result
//! (`{"has_new_signal": ..., "signal": ...}`). [`SignalApiClient`] collapses
//! both into [`SignalPoll`] at the wire boundary.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use follower_core::{
    AccessState, AgentError, ReportAck, Result, Signal, SignalPoll, SignalSource, TradeReport,
};

/// Environment variable holding the signal-source API key.
pub const API_KEY_ENV: &str = "USER_API_KEY";

/// Configuration for the signal source client.
#[derive(Debug, Clone)]
pub struct SignalApiConfig {
    /// Base URL of the signal source, without a trailing slash.
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl SignalApiConfig {
    /// Creates a configuration pointing at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 30,
        }
    }
}

// =============================================================================
// Wire Types
// =============================================================================

/// Raw `/latest-signal` body covering both observed response shapes.
#[derive(Debug, Deserialize)]
struct RawPollResponse {
    access_granted: Option<bool>,
    reason: Option<String>,
    amount_due: Option<Decimal>,
    #[serde(default)]
    has_new_signal: bool,
    signal: Option<Signal>,
}

impl From<RawPollResponse> for SignalPoll {
    fn from(raw: RawPollResponse) -> Self {
        if raw.access_granted == Some(false) {
            return Self::AccessDenied {
                reason: raw.reason,
                amount_due: raw.amount_due,
            };
        }

        // Shape B announces a signal via `has_new_signal`; shape A just
        // grants access and attaches the signal payload directly.
        match raw.signal {
            Some(signal) if raw.has_new_signal || raw.access_granted == Some(true) => {
                Self::Signal(signal)
            }
            _ => Self::NoSignal,
        }
    }
}

// =============================================================================
// SignalApiClient
// =============================================================================

/// Authenticated client for the signal source.
pub struct SignalApiClient {
    config: SignalApiConfig,
    http: Client,
    api_key: SecretString,
}

impl std::fmt::Debug for SignalApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalApiClient")
            .field("base_url", &self.config.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
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

impl SignalApiClient {
    /// Creates a client with an explicit API key.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: SignalApiConfig, api_key: SecretString) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http,
            api_key,
        })
    }

    /// Creates a client, reading the API key from `USER_API_KEY`.
    ///
    /// # Errors
    /// Returns [`AgentError::Configuration`] if the variable is missing.
    pub fn from_env(config: SignalApiConfig) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            AgentError::Configuration(format!("missing environment variable: {API_KEY_ENV}"))
        })?;
        Self::new(config, SecretString::from(api_key))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("X-API-Key", self.api_key.expose_secret())
            .send()
            .await
            .map_err(map_reqwest_err)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::api(status.as_u16(), text));
        }

        response.json().await.map_err(map_reqwest_err)
    }
}

#[async_trait]
impl SignalSource for SignalApiClient {
    async fn verify_access(&self) -> Result<AccessState> {
        self.get_json("/api/users/verify").await
    }

    async fn poll_latest_signal(&self) -> Result<SignalPoll> {
        let raw: RawPollResponse = self.get_json("/api/latest-signal").await?;
        Ok(raw.into())
    }

    async fn report_trade(&self, report: &TradeReport) -> Result<ReportAck> {
        let url = self.url("/api/report-pnl");
        tracing::debug!("POST {} trade_id={}", url, report.trade_id);

        let response = self
            .http
            .post(&url)
            .header("X-API-Key", self.api_key.expose_secret())
            .json(report)
            .send()
            .await
            .map_err(map_reqwest_err)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::api(status.as_u16(), text));
        }

        response.json().await.map_err(map_reqwest_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: String) -> SignalApiClient {
        SignalApiClient::new(
            SignalApiConfig::new(base_url),
            SecretString::from("test-api-key"),
        )
        .unwrap()
    }

    // ==================== Poll Normalization Tests ====================

    #[test]
    fn test_poll_normalizes_access_denied_shape() {
        let raw: RawPollResponse = serde_json::from_value(serde_json::json!({
            "access_granted": false,
            "reason": "monthly fee overdue",
            "amount_due": 149.0
        }))
        .unwrap();

        match SignalPoll::from(raw) {
            SignalPoll::AccessDenied { reason, amount_due } => {
                assert_eq!(reason.as_deref(), Some("monthly fee overdue"));
                assert_eq!(amount_due, Some(dec!(149.0)));
            }
            other => panic!("expected AccessDenied, got {other:?}"),
        }
    }

    #[test]
    fn test_poll_normalizes_new_signal_shape() {
        let raw: RawPollResponse = serde_json::from_value(serde_json::json!({
            "has_new_signal": true,
            "signal": {
                "signal_id": "sig-42",
                "symbol": "ADA/USDT",
                "action": "BUY",
                "entry_price": 0.45,
                "stop_loss": 0.43,
                "take_profit": 0.50,
                "leverage": 5
            }
        }))
        .unwrap();

        match SignalPoll::from(raw) {
            SignalPoll::Signal(signal) => assert_eq!(signal.signal_id, "sig-42"),
            other => panic!("expected Signal, got {other:?}"),
        }
    }

    #[test]
    fn test_poll_flag_without_payload_is_no_signal() {
        let raw: RawPollResponse =
            serde_json::from_value(serde_json::json!({"has_new_signal": true})).unwrap();
        assert!(matches!(SignalPoll::from(raw), SignalPoll::NoSignal));
    }

    #[test]
    fn test_poll_empty_body_is_no_signal() {
        let raw: RawPollResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(SignalPoll::from(raw), SignalPoll::NoSignal));
    }

    #[test]
    fn test_poll_shape_a_with_signal_is_executed() {
        // Shape A: access granted, signal attached, no has_new_signal flag.
        let raw: RawPollResponse = serde_json::from_value(serde_json::json!({
            "access_granted": true,
            "signal": {
                "signal_id": "sig-77",
                "symbol": "ADA/USDT",
                "action": "BUY",
                "entry_price": 0.45,
                "stop_loss": 0.43,
                "take_profit": 0.50,
                "leverage": 5
            }
        }))
        .unwrap();

        match SignalPoll::from(raw) {
            SignalPoll::Signal(signal) => assert_eq!(signal.signal_id, "sig-77"),
            other => panic!("expected Signal, got {other:?}"),
        }
    }

    #[test]
    fn test_poll_access_granted_without_signal_is_no_signal() {
        let raw: RawPollResponse = serde_json::from_value(serde_json::json!({
            "access_granted": true,
            "has_new_signal": false
        }))
        .unwrap();
        assert!(matches!(SignalPoll::from(raw), SignalPoll::NoSignal));
    }

    // ==================== HTTP Tests ====================

    #[tokio::test]
    async fn test_verify_access_sends_api_key_header() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/users/verify"))
            .and(header("X-API-Key", "test-api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_granted": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let state = client.verify_access().await.unwrap();
        assert!(state.access_granted);
    }

    #[tokio::test]
    async fn test_poll_latest_signal_round_trip() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/latest-signal"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "has_new_signal": true,
                "signal": {
                    "signal_id": "sig-9",
                    "symbol": "SOL/USDT",
                    "action": "SELL",
                    "entry_price": 150.0,
                    "stop_loss": 155.0,
                    "take_profit": 140.0,
                    "leverage": 3
                }
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        match client.poll_latest_signal().await.unwrap() {
            SignalPoll::Signal(signal) => {
                assert_eq!(signal.symbol, "SOL/USDT");
                assert_eq!(signal.leverage, 3);
            }
            other => panic!("expected Signal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_report_trade_round_trip() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/report-pnl"))
            .and(header("X-API-Key", "test-api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "monthly_profit": 320.5,
                "monthly_fee_due": 64.1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let report = TradeReport {
            trade_id: "trade-1".to_string(),
            signal_id: "sig-9".to_string(),
            opened_at: Utc::now(),
            closed_at: Utc::now(),
            symbol: "SOL/USDT".to_string(),
            side: "SELL".to_string(),
            entry_price: dec!(150),
            exit_price: dec!(140),
            quantity: dec!(2),
            leverage: 3,
            profit_usd: dec!(20),
            profit_percent: dec!(-6.67),
        };

        let ack = client.report_trade(&report).await.unwrap();
        assert_eq!(ack.monthly_profit, dec!(320.5));
        assert_eq!(ack.monthly_fee_due, dec!(64.1));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/latest-signal"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let err = client.poll_latest_signal().await.unwrap_err();
        assert!(matches!(err, AgentError::Api { status: 503, .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = test_client("http://localhost".to_string());
        let debug = format!("{client:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("test-api-key"));
    }
}
