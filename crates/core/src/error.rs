//! Error taxonomy for the follower agent.
//!
//! Every fallible operation in the workspace returns [`AgentError`] so that
//! the polling loop can distinguish recoverable conditions (network hiccups,
//! a degenerate signal) from fatal ones (missing credentials) by type rather
//! than by catch-all handling.

use rust_decimal::Decimal;
use thiserror::Error;

/// Which leg of a bracket order an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderLeg {
    /// The entry order.
    Entry,
    /// The protective stop-loss order.
    StopLoss,
    /// The take-profit order.
    TakeProfit,
}

impl std::fmt::Display for OrderLeg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entry => write!(f, "entry"),
            Self::StopLoss => write!(f, "stop-loss"),
            Self::TakeProfit => write!(f, "take-profit"),
        }
    }
}

/// Errors that can occur while polling, sizing, executing, or reporting.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The signal source refused access (suspended key, unpaid fees).
    #[error("access denied: {}", reason.as_deref().unwrap_or("no reason given"))]
    AccessDenied {
        /// Reason returned by the signal source, if any.
        reason: Option<String>,
        /// Outstanding amount due, if the source reported one.
        amount_due: Option<Decimal>,
    },

    /// Network-level failure (connection refused, DNS, TLS).
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// The remote API answered with a non-success response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code (0 when the failure is in the response body).
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// No positive balance in any settlement currency.
    #[error("no positive balance found in any settlement currency")]
    InsufficientEquity,

    /// Entry price equals stop loss; sizing would divide by zero.
    #[error("degenerate signal: entry price {entry} equals stop loss")]
    InvalidRisk {
        /// The coinciding entry/stop price.
        entry: Decimal,
    },

    /// A bracket leg was rejected after submission started.
    #[error("order submission failed on {leg} leg: {message}")]
    OrderSubmission {
        /// The leg that failed.
        leg: OrderLeg,
        /// Error message from the exchange.
        message: String,
    },

    /// Startup configuration problem (missing credentials, bad config file).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization failure at a wire boundary.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl AgentError {
    /// Creates an API error from a status code and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates an access-denied error.
    #[must_use]
    pub fn access_denied(reason: Option<String>, amount_due: Option<Decimal>) -> Self {
        Self::AccessDenied { reason, amount_due }
    }

    /// Creates an order-submission error for a specific bracket leg.
    pub fn order_submission(leg: OrderLeg, message: impl Into<String>) -> Self {
        Self::OrderSubmission {
            leg,
            message: message.into(),
        }
    }

    /// Returns true if the condition is expected to clear on its own, so the
    /// loop should simply continue at the next poll cadence.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if this error aborts only the current signal, leaving the
    /// loop free to process the next one.
    #[must_use]
    pub fn is_signal_local(&self) -> bool {
        matches!(self, Self::InsufficientEquity | Self::InvalidRisk { .. })
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for follower operations.
pub type Result<T> = std::result::Result<T, AgentError>;
