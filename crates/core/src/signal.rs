//! Trading signals and poll results from the signal source.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
}

/// Order side on the exchange. Exit legs of a bracket always take the
/// inverse of the entry side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Exchange wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl From<SignalAction> for OrderSide {
    fn from(action: SignalAction) -> Self {
        match action {
            SignalAction::Buy => Self::Buy,
            SignalAction::Sell => Self::Sell,
        }
    }
}

/// An externally produced trade instruction. Immutable once received and
/// consumed exactly once by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Identifier assigned by the signal source.
    pub signal_id: String,

    /// Symbol in source notation (e.g. "ADA/USDT").
    pub symbol: String,

    /// Trade direction.
    pub action: SignalAction,

    /// Entry price for the limit entry leg.
    pub entry_price: Decimal,

    /// Protective stop price.
    pub stop_loss: Decimal,

    /// Take-profit price.
    pub take_profit: Decimal,

    /// Leverage multiplier (>= 1).
    pub leverage: u32,
}

/// Access decision returned by the signal source's verify endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessState {
    pub access_granted: bool,

    /// Reason access was refused, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Outstanding fee amount, if the source reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_due: Option<Decimal>,
}

/// Normalized outcome of one signal poll.
///
/// The signal source answers `/latest-signal` in two observed shapes
/// (`{access_granted, signal?}` and `{has_new_signal, signal?}`); the HTTP
/// client collapses both into this tagged result immediately after parsing so
/// that nothing downstream branches on raw optional-field presence.
#[derive(Debug, Clone)]
pub enum SignalPoll {
    /// Nothing pending this cycle.
    NoSignal,
    /// A new signal to execute.
    Signal(Signal),
    /// The source refused access for this cycle.
    AccessDenied {
        reason: Option<String>,
        amount_due: Option<Decimal>,
    },
}

/// Acknowledgment returned by the signal source after a P&L report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportAck {
    #[serde(default)]
    pub monthly_profit: Decimal,
    #[serde(default)]
    pub monthly_fee_due: Decimal,
}

/// Realized-trade report delivered back to the signal source. Write-once,
/// discarded after delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeReport {
    pub trade_id: String,
    pub signal_id: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    /// Symbol in source notation.
    pub symbol: String,
    /// Uppercase side ("BUY"/"SELL"), matching the reporting contract.
    pub side: String,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    pub leverage: u32,
    pub profit_usd: Decimal,
    pub profit_percent: Decimal,
}
