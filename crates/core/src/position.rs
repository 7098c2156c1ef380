//! Tracked position state.
//!
//! The agent holds at most one open tracked position at a time. The slot
//! lives in an explicit [`AgentState`] passed into each loop iteration, so
//! the single-writer invariant is visible in the types rather than implied
//! by ambient globals.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::signal::{OrderSide, Signal};

/// A position the agent opened and is tracking until the exchange reports it
/// closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Signal that produced this position.
    pub signal_id: String,

    /// Symbol in source notation (e.g. "ADA/USDT").
    pub symbol: String,

    pub side: OrderSide,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub quantity: Decimal,
    pub leverage: u32,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// Builds a tracked position from an executed signal and the sized
    /// quantity that was actually submitted.
    #[must_use]
    pub fn from_signal(signal: &Signal, quantity: Decimal, opened_at: DateTime<Utc>) -> Self {
        Self {
            signal_id: signal.signal_id.clone(),
            symbol: signal.symbol.clone(),
            side: signal.action.into(),
            entry_price: signal.entry_price,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
            quantity,
            leverage: signal.leverage,
            opened_at,
        }
    }
}

/// A position as reported by the exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    /// Exchange instrument identifier (e.g. "pf_adausd").
    pub symbol: String,
    pub side: OrderSide,
    pub size: Decimal,
    pub fill_price: Decimal,
}

/// Mutable agent state for one loop iteration. There is exactly one mutator
/// (the loop itself), so no locking is needed.
#[derive(Debug, Default)]
pub struct AgentState {
    /// The single tracked position slot, or `None` when flat.
    pub position: Option<Position>,

    /// Id of the most recently executed signal, for duplicate suppression
    /// across cycles.
    pub last_signal_id: Option<String>,
}

impl AgentState {
    /// Creates an empty (flat) state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a tracked position is currently open.
    #[must_use]
    pub fn has_open_position(&self) -> bool {
        self.position.is_some()
    }
}
