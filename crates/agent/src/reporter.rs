//! Realized-P&L report construction.
//!
//! The exchange does not tell us which exit leg filled, so the exit price is
//! estimated as whichever of the take-profit and stop-loss prices sits
//! numerically closer to entry. The percentage figure is computed from raw
//! price movement without adjusting for side; short trades therefore show a
//! sign opposite to their dollar P&L, which downstream consumers expect.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use follower_core::{OrderSide, Position, TradeReport};

/// Builds [`TradeReport`]s from closed positions.
#[derive(Debug, Clone, Default)]
pub struct PnLReporter;

impl PnLReporter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Estimates the exit price: the bracket leg closest to entry is the one
    /// most likely to have filled.
    #[must_use]
    pub fn estimate_exit_price(position: &Position) -> Decimal {
        let tp_distance = (position.take_profit - position.entry_price).abs();
        let sl_distance = (position.stop_loss - position.entry_price).abs();

        if tp_distance < sl_distance {
            position.take_profit
        } else {
            position.stop_loss
        }
    }

    /// Builds the report for a position the exchange no longer shows.
    #[must_use]
    pub fn build_report(&self, position: &Position, closed_at: DateTime<Utc>) -> TradeReport {
        let exit_price = Self::estimate_exit_price(position);

        let profit_usd = match position.side {
            OrderSide::Buy => (exit_price - position.entry_price) * position.quantity,
            OrderSide::Sell => (position.entry_price - exit_price) * position.quantity,
        };

        let profit_percent = if position.entry_price.is_zero() {
            Decimal::ZERO
        } else {
            (exit_price - position.entry_price) / position.entry_price * Decimal::from(100)
        };

        TradeReport {
            trade_id: Uuid::new_v4().to_string(),
            signal_id: position.signal_id.clone(),
            opened_at: position.opened_at,
            closed_at,
            symbol: position.symbol.clone(),
            side: match position.side {
                OrderSide::Buy => "BUY".to_string(),
                OrderSide::Sell => "SELL".to_string(),
            },
            entry_price: position.entry_price,
            exit_price,
            quantity: position.quantity,
            leverage: position.leverage,
            profit_usd,
            profit_percent,
        }
    }
}
