//! Order requests submitted through the exchange capability contract.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::signal::OrderSide;

/// Order type understood by the exchange adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Immediate execution at market.
    Market,
    /// Limit order at `price`.
    Limit,
    /// Stop order triggered at `trigger_price`.
    Stop,
    /// Take-profit order triggered at `trigger_price`.
    TakeProfit,
}

/// A single order leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Exchange instrument identifier (already translated).
    pub symbol: String,
    pub side: OrderSide,
    pub kind: OrderKind,
    pub size: Decimal,

    /// Limit price, where the order type takes one.
    pub price: Option<Decimal>,

    /// Trigger price for stop / take-profit orders.
    pub trigger_price: Option<Decimal>,

    /// Reduce-only orders can only shrink an existing position.
    pub reduce_only: bool,

    /// Client-assigned order id, echoed by the exchange.
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    /// Builds a limit entry leg.
    #[must_use]
    pub fn limit_entry(symbol: impl Into<String>, side: OrderSide, size: Decimal, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            kind: OrderKind::Limit,
            size,
            price: Some(price),
            trigger_price: None,
            reduce_only: false,
            client_order_id: None,
        }
    }

    /// Builds a reduce-only stop-loss leg on the opposite side of the entry.
    #[must_use]
    pub fn stop_loss(symbol: impl Into<String>, entry_side: OrderSide, size: Decimal, trigger: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side: entry_side.inverse(),
            kind: OrderKind::Stop,
            size,
            price: None,
            trigger_price: Some(trigger),
            reduce_only: true,
            client_order_id: None,
        }
    }

    /// Builds a reduce-only take-profit leg on the opposite side of the entry.
    #[must_use]
    pub fn take_profit(symbol: impl Into<String>, entry_side: OrderSide, size: Decimal, trigger: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side: entry_side.inverse(),
            kind: OrderKind::TakeProfit,
            size,
            price: Some(trigger),
            trigger_price: Some(trigger),
            reduce_only: true,
            client_order_id: None,
        }
    }

    /// Attaches a client order id.
    #[must_use]
    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }
}

/// Acknowledgment returned by the exchange for a submitted order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
}
