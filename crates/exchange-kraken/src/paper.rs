//! Paper-trading exchange adapter.
//!
//! Satisfies the same capability contract as the live client but fills
//! everything instantly against a simulated account. Used for dry runs and
//! for the agent-loop tests, which need deterministic exchange behavior.

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use follower_core::{
    AccountBalance, AgentError, ExchangeClient, OpenPosition, OrderAck, OrderRequest, Result,
};

/// Simulated exchange backed by in-memory state.
#[derive(Debug)]
pub struct PaperExchangeClient {
    balance: RwLock<AccountBalance>,
    positions: RwLock<Vec<OpenPosition>>,
    orders: RwLock<Vec<OrderRequest>>,
    next_order_id: AtomicU64,
    quantity_precision: u32,
    price_precision: u32,
}

impl PaperExchangeClient {
    /// Creates a paper account funded with `initial_usd` of USD equity.
    #[must_use]
    pub fn new(initial_usd: Decimal) -> Self {
        let mut total = HashMap::new();
        total.insert("USD".to_string(), initial_usd);

        Self {
            balance: RwLock::new(AccountBalance {
                total: total.clone(),
                free: total,
            }),
            positions: RwLock::new(Vec::new()),
            orders: RwLock::new(Vec::new()),
            next_order_id: AtomicU64::new(1),
            quantity_precision: 3,
            price_precision: 4,
        }
    }

    /// Overrides the whole simulated balance.
    pub fn set_balance(&self, balance: AccountBalance) {
        *self.balance.write() = balance;
    }

    /// Closes the simulated position for `symbol`, as if an exit order had
    /// filled on the exchange.
    pub fn close_position(&self, symbol: &str) {
        self.positions.write().retain(|p| p.symbol != symbol);
    }

    /// Returns every order submitted so far, in submission order.
    #[must_use]
    pub fn submitted_orders(&self) -> Vec<OrderRequest> {
        self.orders.read().clone()
    }
}

impl Default for PaperExchangeClient {
    fn default() -> Self {
        Self::new(Decimal::from(10_000))
    }
}

#[async_trait]
impl ExchangeClient for PaperExchangeClient {
    async fn fetch_equity(&self) -> Result<AccountBalance> {
        Ok(self.balance.read().clone())
    }

    async fn fetch_open_positions(&self, symbol: &str) -> Result<Vec<OpenPosition>> {
        Ok(self
            .positions
            .read()
            .iter()
            .filter(|p| p.symbol == symbol)
            .cloned()
            .collect())
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        if order.size <= Decimal::ZERO {
            return Err(AgentError::api(0, "order size must be positive"));
        }

        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        self.orders.write().push(order.clone());

        // Entry legs fill immediately and open a simulated position. Exit
        // legs rest until `close_position` is called.
        if !order.reduce_only {
            let fill_price = order.price.or(order.trigger_price).unwrap_or_default();
            self.positions.write().push(OpenPosition {
                symbol: order.symbol.clone(),
                side: order.side,
                size: order.size,
                fill_price,
            });
        }

        Ok(OrderAck {
            order_id: format!("paper-{id}"),
        })
    }

    async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<()> {
        match symbol {
            Some(s) => self.orders.write().retain(|o| o.symbol != s),
            None => self.orders.write().clear(),
        }
        Ok(())
    }

    fn quantity_precision(&self, _symbol: &str) -> u32 {
        self.quantity_precision
    }

    fn price_precision(&self, _symbol: &str) -> u32 {
        self.price_precision
    }
}
