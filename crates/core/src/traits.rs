//! Capability contracts for the agent's external collaborators.

use async_trait::async_trait;

use crate::balance::AccountBalance;
use crate::error::Result;
use crate::order::{OrderAck, OrderRequest};
use crate::position::OpenPosition;
use crate::signal::{AccessState, ReportAck, SignalPoll, TradeReport};

/// Capability contract for a derivatives exchange. One adapter talks to the
/// exchange's authenticated REST surface; a paper adapter satisfies the same
/// contract with simulated fills. The client is long-lived and must be
/// safely reusable across poll cycles without per-call re-authentication.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Fetches the per-currency account balance.
    async fn fetch_equity(&self) -> Result<AccountBalance>;

    /// Fetches open positions for a translated instrument symbol.
    async fn fetch_open_positions(&self, symbol: &str) -> Result<Vec<OpenPosition>>;

    /// Submits a single order leg.
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck>;

    /// Cancels all resting orders, optionally only for one symbol.
    async fn cancel_all_orders(&self, symbol: Option<&str>) -> Result<()>;

    /// Decimal places allowed in order quantities for this symbol.
    fn quantity_precision(&self, symbol: &str) -> u32;

    /// Decimal places allowed in order prices for this symbol.
    fn price_precision(&self, symbol: &str) -> u32;
}

/// Capability contract for the remote signal source.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Verifies that this agent's API key is currently entitled to signals.
    async fn verify_access(&self) -> Result<AccessState>;

    /// Polls for the latest pending signal, normalized into [`SignalPoll`].
    async fn poll_latest_signal(&self) -> Result<SignalPoll>;

    /// Delivers a realized-trade report.
    async fn report_trade(&self, report: &TradeReport) -> Result<ReportAck>;
}
