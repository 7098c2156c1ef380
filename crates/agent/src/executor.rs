//! Signal execution: sizing and bracket-order submission.
//!
//! One executor call turns one signal into at most one bracket (entry +
//! stop-loss + take-profit) on the exchange. The tracked-position slot is
//! committed only after all three legs are acknowledged, so a partially
//! placed bracket never becomes a tracked position.

use rust_decimal::Decimal;
use tracing::{info, warn};

use follower_core::{
    size_position, translate_symbol, truncate_quantity, AgentError, AgentState, ExchangeClient,
    OrderLeg, OrderRequest, OrderSide, Position, Result, Signal,
};

/// What the executor did with a polled signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// A bracket was submitted and the position slot committed.
    Executed,
    /// The signal was deliberately not traded.
    Skipped(String),
}

/// Turns signals into bracket orders.
#[derive(Debug, Clone)]
pub struct SignalExecutor {
    risk_fraction: Decimal,
}

impl SignalExecutor {
    /// Creates an executor risking `risk_fraction` of equity per trade.
    #[must_use]
    pub fn new(risk_fraction: Decimal) -> Self {
        Self { risk_fraction }
    }

    /// Executes one signal against the exchange, committing the tracked
    /// position into `state` on success.
    ///
    /// Locally known duplicates are skipped without any exchange call. For a
    /// fresh signal the order is: resolve equity, check the exchange for an
    /// existing position in the translated instrument (skip if held), size,
    /// then submit. Sizing failures abort before the first order leg is
    /// submitted; a leg rejection after submission started surfaces as
    /// [`AgentError::OrderSubmission`] and leaves the slot empty.
    ///
    /// # Errors
    /// Returns sizing errors ([`AgentError::InsufficientEquity`],
    /// [`AgentError::InvalidRisk`]) or submission/transport errors.
    pub async fn execute(
        &self,
        signal: &Signal,
        state: &mut AgentState,
        exchange: &dyn ExchangeClient,
    ) -> Result<ExecutionOutcome> {
        if state.last_signal_id.as_deref() == Some(signal.signal_id.as_str()) {
            return Ok(ExecutionOutcome::Skipped(format!(
                "signal {} already processed",
                signal.signal_id
            )));
        }

        if let Some(ref open) = state.position {
            return Ok(ExecutionOutcome::Skipped(format!(
                "position already open for signal {}",
                open.signal_id
            )));
        }

        let balance = exchange.fetch_equity().await?;
        let equity = balance
            .resolve_equity()
            .ok_or(AgentError::InsufficientEquity)?;

        info!(
            currency = %equity.currency,
            amount = %equity.amount,
            "resolved account equity"
        );

        // The exchange is the authority on whether the instrument is already
        // held; the local slot only mirrors it.
        let instrument = translate_symbol(&signal.symbol);
        if !exchange.fetch_open_positions(&instrument).await?.is_empty() {
            return Ok(ExecutionOutcome::Skipped(format!(
                "exchange already holds a position in {instrument}"
            )));
        }

        let raw_quantity = size_position(
            equity.amount,
            signal.entry_price,
            signal.stop_loss,
            signal.leverage,
            self.risk_fraction,
        )?;

        let quantity = truncate_quantity(raw_quantity, exchange.quantity_precision(&instrument));

        if quantity <= Decimal::ZERO {
            return Ok(ExecutionOutcome::Skipped(format!(
                "sized quantity {raw_quantity} truncates to zero"
            )));
        }

        let side = OrderSide::from(signal.action);

        info!(
            signal_id = %signal.signal_id,
            symbol = %instrument,
            side = %side.as_str(),
            quantity = %quantity,
            entry = %signal.entry_price,
            "submitting bracket"
        );

        self.submit_bracket(signal, &instrument, side, quantity, exchange)
            .await?;

        state.position = Some(Position::from_signal(
            signal,
            quantity,
            chrono::Utc::now(),
        ));
        state.last_signal_id = Some(signal.signal_id.clone());

        Ok(ExecutionOutcome::Executed)
    }

    /// Submits the three bracket legs in order: entry, then the protective
    /// stop, then the take-profit. Exit legs are only placed once the entry
    /// is acknowledged.
    async fn submit_bracket(
        &self,
        signal: &Signal,
        instrument: &str,
        side: OrderSide,
        quantity: Decimal,
        exchange: &dyn ExchangeClient,
    ) -> Result<()> {
        let entry = OrderRequest::limit_entry(instrument, side, quantity, signal.entry_price)
            .with_client_order_id(leg_id(&signal.signal_id, "entry"));
        let entry_ack = exchange
            .submit_order(&entry)
            .await
            .map_err(|e| AgentError::order_submission(OrderLeg::Entry, e.to_string()))?;
        info!(order_id = %entry_ack.order_id, "entry leg placed");

        let stop = OrderRequest::stop_loss(instrument, side, quantity, signal.stop_loss)
            .with_client_order_id(leg_id(&signal.signal_id, "sl"));
        let stop_ack = exchange.submit_order(&stop).await.map_err(|e| {
            warn!("stop-loss leg rejected after entry was placed: {e}");
            AgentError::order_submission(OrderLeg::StopLoss, e.to_string())
        })?;
        info!(order_id = %stop_ack.order_id, "stop-loss leg placed");

        let take = OrderRequest::take_profit(instrument, side, quantity, signal.take_profit)
            .with_client_order_id(leg_id(&signal.signal_id, "tp"));
        let take_ack = exchange.submit_order(&take).await.map_err(|e| {
            warn!("take-profit leg rejected after entry was placed: {e}");
            AgentError::order_submission(OrderLeg::TakeProfit, e.to_string())
        })?;
        info!(order_id = %take_ack.order_id, "take-profit leg placed");

        Ok(())
    }
}

fn leg_id(signal_id: &str, leg: &str) -> String {
    format!("follower_{signal_id}_{leg}")
}
