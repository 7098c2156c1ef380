//! Position monitoring and close detection.

use chrono::Utc;
use tracing::{info, warn};

use follower_core::{
    translate_symbol, AgentState, ExchangeClient, Result, SignalSource, TradeReport,
};

use crate::reporter::PnLReporter;

/// Watches the tracked position and reports its close exactly once.
#[derive(Debug, Clone, Default)]
pub struct PositionMonitor {
    reporter: PnLReporter,
}

impl PositionMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether the tracked position still exists on the exchange.
    ///
    /// When the exchange no longer shows it, the slot is cleared first and
    /// the P&L report sent after, so a report-delivery failure can neither
    /// re-trigger the close nor block the next signal. A failed exchange
    /// lookup leaves the slot untouched for the next cycle.
    ///
    /// # Errors
    /// Returns an error if the open-positions lookup fails.
    pub async fn check(
        &self,
        state: &mut AgentState,
        exchange: &dyn ExchangeClient,
        source: &dyn SignalSource,
    ) -> Result<Option<TradeReport>> {
        let Some(ref position) = state.position else {
            return Ok(None);
        };

        let instrument = translate_symbol(&position.symbol);
        let open = exchange.fetch_open_positions(&instrument).await?;
        if !open.is_empty() {
            return Ok(None);
        }

        // The position is gone from the exchange: one of the exit legs
        // filled. Clear the slot before anything fallible.
        let Some(position) = state.position.take() else {
            return Ok(None);
        };

        info!(
            signal_id = %position.signal_id,
            symbol = %position.symbol,
            "position closed on exchange"
        );

        // Whichever exit leg did not fill is still resting.
        if let Err(e) = exchange.cancel_all_orders(Some(&instrument)).await {
            warn!("failed to cancel leftover bracket orders: {e}");
        }

        let report = self.reporter.build_report(&position, Utc::now());

        match source.report_trade(&report).await {
            Ok(ack) => {
                info!(
                    trade_id = %report.trade_id,
                    profit_usd = %report.profit_usd,
                    monthly_profit = %ack.monthly_profit,
                    monthly_fee_due = %ack.monthly_fee_due,
                    "trade reported"
                );
            }
            Err(e) => {
                // The report is dropped rather than retried; the slot is
                // already clear and the loop moves on.
                warn!(trade_id = %report.trade_id, "failed to deliver trade report: {e}");
            }
        }

        Ok(Some(report))
    }
}
