//! The polling loop.
//!
//! One cooperative loop drives everything: poll the signal source, execute
//! at most one new signal, check the tracked position, sleep. No background
//! tasks mutate agent state; the loop owns it outright.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use tracing::{error, info, warn};

use follower_core::{
    AgentConfig, AgentError, AgentState, ExchangeClient, Result, SignalPoll, SignalSource,
};

use crate::executor::{ExecutionOutcome, SignalExecutor};
use crate::monitor::PositionMonitor;

/// The follower agent's main loop.
pub struct AgentLoop {
    source: Arc<dyn SignalSource>,
    exchange: Arc<dyn ExchangeClient>,
    config: AgentConfig,
    executor: SignalExecutor,
    monitor: PositionMonitor,
    state: AgentState,
}

impl AgentLoop {
    /// Wires the loop to its collaborators.
    #[must_use]
    pub fn new(
        source: Arc<dyn SignalSource>,
        exchange: Arc<dyn ExchangeClient>,
        config: AgentConfig,
    ) -> Self {
        let executor = SignalExecutor::new(config.risk_fraction);
        Self {
            source,
            exchange,
            config,
            executor,
            monitor: PositionMonitor::new(),
            state: AgentState::new(),
        }
    }

    /// Returns the current agent state (used by tests and diagnostics).
    #[must_use]
    pub fn state(&self) -> &AgentState {
        &self.state
    }

    /// Verifies access, then polls until Ctrl-C.
    ///
    /// Cycle-level failures are logged and absorbed at this boundary; only
    /// fatal conditions (configuration problems, access denial when
    /// configured to exit) end the loop with an error.
    ///
    /// # Errors
    /// Returns the fatal condition that stopped the loop.
    pub async fn run(&mut self) -> Result<()> {
        self.verify_startup_access().await?;

        info!(
            poll_interval_secs = self.config.poll_interval_secs,
            "agent loop started"
        );

        loop {
            if let Err(e) = self.run_cycle().await {
                if self.is_fatal(&e) {
                    error!("fatal error, stopping: {e}");
                    return Err(e);
                }
                if e.is_transient() {
                    warn!("transient error, will retry next cycle: {e}");
                } else {
                    error!("cycle failed: {e}");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(self.config.poll_interval_secs)) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown signal received");
                    return Ok(());
                }
            }
        }
    }

    /// Runs one poll cycle: optional re-verify, poll, execute, monitor.
    ///
    /// # Errors
    /// Propagates every failure to the caller; `run` decides which are
    /// fatal.
    pub async fn run_cycle(&mut self) -> Result<()> {
        if self.config.verify_each_cycle {
            let access = self.source.verify_access().await?;
            if !access.access_granted {
                return self.handle_access_denied(access.reason, access.amount_due);
            }
        }

        match self.source.poll_latest_signal().await? {
            SignalPoll::NoSignal => {}
            SignalPoll::AccessDenied { reason, amount_due } => {
                return self.handle_access_denied(reason, amount_due);
            }
            SignalPoll::Signal(signal) => {
                match self
                    .executor
                    .execute(&signal, &mut self.state, self.exchange.as_ref())
                    .await
                {
                    Ok(ExecutionOutcome::Executed) => {
                        info!(signal_id = %signal.signal_id, "signal executed");
                    }
                    Ok(ExecutionOutcome::Skipped(reason)) => {
                        info!(signal_id = %signal.signal_id, "signal skipped: {reason}");
                    }
                    Err(e) if e.is_signal_local() => {
                        // This signal cannot be traded; the next one can.
                        warn!(signal_id = %signal.signal_id, "signal not tradable: {e}");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        self.monitor
            .check(&mut self.state, self.exchange.as_ref(), self.source.as_ref())
            .await?;

        Ok(())
    }

    async fn verify_startup_access(&self) -> Result<()> {
        let access = self.source.verify_access().await?;
        if access.access_granted {
            info!("signal source access verified");
            return Ok(());
        }
        self.handle_access_denied(access.reason, access.amount_due)
    }

    fn handle_access_denied(
        &self,
        reason: Option<String>,
        amount_due: Option<Decimal>,
    ) -> Result<()> {
        warn!(
            reason = reason.as_deref().unwrap_or("none given"),
            "signal source denied access"
        );
        if self.config.exit_on_access_denied {
            Err(AgentError::access_denied(reason, amount_due))
        } else {
            Ok(())
        }
    }

    fn is_fatal(&self, err: &AgentError) -> bool {
        matches!(
            err,
            AgentError::Configuration(_) | AgentError::AccessDenied { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeExchange, FakeSignalSource};
    use follower_core::{AccessState, Signal, SignalAction};
    use rust_decimal_macros::dec;

    fn test_config() -> AgentConfig {
        AgentConfig {
            poll_interval_secs: 1,
            risk_fraction: dec!(0.02),
            verify_each_cycle: false,
            exit_on_access_denied: true,
        }
    }

    fn sample_signal() -> Signal {
        Signal {
            signal_id: "sig-1".to_string(),
            symbol: "ADA/USDT".to_string(),
            action: SignalAction::Buy,
            entry_price: dec!(100),
            stop_loss: dec!(98),
            take_profit: dec!(110),
            leverage: 5,
        }
    }

    fn wired_loop(
        source: Arc<FakeSignalSource>,
        exchange: Arc<FakeExchange>,
        config: AgentConfig,
    ) -> AgentLoop {
        AgentLoop::new(source, exchange, config)
    }

    #[tokio::test]
    async fn test_cycle_executes_new_signal() {
        let source = Arc::new(FakeSignalSource::new());
        let exchange = Arc::new(FakeExchange::with_usd(dec!(10000)));
        source.push_poll(SignalPoll::Signal(sample_signal()));

        let mut agent = wired_loop(source.clone(), exchange.clone(), test_config());
        agent.run_cycle().await.unwrap();

        assert!(agent.state().has_open_position());
        assert_eq!(exchange.submitted().len(), 3);
    }

    #[tokio::test]
    async fn test_full_lifecycle_executes_then_reports_close() {
        let source = Arc::new(FakeSignalSource::new());
        let exchange = Arc::new(FakeExchange::with_usd(dec!(10000)));
        source.push_poll(SignalPoll::Signal(sample_signal()));

        let mut agent = wired_loop(source.clone(), exchange.clone(), test_config());

        // Cycle 1: signal arrives and the bracket is placed.
        agent.run_cycle().await.unwrap();
        assert!(agent.state().has_open_position());
        assert!(source.reports().is_empty());

        // An exit leg fills on the exchange.
        exchange.set_positions(Vec::new());

        // Cycle 2: the monitor detects the close and reports once.
        agent.run_cycle().await.unwrap();
        assert!(!agent.state().has_open_position());
        assert_eq!(source.reports().len(), 1);

        // Cycle 3: idle.
        agent.run_cycle().await.unwrap();
        assert_eq!(source.reports().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_poll_of_same_signal_is_inert() {
        let source = Arc::new(FakeSignalSource::new());
        let exchange = Arc::new(FakeExchange::with_usd(dec!(10000)));
        source.push_poll(SignalPoll::Signal(sample_signal()));
        source.push_poll(SignalPoll::Signal(sample_signal()));

        let mut agent = wired_loop(source.clone(), exchange.clone(), test_config());
        agent.run_cycle().await.unwrap();
        agent.run_cycle().await.unwrap();

        // Only the first poll produced orders.
        assert_eq!(exchange.submitted().len(), 3);
    }

    #[tokio::test]
    async fn test_access_denied_poll_is_fatal_when_configured() {
        let source = Arc::new(FakeSignalSource::new());
        let exchange = Arc::new(FakeExchange::with_usd(dec!(10000)));
        source.push_poll(SignalPoll::AccessDenied {
            reason: Some("fees outstanding".to_string()),
            amount_due: Some(dec!(149)),
        });

        let mut agent = wired_loop(source, exchange, test_config());
        let err = agent.run_cycle().await.unwrap_err();
        assert!(matches!(err, AgentError::AccessDenied { .. }));
    }

    #[tokio::test]
    async fn test_access_denied_poll_is_absorbed_when_configured_to_idle() {
        let source = Arc::new(FakeSignalSource::new());
        let exchange = Arc::new(FakeExchange::with_usd(dec!(10000)));
        source.push_poll(SignalPoll::AccessDenied {
            reason: None,
            amount_due: None,
        });

        let mut config = test_config();
        config.exit_on_access_denied = false;

        let mut agent = wired_loop(source, exchange, config);
        agent.run_cycle().await.unwrap();
    }

    #[tokio::test]
    async fn test_untradable_signal_does_not_kill_the_cycle() {
        let source = Arc::new(FakeSignalSource::new());
        let exchange = Arc::new(FakeExchange::with_usd(dec!(0)));
        source.push_poll(SignalPoll::Signal(sample_signal()));

        let mut agent = wired_loop(source.clone(), exchange.clone(), test_config());
        // InsufficientEquity is signal-local: absorbed inside the cycle.
        agent.run_cycle().await.unwrap();
        assert!(!agent.state().has_open_position());
    }

    #[tokio::test]
    async fn test_startup_verify_denial_is_fatal() {
        let source = Arc::new(FakeSignalSource::new());
        source.set_access(AccessState {
            access_granted: false,
            reason: Some("key suspended".to_string()),
            amount_due: None,
        });
        let exchange = Arc::new(FakeExchange::with_usd(dec!(10000)));

        let mut agent = wired_loop(source, exchange, test_config());
        let err = agent.verify_startup_access().await.unwrap_err();
        assert!(matches!(err, AgentError::AccessDenied { .. }));
    }
}
