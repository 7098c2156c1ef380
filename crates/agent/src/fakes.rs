//! Hand-written collaborator fakes for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use follower_core::{
    AccessState, AccountBalance, AgentError, ExchangeClient, OpenPosition, OrderAck, OrderRequest,
    ReportAck, Result, SignalPoll, SignalSource, TradeReport,
};

/// Scriptable in-memory exchange.
pub struct FakeExchange {
    balance: Mutex<AccountBalance>,
    positions: Mutex<Vec<OpenPosition>>,
    submitted: Mutex<Vec<OrderRequest>>,
    equity_calls: AtomicUsize,
    fail_order_at: Mutex<Option<usize>>,
}

impl FakeExchange {
    pub fn with_usd(amount: Decimal) -> Self {
        let mut total = HashMap::new();
        total.insert("USD".to_string(), amount);
        Self {
            balance: Mutex::new(AccountBalance {
                total,
                free: HashMap::new(),
            }),
            positions: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            equity_calls: AtomicUsize::new(0),
            fail_order_at: Mutex::new(None),
        }
    }

    /// Makes the nth submitted order (0-based) fail.
    pub fn fail_order_at(&self, index: usize) {
        *self.fail_order_at.lock() = Some(index);
    }

    pub fn set_positions(&self, positions: Vec<OpenPosition>) {
        *self.positions.lock() = positions;
    }

    pub fn submitted(&self) -> Vec<OrderRequest> {
        self.submitted.lock().clone()
    }

    pub fn equity_calls(&self) -> usize {
        self.equity_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeClient for FakeExchange {
    async fn fetch_equity(&self) -> Result<AccountBalance> {
        self.equity_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.balance.lock().clone())
    }

    async fn fetch_open_positions(&self, symbol: &str) -> Result<Vec<OpenPosition>> {
        Ok(self
            .positions
            .lock()
            .iter()
            .filter(|p| p.symbol == symbol)
            .cloned()
            .collect())
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        let count = self.submitted.lock().len();
        if *self.fail_order_at.lock() == Some(count) {
            return Err(AgentError::api(400, "order rejected"));
        }

        self.submitted.lock().push(order.clone());

        // Entry legs fill instantly; exit legs rest until scripted away.
        if !order.reduce_only {
            self.positions.lock().push(OpenPosition {
                symbol: order.symbol.clone(),
                side: order.side,
                size: order.size,
                fill_price: order.price.or(order.trigger_price).unwrap_or_default(),
            });
        }

        Ok(OrderAck {
            order_id: format!("fake-{count}"),
        })
    }

    async fn cancel_all_orders(&self, _symbol: Option<&str>) -> Result<()> {
        Ok(())
    }

    fn quantity_precision(&self, _symbol: &str) -> u32 {
        3
    }

    fn price_precision(&self, _symbol: &str) -> u32 {
        4
    }
}

/// Scriptable signal source that replays a queue of poll results.
pub struct FakeSignalSource {
    access: Mutex<AccessState>,
    polls: Mutex<VecDeque<SignalPoll>>,
    reports: Mutex<Vec<TradeReport>>,
    fail_report: AtomicBool,
}

impl Default for FakeSignalSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSignalSource {
    pub fn new() -> Self {
        Self {
            access: Mutex::new(AccessState {
                access_granted: true,
                reason: None,
                amount_due: None,
            }),
            polls: Mutex::new(VecDeque::new()),
            reports: Mutex::new(Vec::new()),
            fail_report: AtomicBool::new(false),
        }
    }

    pub fn set_access(&self, access: AccessState) {
        *self.access.lock() = access;
    }

    pub fn push_poll(&self, poll: SignalPoll) {
        self.polls.lock().push_back(poll);
    }

    pub fn fail_reports(&self) {
        self.fail_report.store(true, Ordering::SeqCst);
    }

    pub fn reports(&self) -> Vec<TradeReport> {
        self.reports.lock().clone()
    }
}

#[async_trait]
impl SignalSource for FakeSignalSource {
    async fn verify_access(&self) -> Result<AccessState> {
        Ok(self.access.lock().clone())
    }

    async fn poll_latest_signal(&self) -> Result<SignalPoll> {
        Ok(self
            .polls
            .lock()
            .pop_front()
            .unwrap_or(SignalPoll::NoSignal))
    }

    async fn report_trade(&self, report: &TradeReport) -> Result<ReportAck> {
        if self.fail_report.load(Ordering::SeqCst) {
            return Err(AgentError::Network("report endpoint unreachable".to_string()));
        }
        self.reports.lock().push(report.clone());
        Ok(ReportAck::default())
    }
}
