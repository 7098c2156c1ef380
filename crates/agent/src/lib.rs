//! Signal execution, position monitoring, and the polling loop.

pub mod executor;
pub mod monitor;
pub mod reporter;
pub mod runner;

#[cfg(test)]
pub(crate) mod fakes;

pub use executor::{ExecutionOutcome, SignalExecutor};
pub use monitor::PositionMonitor;
pub use reporter::PnLReporter;
pub use runner::AgentLoop;
