pub mod balance;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod order;
pub mod position;
pub mod signal;
pub mod sizing;
pub mod symbol;
pub mod traits;

pub use balance::{AccountBalance, BalanceSource, ResolvedEquity, SETTLEMENT_PREFERENCE};
pub use config::{AgentConfig, AppConfig, ExchangeConfig, ServerConfig, SignalSourceConfig};
pub use config_loader::ConfigLoader;
pub use error::{AgentError, OrderLeg, Result};
pub use order::{OrderAck, OrderKind, OrderRequest};
pub use position::{AgentState, OpenPosition, Position};
pub use signal::{AccessState, OrderSide, ReportAck, Signal, SignalAction, SignalPoll, TradeReport};
pub use sizing::{default_risk_fraction, size_position, truncate_quantity};
pub use symbol::translate_symbol;
pub use traits::{ExchangeClient, SignalSource};
