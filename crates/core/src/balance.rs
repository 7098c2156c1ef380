//! Account balance mapping and equity resolution.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Settlement currencies checked for equity, in preference order. The
/// exchange is multi-collateral, so the first positive balance wins.
pub const SETTLEMENT_PREFERENCE: [&str; 3] = ["USD", "USDT", "USDC"];

/// Which balance bucket an equity figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceSource {
    Total,
    Free,
}

/// Equity figure resolved from an account balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEquity {
    pub amount: Decimal,
    pub currency: String,
    pub source: BalanceSource,
}

/// Normalized per-currency account balance as reported by an exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Total balance per currency, including margin in use.
    pub total: HashMap<String, Decimal>,

    /// Free (available) balance per currency.
    pub free: HashMap<String, Decimal>,
}

impl AccountBalance {
    /// Resolves the equity used for sizing: scans `total` across the
    /// settlement-currency preference list for the first positive amount,
    /// then falls back to the same scan over `free`. Returns `None` when no
    /// positive balance exists in any checked currency.
    #[must_use]
    pub fn resolve_equity(&self) -> Option<ResolvedEquity> {
        for currency in SETTLEMENT_PREFERENCE {
            if let Some(&amount) = self.total.get(currency) {
                if amount > Decimal::ZERO {
                    return Some(ResolvedEquity {
                        amount,
                        currency: currency.to_string(),
                        source: BalanceSource::Total,
                    });
                }
            }
        }

        for currency in SETTLEMENT_PREFERENCE {
            if let Some(&amount) = self.free.get(currency) {
                if amount > Decimal::ZERO {
                    return Some(ResolvedEquity {
                        amount,
                        currency: currency.to_string(),
                        source: BalanceSource::Free,
                    });
                }
            }
        }

        None
    }
}
