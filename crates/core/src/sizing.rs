//! Risk-based position sizing.
//!
//! Pure functions mapping (equity, entry, stop, leverage, risk fraction) to
//! an order quantity. The caller supplies the exchange's quantity precision
//! and truncates with [`truncate_quantity`]; sizing itself never rounds.

use rust_decimal::Decimal;

use crate::error::{AgentError, Result};

/// Fraction of equity risked per trade when the configuration does not
/// override it (2%).
#[must_use]
pub fn default_risk_fraction() -> Decimal {
    Decimal::new(2, 2)
}

/// Sizes a position from account equity and the signal's risk parameters.
///
/// `risk_amount = equity * risk_fraction`, `risk_per_unit = |entry - stop|`,
/// `quantity = risk_amount / risk_per_unit * leverage`.
///
/// # Errors
/// - [`AgentError::InsufficientEquity`] if `equity <= 0` (checked before any
///   arithmetic; the caller must abort without touching the exchange).
/// - [`AgentError::InvalidRisk`] if entry equals stop (degenerate signal).
pub fn size_position(
    equity: Decimal,
    entry_price: Decimal,
    stop_loss: Decimal,
    leverage: u32,
    risk_fraction: Decimal,
) -> Result<Decimal> {
    if equity <= Decimal::ZERO {
        return Err(AgentError::InsufficientEquity);
    }

    let risk_per_unit = (entry_price - stop_loss).abs();
    if risk_per_unit.is_zero() {
        return Err(AgentError::InvalidRisk { entry: entry_price });
    }

    let risk_amount = equity * risk_fraction;
    let base_quantity = risk_amount / risk_per_unit;

    Ok(base_quantity * Decimal::from(leverage))
}

/// Truncates a quantity to the exchange's quantity precision. Truncation
/// never rounds up past the exchange-specified step.
#[must_use]
pub fn truncate_quantity(quantity: Decimal, precision: u32) -> Decimal {
    quantity.trunc_with_scale(precision)
}
