//! Symbol translation between source notation and the exchange's
//! perpetual instrument codes.

/// Translates a source symbol ("ADA/USDT") into the exchange's linear
/// perpetual identifier ("pf_adausd").
///
/// Pure and injective in the base asset: the quote component is ignored, so
/// "ADA/USDT" and "ADA/USD" map to the same instrument. Must be applied
/// identically for dedup lookups and order submission.
#[must_use]
pub fn translate_symbol(symbol: &str) -> String {
    let base = symbol
        .split('/')
        .next()
        .unwrap_or(symbol)
        .to_ascii_lowercase();
    format!("pf_{base}usd")
}
