//! Kraken Futures exchange integration.
//!
//! Provides a live REST client ([`KrakenFuturesClient`]) and a simulated
//! paper client ([`PaperExchangeClient`]), both implementing the
//! `ExchangeClient` capability contract from `follower-core`.

pub mod auth;
pub mod client;
pub mod paper;

pub use auth::{KrakenAuth, KrakenAuthConfig, SignedHeaders};
pub use client::{KrakenClientConfig, KrakenFuturesClient, KRAKEN_DEMO_URL, KRAKEN_LIVE_URL};
pub use paper::PaperExchangeClient;
