//! HTTP client for the remote signal source.

pub mod client;

pub use client::{SignalApiClient, SignalApiConfig, API_KEY_ENV};
