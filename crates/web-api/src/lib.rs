//! Liveness HTTP endpoint for the follower agent.

pub mod server;

pub use server::{router, serve, ServerStatus};
