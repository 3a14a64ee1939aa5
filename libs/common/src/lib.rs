//! Common library for the Taxora services
//!
//! This crate provides functionality shared by the auth and api services:
//! MongoDB connectivity, the Redis session cache, document models, token
//! verification, server settings, tracing setup and error types.

pub mod cache;
pub mod database;
pub mod error;
pub mod models;
pub mod settings;
pub mod token;

/// Initialise the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("tracing subscriber was already initialised");
    }
}
