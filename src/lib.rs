//! Parlay Architect — constrained-combinatorial parlay selection engine.
//!
//! Given a pool of independently scored candidate legs, selects a
//! fixed-size, mutually-compatible subset under a ranked set of quality
//! and correlation constraints. Every invocation terminates in exactly
//! one of two outcomes: a valid selection or an explicit, diagnosable
//! rejection.

pub mod audit;
pub mod config;
pub mod engine;
pub mod intake;
pub mod rules;
pub mod types;

/// Initialise structured logging for a host process.
///
/// Respects `RUST_LOG`; defaults to info-level output for this crate.
/// Set `PARLAY_LOG_JSON` for JSON-formatted logs.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("parlay_architect=info"));

    if std::env::var("PARLAY_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
