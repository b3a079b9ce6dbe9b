//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use stave_core::{config::StaveConfig, ids::NodeId, session::Session};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A session with deterministic placement jitter.
#[allow(dead_code)]
pub fn seeded_session(seed: u64) -> Session {
    init_logging();
    let mut config = StaveConfig::default();
    config.engine.jitter_seed = Some(seed);
    Session::new(config).unwrap()
}

#[allow(dead_code)]
pub fn node_id(value: &str) -> NodeId {
    NodeId::new(value).unwrap()
}
