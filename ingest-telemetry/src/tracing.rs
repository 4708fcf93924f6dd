//! Tracing subscriber setup for ingestion jobs and tests.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable consulted for filter directives.
const LOG_ENV_NAME: &str = "RUST_LOG";

static TEST_TRACING: Once = Once::new();

/// Installs a global fmt subscriber filtered by `RUST_LOG`, or by `default_directive` when unset.
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(default_directive: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_env(LOG_ENV_NAME)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

/// Installs a test-writer subscriber once per process.
///
/// Output is captured by the test harness and only shown for failing tests.
pub fn init_test_tracing() {
    TEST_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_NAME)
            .unwrap_or_else(|_| EnvFilter::new("ingest=debug"));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();

        ::tracing::debug!("test tracing initialized");
    });
}
