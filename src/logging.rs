//! Structured logging setup

use std::sync::Once;

use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Filter directives are read from this variable, e.g. `retail_triage=debug`
pub static LOG_ENV_VAR: &str = "RETAIL_TRIAGE_LOG";

/// Install the global fmt subscriber once; later calls are no-ops.
///
/// Logs go to stderr so command output on stdout stays machine readable.
pub fn register_logger() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let env_filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .with_env_var(LOG_ENV_VAR)
            .from_env_lossy();

        // Another subscriber may already be installed by an embedding binary
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
