use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "TASKLIST_LOG";
const DEFAULT_DIRECTIVE: &str = "warn";

/// Installs a stderr subscriber filtered by `TASKLIST_LOG` (default `warn`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // A subscriber may already be installed when running under a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
