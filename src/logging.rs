use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive, e.g. `outline=debug`
pub const LOG_ENV: &str = "OUTLINE_LOG";

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Install the stderr subscriber once per process. `OUTLINE_LOG` wins over
/// `verbose`; without either only warnings are shown.
pub fn init_tracing(verbose: bool) {
    TRACING_INIT.get_or_init(|| {
        let fallback = if verbose { "debug" } else { "warn" };
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_new(fallback))
            .unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .try_init();
    });
}
