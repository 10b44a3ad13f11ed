use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is unset.
///
/// Calendar transitions (`debug`) and rejected updates (`warn`) are visible;
/// schedule internals are not.
pub const DEFAULT_LOG_FILTER: &str = "info,bevy_datepick=debug,bevy_app=warn,bevy_ecs=warn";

/// Adds per-value conversion and inbox traffic (`trace`).
pub const VERBOSE_LOG_FILTER: &str = "info,bevy_datepick=trace,bevy_app=warn,bevy_ecs=warn";

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

fn calendar_filter(env_directives: Option<&str>, fallback: &str) -> EnvFilter {
    env_directives
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

/// Install the process-wide subscriber with [`DEFAULT_LOG_FILTER`].
///
/// `RUST_LOG` wins when it holds a valid filter. Only the first call in a
/// process has an effect.
pub fn init_logging() {
    init_logging_with(DEFAULT_LOG_FILTER);
}

/// Like [`init_logging`], with `fallback` used when `RUST_LOG` is unset or invalid.
pub fn init_logging_with(fallback: &str) {
    LOGGING_INITIALIZED.get_or_init(|| {
        let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
        let filter = calendar_filter(env_directives.as_deref(), fallback);

        let _ = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init();
    });
}
