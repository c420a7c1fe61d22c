//! Logging utilities for Scholar.
//!
//! Provides structured logging with per-run trace IDs.
//!
//! # Noise Filtering
//!
//! By default, noisy library modules (hyper, reqwest, h2, rustls) are set to
//! `warn` level to keep the agent's own reasoning logs readable.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Default noisy modules that should be filtered to warn level.
pub const NOISY_MODULES: &[&str] = &[
    "hyper",
    "hyper_util",
    "reqwest",
    "h2",
    "rustls",
    "rusqlite",
];

/// Build the filter directive string with noise suppression.
fn build_directives(log_level: &str, excluded_targets: &[String]) -> String {
    let mut directives = String::from(log_level);

    for module in NOISY_MODULES {
        directives.push_str(&format!(",{module}=warn"));
    }

    for target in excluded_targets {
        directives.push_str(&format!(",{target}=warn"));
    }

    directives
}

/// Initialize logging with the given configuration.
///
/// * `log_level` - Base log level (trace, debug, info, warn, error)
/// * `log_format` - `json` for structured JSON, anything else for human-readable
///
/// `RUST_LOG` overrides the computed filter when set.
pub fn init_logging(log_level: &str, log_format: &str) {
    init_logging_with_exclusions(log_level, log_format, &[]);
}

/// Initialize logging with additional module targets clamped to `warn`.
pub fn init_logging_with_exclusions(
    log_level: &str,
    log_format: &str,
    excluded_targets: &[String],
) {
    let directives = build_directives(log_level, excluded_targets);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let subscriber = tracing_subscriber::registry().with(filter);

    if log_format == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr);
        let _ = subscriber.with(fmt_layer).try_init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);
        let _ = subscriber.with(fmt_layer).try_init();
    }

    tracing::debug!(
        log_level = %log_level,
        log_format = %log_format,
        noise_filtered = NOISY_MODULES.len() + excluded_targets.len(),
        "Logging initialized"
    );
}

/// Generate a new trace ID for a research run.
pub fn generate_trace_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Create a tracing span for one agent run.
///
/// ```ignore
/// let span = run_span!(trace_id, mode = "initial");
/// async { /* ... */ }.instrument(span).await;
/// ```
#[macro_export]
macro_rules! run_span {
    ($trace_id:expr) => {
        tracing::info_span!("agent_run", trace_id = %$trace_id)
    };
    ($trace_id:expr, $($field:tt)*) => {
        tracing::info_span!("agent_run", trace_id = %$trace_id, $($field)*)
    };
}
