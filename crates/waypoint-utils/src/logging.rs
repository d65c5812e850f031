//! Structured logging for waypoint.
//!
//! Library crates emit `tracing` events; only the binary installs a subscriber.

use std::io::IsTerminal;
use tracing::{Level, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Colored output only on a TTY without NO_COLOR
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise verbose mode logs waypoint at debug level and
/// closes spans with their duration; the default logs waypoint at info.
/// Logs go to stderr so `--json` output on stdout stays machine-readable.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("waypoint=debug,info")
            } else {
                EnvFilter::try_new("waypoint=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_color())
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false);

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                layer
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.with_target(false).compact())
            .try_init()?;
    }

    Ok(())
}

/// Span covering one public operation against one project
pub fn operation_span(project: &str, operation: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "workflow_operation",
        project = %project,
        operation = %operation,
    )
}

/// Log a persisted phase change
pub fn log_phase_transition(project: &str, from: &str, to: &str, validation_skipped: bool) {
    info!(
        project = %project,
        from = %from,
        to = %to,
        validation_skipped,
        "phase transition recorded"
    );
}
