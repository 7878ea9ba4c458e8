//! Diagnostics for developers, separate from conversation output.
//!
//! Engine messages meant for the person answering go through the message
//! sink and end up on stdout. Tracing goes to stderr so it never interleaves
//! with prompts a caller may be parsing.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Directive used when `RUST_LOG` is unset or unparseable.
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Initialize the tracing subscriber from `RUST_LOG`.
///
/// ```bash
/// RUST_LOG=interro=debug interro run flows/tos.toml
/// ```
pub fn init() {
    let requested = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(requested.as_deref());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

/// Parse `requested` directives, falling back to [`DEFAULT_DIRECTIVE`].
///
/// A typo in `RUST_LOG` must not stop a conversation from running.
fn build_filter(requested: Option<&str>) -> EnvFilter {
    requested
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}
