//! Structured logging setup.
//!
//! Colored human-readable output for development, JSON lines for
//! production. Every update is handled inside its own span so log lines
//! from concurrent updates can be told apart.

use tracing::Span;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{BotError, BotResult};

/// Directives applied on top of `RUST_LOG`.
const DEFAULT_DIRECTIVES: &[&str] = &["clip=info", "reqwest=warn", "hyper=warn"];

/// Build the filter from `RUST_LOG` plus the default directives.
pub fn env_filter() -> BotResult<EnvFilter> {
    let mut filter = EnvFilter::from_default_env();
    for directive in DEFAULT_DIRECTIVES {
        let directive = directive
            .parse()
            .map_err(|e| BotError::config_error(format!("invalid log directive {}: {}", directive, e)))?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

/// Install the global subscriber.
pub fn init_tracing(json: bool) -> BotResult<()> {
    let filter = env_filter()?;
    let result = if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(filter)
            .try_init()
    };
    result.map_err(|e| BotError::config_error(format!("failed to install logger: {}", e)))
}

/// Span wrapping the handling of one update.
pub fn update_span(update_id: i64, kind: &str) -> Span {
    tracing::info_span!("update", update_id = update_id, kind = %kind)
}
