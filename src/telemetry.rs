//! Log target and filter helpers for dispatcher traffic.
//!
//! Every event the crate emits goes to [`HTTP_TARGET`]. [`http_filter`] turns
//! that target up without turning up the rest of the process, and
//! [`init_logging`] / [`init_json_logging`] install a global `fmt` subscriber
//! with that filter for binaries that have none of their own.
//!
//! ```rust,no_run
//! request_dispatch::telemetry::init_logging(tracing::Level::DEBUG)?;
//! # Ok::<(), request_dispatch::RequestError>(())
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, LevelFilter};

use crate::error::{RequestError, Result};

/// Target of every dispatch, response and interceptor event.
pub const HTTP_TARGET: &str = "request_dispatch::http";

/// `warn` everywhere, `level` for [`HTTP_TARGET`].
pub fn http_filter(level: Level) -> EnvFilter {
    EnvFilter::default()
        .add_directive(LevelFilter::WARN.into())
        .add_directive(http_directive(level))
}

fn http_directive(level: Level) -> Directive {
    format!("{HTTP_TARGET}={}", level.as_str().to_ascii_lowercase())
        .parse()
        .unwrap_or_else(|_| LevelFilter::from_level(level).into())
}

/// Install a text subscriber filtered by [`http_filter`].
///
/// Fails with [`RequestError::Configuration`] when a global subscriber is
/// already installed.
pub fn init_logging(level: Level) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(http_filter(level))
        .with_target(true)
        .try_init()
        .map_err(already_installed)
}

/// [`init_logging`] with one JSON object per event.
pub fn init_json_logging(level: Level) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(http_filter(level))
        .json()
        .flatten_event(true)
        .try_init()
        .map_err(already_installed)
}

fn already_installed(e: impl std::fmt::Display) -> RequestError {
    RequestError::Configuration(format!("Cannot install tracing subscriber: {e}"))
}
