//! Logging setup.
//!
//! `RUST_LOG` takes precedence over the configured filter. Timestamps use
//! the local timezone.

use chrono::Local;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{Error, Result};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "snippet_relay=info,wp_snippets=info,tower_http=info";

/// Custom timer that uses the local timezone via chrono.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Build the filter: `RUST_LOG` if set and valid, otherwise `default_filter`.
pub fn build_filter(default_filter: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_filter)
        .map_err(|e| Error::Other(format!("Invalid filter directive: {e}")))
}

/// Install the global subscriber.
pub fn init_logging(default_filter: &str, json: bool) -> Result<()> {
    let filter = build_filter(default_filter)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(fmt::layer().json().with_timer(LocalTimer).with_target(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_timer(LocalTimer).with_target(true))
            .try_init()
    };

    result.map_err(|e| Error::Other(format!("Failed to install subscriber: {e}")))
}
