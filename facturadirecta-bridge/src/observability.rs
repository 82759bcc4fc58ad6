//! Structured logging setup for hosts embedding the bridge.
//!
//! The library only emits `tracing` events and spans. Hosts that do not install
//! their own subscriber can call [`init_observability`].

use std::io;

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{BridgeError, Result};

/// Environment variable selecting the [`LogFormat`].
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// One JSON object per line, with the current span list (batch id included).
    Json,
}

impl LogFormat {
    /// Parses a format name; anything but `json` (any case) is [`LogFormat::Pretty`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("json") { Self::Json } else { Self::Pretty }
    }

    /// Reads the format from [`LOG_FORMAT_ENV`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::parse(&std::env::var(LOG_FORMAT_ENV).unwrap_or_default())
    }
}

/// Installs a global subscriber writing to stderr.
///
/// Level filtering follows `RUST_LOG` (default [`DEFAULT_FILTER`]). Closed spans are
/// reported, so every item and request logs its duration.
///
/// # Errors
///
/// Returns [`BridgeError::Config`] if a global subscriber is already installed.
///
/// # Examples
///
/// ```no_run
/// use facturadirecta_bridge::observability::{LogFormat, init_observability};
///
/// init_observability(LogFormat::from_env()).unwrap();
/// ```
pub fn init_observability(format: LogFormat) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Pretty => subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Json => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(io::stderr),
            )
            .try_init(),
    };

    installed.map_err(|e| BridgeError::Config(format!("cannot install log subscriber: {e}")))
}
