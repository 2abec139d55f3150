//! Structured logging for conversions.

use crate::report::ConversionResult;
use std::str::FromStr;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Conversions slower than this are logged at `warn`.
const SLOW_CONVERSION_MS: i64 = 5000;

/// Log line format for [`init_tracing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}', expected text or json", other)),
        }
    }
}

/// Installs the global subscriber. Filter comes from `RUST_LOG`, default `info`.
///
/// Logs go to stderr so stdout stays clean for `--json` output.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Records a finished conversion.
pub fn record_conversion(result: &ConversionResult) {
    let duration_ms = result.duration_ms();

    info!(
        session_id = %result.session_id,
        outputs = result.outputs.len(),
        duration_ms = duration_ms,
        "SVG conversion completed"
    );

    for (size, path) in result.entries() {
        info!(session_id = %result.session_id, size = %size, path = %path.display(), "Output");
    }

    if duration_ms > SLOW_CONVERSION_MS {
        warn!(
            session_id = %result.session_id,
            duration_ms = duration_ms,
            "SVG conversion exceeded performance threshold (5000ms)"
        );
    }
}
