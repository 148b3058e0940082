//! Diagnostics setup for the graphscale CLI.
//!
//! Everything human-facing except the final run summary goes through
//! `tracing` to stderr, so stdout stays reserved for the summary. The
//! record format is chosen once at startup from `GRAPHSCALE_LOG_FORMAT`;
//! the level comes from `RUST_LOG` and defaults to `info`.

use std::{env, str::FromStr, sync::OnceLock};

use thiserror::Error;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, Layer, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

const FORMAT_ENV: &str = "GRAPHSCALE_LOG_FORMAT";

static INSTALLED: OnceLock<()> = OnceLock::new();

/// How diagnostic records are rendered on stderr.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    /// Compact single-line text for terminals.
    #[default]
    Human,
    /// One JSON object per record, for log shippers.
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            _ => Err(LoggingError::UnknownFormat {
                requested: raw.trim().to_owned(),
            }),
        }
    }
}

/// Errors raised while setting up diagnostics.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// `GRAPHSCALE_LOG_FORMAT` held a value that names no known format.
    /// Non-UTF-8 values are read lossily and end up here too.
    #[error("GRAPHSCALE_LOG_FORMAT must be `human` or `json`, not `{requested}`")]
    UnknownFormat {
        /// The rejected value, trimmed.
        requested: String,
    },
    /// The global tracing dispatcher is already owned by someone else.
    #[error("global tracing subscriber could not be installed: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Routes `tracing` and `log` events to stderr.
///
/// Safe to call more than once; only the first call installs anything.
/// Spans opened with `#[instrument]` emit one closing record carrying
/// their elapsed time, which is how phase durations (ingest, generation)
/// reach the log without extra plumbing.
///
/// # Errors
/// Returns [`LoggingError`] when the format variable holds an unknown
/// value or the global subscriber slot cannot be claimed.
pub fn init() -> Result<(), LoggingError> {
    let format: LogFormat = match env::var_os(FORMAT_ENV) {
        Some(raw) => raw.to_string_lossy().parse()?,
        None => LogFormat::default(),
    };

    if INSTALLED.set(()).is_err() {
        return Ok(());
    }
    install(format)
}

fn install(format: LogFormat) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let records = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    let records = match format {
        LogFormat::Human => records.boxed(),
        LogFormat::Json => records.json().with_current_span(true).boxed(),
    };

    // Crates speaking the `log` facade get bridged; losing the race for
    // that global slot means someone else already bridged it.
    let _ = LogTracer::init();

    tracing_subscriber::registry()
        .with(filter)
        .with(records)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{LogFormat, LoggingError, init};

    #[rstest]
    #[case::lowercase("json", LogFormat::Json)]
    #[case::uppercase("JSON", LogFormat::Json)]
    #[case::padded("  human\t", LogFormat::Human)]
    #[case::text_alias("text", LogFormat::Human)]
    fn format_strings_parse(#[case] raw: &str, #[case] expected: LogFormat) {
        let format = raw.parse::<LogFormat>().expect("recognized format");
        assert_eq!(format, expected);
    }

    #[rstest]
    #[case("yaml")]
    #[case("jsonl")]
    #[case("")]
    fn unrecognized_formats_are_rejected(#[case] raw: &str) {
        let err = raw.parse::<LogFormat>().expect_err("unrecognized format");
        let LoggingError::UnknownFormat { requested } = err else {
            panic!("wrong variant: {err:?}");
        };
        assert_eq!(requested, raw.trim());
    }

    #[test]
    fn repeated_initialisation_is_harmless() {
        init().expect("first call installs the subscriber");
        init().expect("later calls are no-ops");
    }
}
