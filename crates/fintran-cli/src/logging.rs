//! Subscriber setup for the `fintran` binary.
//!
//! Library crates only emit `tracing` events; this module decides where they
//! go. Levels used across the workspace:
//!
//! - `warn` (default): validation findings, rejected rows
//! - `info`: one line per pipeline step and per validation run
//! - `debug`: per-validator counts and timings, resolved rule documents
//! - `trace`: cell values
//!
//! `RUST_LOG` wins unless a level was chosen on the command line.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::{LogFormatArg, LogLevelArg};

const FINTRAN_TARGETS: [&str; 6] = [
    "fintran",
    "fintran_cli",
    "fintran_core",
    "fintran_ingest",
    "fintran_model",
    "fintran_validate",
];

type FilteredRegistry = Layered<EnvFilter, Registry>;
type OutputLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level applied to the fintran targets.
    pub level: LevelFilter,
    /// Let `RUST_LOG` replace the default directives.
    pub use_env_filter: bool,
    pub with_timestamps: bool,
    pub with_target: bool,
    /// Emit span close events (JSON only).
    pub with_spans: bool,
    pub with_ansi: bool,
    pub format: LogFormat,
    /// Append to this file instead of writing to stderr.
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
            use_env_filter: true,
            with_timestamps: false,
            with_target: false,
            with_spans: true,
            with_ansi: true,
            format: LogFormat::default(),
            log_file: None,
        }
    }
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => Self::ERROR,
            LogLevelArg::Warn => Self::WARN,
            LogLevelArg::Info => Self::INFO,
            LogLevelArg::Debug => Self::DEBUG,
            LogLevelArg::Trace => Self::TRACE,
        }
    }
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails when the log file cannot be opened or a subscriber is already set.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    let writer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Arc::new(file))
        }
        None => BoxMakeWriter::new(io::stderr),
    };
    init_logging_with_writer(config, writer)
}

/// Installs the global subscriber writing to `writer`.
pub fn init_logging_with_writer(config: &LogConfig, writer: BoxMakeWriter) -> io::Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(output_layer(config, writer))
        .try_init()
        .map_err(io::Error::other)
}

fn output_layer(config: &LogConfig, writer: BoxMakeWriter) -> OutputLayer {
    match config.format {
        LogFormat::Json => {
            let spans = if config.with_spans {
                FmtSpan::CLOSE
            } else {
                FmtSpan::NONE
            };
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(config.with_target)
                .with_span_events(spans)
                .boxed()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(writer)
                .with_ansi(config.with_ansi)
                .with_target(config.with_target);
            if config.with_timestamps {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            }
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(config.with_ansi)
                .with_target(config.with_target);
            if config.with_timestamps {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            }
        }
    }
}

/// Directives used when `RUST_LOG` is ignored or unset: third-party crates
/// stay at `warn`, the fintran targets follow `level`.
pub fn default_directives(level: LevelFilter) -> String {
    let level = level.to_string().to_lowercase();
    std::iter::once("warn".to_string())
        .chain(
            FINTRAN_TARGETS
                .iter()
                .map(|target| format!("{target}={level}")),
        )
        .collect::<Vec<_>>()
        .join(",")
}

fn env_filter(config: &LogConfig) -> EnvFilter {
    let from_env = config
        .use_env_filter
        .then(|| EnvFilter::try_from_default_env().ok())
        .flatten();
    from_env.unwrap_or_else(|| EnvFilter::new(default_directives(config.level)))
}
