//! File logging for the agent: `<data_dir>/logs/agent.log`.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEFAULT_FILTER: &str = "info,tower_http=warn,hyper=warn";
const LOG_FILE: &str = "agent.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        }
    }
}

/// Logging knobs read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub filter: String,
    pub format: LogFormat,
    pub truncate: bool,
    pub run_id: String,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let filter = lookup("XENEON_AGENT_LOG_FILTER")
            .or_else(|| lookup("RUST_LOG"))
            .filter(|f| EnvFilter::try_new(f).is_ok())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        Self {
            filter,
            format: LogFormat::parse(lookup("XENEON_AGENT_LOG_FORMAT").as_deref()),
            truncate: lookup("XENEON_AGENT_TRUNCATE_LOG_ON_START").as_deref() == Some("1"),
            run_id: lookup("XENEON_AGENT_RUN_ID")
                .unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
        }
    }
}

pub struct LoggingHandle {
    pub run_id: String,
    pub log_path: PathBuf,
    pub guard: WorkerGuard,
}

pub fn init_logging(log_dir: &Path) -> anyhow::Result<LoggingHandle> {
    let settings = LogSettings::from_env();
    std::fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(LOG_FILE);

    if settings.truncate {
        std::fs::File::create(&log_path)?;
    }

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILE));
    let registry = tracing_subscriber::registry().with(EnvFilter::new(&settings.filter));

    match settings.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .pretty()
                    .with_target(true),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .json()
                    .flatten_event(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_current_span(true),
            )
            .init(),
    }

    tracing::info!(
        component = "logging",
        event = "logging.initialized",
        log_path = %log_path.display(),
        format = settings.format.as_str(),
        filter = %settings.filter,
        run_id = %settings.run_id,
    );

    Ok(LoggingHandle {
        run_id: settings.run_id,
        log_path,
        guard,
    })
}
