//! Structured logging for FlickTile
//!
//! The event tap fires on every mouse move, so the hot paths log at `trace`
//! and the default filter keeps them quiet. `RUST_LOG` wins over everything
//! configured here.

use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    fmt::{self, time::UtcTime, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// How log lines are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    /// Newline-delimited JSON
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LevelFilter,
    pub format: LogFormat,
    /// Append here instead of writing to stdout
    pub file_path: Option<PathBuf>,
    /// Attach file and line to each event
    pub include_source: bool,
    pub include_thread_names: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Compact,
            file_path: None,
            include_source: false,
            include_thread_names: false,
        }
    }
}

impl LogConfig {
    /// Preset behind `--verbose`
    pub fn development() -> Self {
        Self {
            level: LevelFilter::DEBUG,
            format: LogFormat::Pretty,
            include_source: true,
            include_thread_names: true,
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `FLICKTILE_LOG_{LEVEL,FORMAT,FILE,SOURCE}`. Unparseable values are ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(level) = lookup("FLICKTILE_LOG_LEVEL").and_then(|v| v.parse().ok()) {
            self.level = level;
        }
        if let Some(format) = lookup("FLICKTILE_LOG_FORMAT").and_then(|v| v.parse().ok()) {
            self.format = format;
        }
        if let Some(path) = lookup("FLICKTILE_LOG_FILE") {
            self.file_path = Some(PathBuf::from(path));
        }
        if let Some(source) = lookup("FLICKTILE_LOG_SOURCE") {
            self.include_source = matches!(source.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("flicktile={}", self.level)))
    }

    fn layer<W>(&self, writer: W) -> BoxedLayer
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let layer = fmt::layer()
            .with_writer(writer)
            .with_timer(UtcTime::rfc_3339())
            .with_file(self.include_source)
            .with_line_number(self.include_source)
            .with_thread_names(self.include_thread_names);

        match self.format {
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Json => layer.json().boxed(),
        }
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let output = match &config.file_path {
        Some(path) => {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            config.layer(std::sync::Mutex::new(file))
        }
        None => config.layer(std::io::stdout),
    };

    tracing_subscriber::registry()
        .with(output.with_filter(config.filter()))
        .try_init()?;

    info!(level = %config.level, format = ?config.format, "Logging initialized");
    Ok(())
}
