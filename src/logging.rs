//! Named, leveled loggers that fan each message out to a set of sinks.
//!
//! Loggers are owned by an explicit [`Registry`] rather than a process-wide
//! table. Every sink is an [`env_logger::Logger`] that is built but never
//! installed as the global logger, so several loggers can coexist and be
//! reconfigured independently.

use anyhow::{Context, Result};
use chrono::Local;
use env_logger::{Target, WriteStyle, fmt::Formatter};
use log::{Level, LevelFilter, Log, Record};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt::{self, Display},
    fs::{self, OpenOptions},
    io::{self, Write},
    path::Path,
    sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Name of the logger handed out by [`Registry::configure`].
pub const LOGGER_NAME: &str = "Aplicacao";

/// Timestamp layout shared by every sink.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Ordered message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[serde(alias = "trace")]
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Level used for the record handed to `env_logger`.
    ///
    /// `log` has no critical level, so critical messages travel as errors.
    /// The severity label in the formatted line stays exact.
    pub fn level(self) -> Level {
        match self {
            Severity::Debug => Level::Debug,
            Severity::Info => Level::Info,
            Severity::Warning => Level::Warn,
            Severity::Error | Severity::Critical => Level::Error,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// In-memory sink target whose contents can be inspected afterwards.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full formatted lines written so far.
    pub fn lines(&self) -> Vec<String> {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_owned)
            .collect()
    }

    /// Message part of every line, without timestamp, name and severity.
    pub fn messages(&self) -> Vec<String> {
        self.lines()
            .iter()
            .filter_map(|line| line.splitn(4, " - ").nth(3))
            .map(str::to_owned)
            .collect()
    }
}

impl Write for Capture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Destination for formatted log lines.
pub struct Sink {
    inner: env_logger::Logger,
}

impl Sink {
    /// Sink writing to standard error.
    pub fn console() -> Self {
        Self::with_target(Target::Stderr)
    }

    /// Sink appending to `file`, creating it and its parent directories if needed.
    pub fn file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        if let Some(dir) = file.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("failed to create {dir:?}"))?;
        }
        let handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
            .with_context(|| format!("failed to open {file:?}"))?;
        Ok(Self::with_target(Target::Pipe(Box::new(handle))))
    }

    /// Sink writing into `capture`.
    pub fn capture(capture: Capture) -> Self {
        Self::with_target(Target::Pipe(Box::new(capture)))
    }

    fn with_target(target: Target) -> Self {
        // Lines arrive fully formatted; filtering happens in `Logger`.
        let inner = env_logger::Builder::new()
            .filter_level(LevelFilter::Trace)
            .write_style(WriteStyle::Never)
            .format(|buf: &mut Formatter, record: &Record<'_>| {
                writeln!(buf, "{}", record.args())
            })
            .target(target)
            .build();
        Self { inner }
    }

    fn write(&self, level: Level, target: &str, line: &str) {
        self.inner.log(
            &Record::builder()
                .args(format_args!("{line}"))
                .level(level)
                .target(target)
                .build(),
        );
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

struct LoggerState {
    min_severity: Severity,
    sinks: Vec<Sink>,
}

/// Named logger delivering messages at or above its minimum severity to every attached sink.
pub struct Logger {
    name: String,
    state: RwLock<LoggerState>,
}

impl Logger {
    /// Create a logger with no sinks attached.
    pub fn new(name: &str, min_severity: Severity) -> Self {
        Self {
            name: name.to_owned(),
            state: RwLock::new(LoggerState {
                min_severity,
                sinks: Vec::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_severity(&self) -> Severity {
        self.read_state().min_severity
    }

    pub fn sink_count(&self) -> usize {
        self.read_state().sinks.len()
    }

    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.min_severity()
    }

    /// Add a sink next to the ones already attached.
    pub fn attach(&self, sink: Sink) {
        self.write_state().sinks.push(sink);
    }

    /// Flush and drop every sink, then install `sinks` with a new minimum severity.
    pub fn reset(&self, min_severity: Severity, sinks: Vec<Sink>) {
        let mut state = self.write_state();
        for sink in &state.sinks {
            sink.flush();
        }
        state.min_severity = min_severity;
        state.sinks = sinks;
    }

    pub fn log(&self, severity: Severity, message: impl Display) {
        let state = self.read_state();
        if severity < state.min_severity || state.sinks.is_empty() {
            return;
        }

        let line = format!(
            "{} - {} - {} - {}",
            Local::now().format(TIMESTAMP_FORMAT),
            self.name,
            severity,
            message
        );
        for sink in &state.sinks {
            sink.write(severity.level(), &self.name, &line);
        }
    }

    pub fn debug(&self, message: impl Display) {
        self.log(Severity::Debug, message);
    }

    pub fn info(&self, message: impl Display) {
        self.log(Severity::Info, message);
    }

    pub fn warning(&self, message: impl Display) {
        self.log(Severity::Warning, message);
    }

    pub fn error(&self, message: impl Display) {
        self.log(Severity::Error, message);
    }

    pub fn critical(&self, message: impl Display) {
        self.log(Severity::Critical, message);
    }

    pub fn flush(&self) {
        for sink in &self.read_state().sinks {
            sink.flush();
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, LoggerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, LoggerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owner of every named logger in the process.
///
/// Dropping the registry flushes all of its loggers.
#[derive(Default)]
pub struct Registry {
    loggers: HashMap<String, Arc<Logger>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the [`LOGGER_NAME`] logger. See [`Registry::configure_named`].
    pub fn configure<P: AsRef<Path>>(
        &mut self,
        sink_path: P,
        min_severity: Severity,
    ) -> Result<Arc<Logger>> {
        self.configure_named(LOGGER_NAME, sink_path, min_severity)
    }

    /// Configure the logger called `name` with a console sink and a file sink at `sink_path`.
    ///
    /// Any sinks from an earlier configuration are dropped first, so calling this
    /// repeatedly never duplicates output. Handles returned earlier for the same
    /// name see the new sinks.
    ///
    /// # Errors
    /// Returns an error if the log file or its directory cannot be created.
    /// The logger keeps its previous sinks in that case.
    pub fn configure_named<P: AsRef<Path>>(
        &mut self,
        name: &str,
        sink_path: P,
        min_severity: Severity,
    ) -> Result<Arc<Logger>> {
        let file_sink = Sink::file(sink_path).context("failed to construct file sink")?;

        let logger = Arc::clone(
            self.loggers
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(Logger::new(name, min_severity))),
        );
        logger.reset(min_severity, vec![Sink::console(), file_sink]);

        Ok(logger)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Logger>> {
        self.loggers.get(name).cloned()
    }

    /// Detach every sink from the logger called `name` and forget it.
    ///
    /// Outstanding handles stay valid but no longer deliver anything.
    pub fn remove(&mut self, name: &str) -> Option<Arc<Logger>> {
        let logger = self.loggers.remove(name)?;
        logger.reset(logger.min_severity(), Vec::new());
        Some(logger)
    }

    pub fn flush(&self) {
        for logger in self.loggers.values() {
            logger.flush();
        }
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.flush();
    }
}
