//! Tracing setup for the wizard.
//!
//! Log records go to stderr so they never interleave with the rendered
//! wizard on stdout. A log file can be attached at any time, and the
//! filter can be swapped while running with [`set_log_level`].

use std::{
    fs::File,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};

use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

use crate::config::LoggingConfig;

pub const DEFAULT_FILTER: &str = "info,tax_wizard=debug";

/// Local-time event format: `time LEVEL file:line fields`.
struct WizardFormat;

impl<S, N> FormatEvent<S, N> for WizardFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();
        let timestamp = Local::now().format("%H:%M:%S%.3f");

        if ansi {
            let colour = match *meta.level() {
                Level::ERROR => "31",
                Level::WARN => "33",
                Level::INFO => "32",
                Level::DEBUG => "34",
                Level::TRACE => "35",
            };
            write!(writer, "\x1b[2m{timestamp}\x1b[0m \x1b[1;{colour}m{:>5}\x1b[0m ", meta.level())?;
        } else {
            write!(writer, "{timestamp} {:>5} ", meta.level())?;
        }

        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            let file = file.rsplit(['/', '\\']).next().unwrap_or(file);
            write!(writer, "{file}:{line} ")?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

type SharedFile = Arc<Mutex<Option<File>>>;

/// Writer target that discards output until a file is attached.
#[derive(Clone)]
struct LogFile(SharedFile);

struct LogFileWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for LogFileWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        match self.0.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.0.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileWriter(self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

type ReloadFn = Box<dyn Fn(EnvFilter) -> Result<()> + Send + Sync>;

static RELOAD_FILTER: OnceLock<ReloadFn> = OnceLock::new();
static LOG_FILE: OnceLock<SharedFile> = OnceLock::new();

fn initial_filter(level: Option<&str>) -> EnvFilter {
    if let Some(level) = level {
        match EnvFilter::try_new(level) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("ignoring invalid log level '{level}': {e}"),
        }
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Later calls are no-ops.
///
/// The level comes from `config.level`, then `RUST_LOG`, then
/// [`DEFAULT_FILTER`]. When `config.file` is set it is opened for append.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let file: SharedFile = Arc::new(Mutex::new(None));
    let (filter, handle) = reload::Layer::new(initial_filter(config.level.as_deref()));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(WizardFormat)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(WizardFormat)
        .with_ansi(false)
        .with_writer(LogFile(file.clone()));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        let _ = LOG_FILE.set(file);
        let _ = RELOAD_FILTER.set(Box::new(move |filter| {
            handle
                .reload(filter)
                .map_err(|e| anyhow!("filter reload failed: {e}"))
        }));
    }

    if let Some(path) = &config.file {
        enable_file_logging(path)?;
    }
    Ok(())
}

/// Replaces the active filter. Accepts a bare level or any `EnvFilter`
/// directive, e.g. `warn,tax_wizard::tasks=trace`.
pub fn set_log_level(filter: &str) -> Result<()> {
    let parsed = EnvFilter::try_new(filter).map_err(|e| anyhow!("invalid log filter '{filter}': {e}"))?;
    match RELOAD_FILTER.get() {
        Some(reload) => reload(parsed),
        None => bail!("logging not yet initialized"),
    }
}

/// Appends log records to `path`, replacing any file already attached.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))?;

    let Some(slot) = LOG_FILE.get() else {
        bail!("logging not yet initialized");
    };
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(file);
    Ok(())
}
