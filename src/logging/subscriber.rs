//! Tracing subscriber setup: console formatter, run log layer, and initialisation.
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use super::utils::{HEADER_STAMP, LINE_STAMP, log_file_path, strip_ansi, utc_stamp};

pub(super) const STAGE_TARGET: &str = "warden::stage";
pub(super) const DRY_RUN_TARGET: &str = "warden::dry_run";

/// What a log event means to a reconcile run, independent of rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Stage,
    Simulated,
    Failure,
    Warning,
    Detail,
    Progress,
}

impl EventKind {
    fn of(event: &tracing::Event<'_>) -> Self {
        let metadata = event.metadata();
        match (*metadata.level(), metadata.target()) {
            (tracing::Level::ERROR, _) => Self::Failure,
            (tracing::Level::WARN, _) => Self::Warning,
            (tracing::Level::INFO, STAGE_TARGET) => Self::Stage,
            (tracing::Level::INFO, DRY_RUN_TARGET) => Self::Simulated,
            (tracing::Level::INFO, _) => Self::Progress,
            _ => Self::Detail,
        }
    }

    /// Tag written in front of the message in the run log.
    const fn tag(self) -> &'static str {
        match self {
            Self::Stage => "==>",
            Self::Simulated => "[dry run]",
            Self::Failure => "[error]",
            Self::Warning => "[warn]",
            Self::Detail => "[debug]",
            Self::Progress => "",
        }
    }
}

/// Pulls the `message` field out of an event.
#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl MessageExtractor {
    fn message(event: &tracing::Event<'_>) -> String {
        let mut extractor = Self::default();
        event.record(&mut extractor);
        extractor.message
    }
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

/// Layer that records one reconcile run per file: a header naming the
/// command, then every event down to `DEBUG` with ANSI codes stripped.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Open the run log for `command` under the warden cache directory.
    ///
    /// Returns `None` if the directory or the file cannot be created; the
    /// run then logs to the console only.
    pub(super) fn new(command: &str) -> Option<Self> {
        Self::at(&log_file_path(command)?, command)
    }

    /// Truncate `path` and start a run log for `command` there.
    pub(super) fn at(path: &Path, command: &str) -> Option<Self> {
        let version = option_env!("WARDEN_BUILD_VERSION")
            .unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let cwd = std::env::current_dir()
            .map(|d| d.display().to_string())
            .unwrap_or_default();
        let header = format!(
            "# warden {version}: `{command}` started {} UTC\n# cwd: {cwd}\n",
            utc_stamp(HEADER_STAMP),
        );
        fs::write(path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let msg = strip_ansi(&MessageExtractor::message(event));
        let tag = EventKind::of(event).tag();
        let ts = utc_stamp(LINE_STAMP);
        let line = if tag.is_empty() {
            format!("{ts} {msg}")
        } else {
            format!("{ts} {tag} {msg}")
        };

        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

/// Console formatter: stages stand out, simulated actions are marked, and
/// detail lines are dimmed.
struct WardenFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for WardenFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let msg = MessageExtractor::message(event);
        match EventKind::of(event) {
            EventKind::Failure => writeln!(writer, "\x1b[31mwarden: error:\x1b[0m {msg}"),
            EventKind::Warning => writeln!(writer, "\x1b[33mwarden: warning:\x1b[0m {msg}"),
            EventKind::Stage => writeln!(writer, "\x1b[1;36m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            EventKind::Simulated => writeln!(writer, "  \x1b[36m(dry run)\x1b[0m {msg}"),
            EventKind::Progress => writeln!(writer, "  {msg}"),
            EventKind::Detail => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Initialise the global [`tracing`] subscriber for one `command`.
///
/// Console output goes to stdout (info and below) and stderr (warnings and
/// errors); `RUST_LOG` overrides the console level.  Every event including
/// `debug` is also written to the command's run log.
/// Must be called once at program startup, before any logging.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let console_filter = EnvFilter::builder()
        .with_default_directive(console_level.into())
        .from_env_lossy();

    let make_writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));

    let console_layer = fmt::layer()
        .event_format(WardenFormatter)
        .with_writer(make_writer)
        .with_filter(console_filter);

    let file_layer = FileLayer::new(command).map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}
