//! Log setup for the `tax-engine` binary.
//!
//! Reports go to stdout, so log lines go to stderr. Each line carries a
//! local timestamp, the level and the source location.

use std::{
    fmt::{self, Display},
    fs::File,
    io::{self, IsTerminal},
    path::Path,
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const CYAN: &str = "\x1b[36m";

fn level_colour(level: Level) -> &'static str {
    match level {
        Level::ERROR => "\x1b[1;31m",
        Level::WARN => "\x1b[1;33m",
        Level::INFO => "\x1b[1;32m",
        Level::DEBUG => "\x1b[1;34m",
        Level::TRACE => "\x1b[1;35m",
    }
}

/// Writes `text` wrapped in `colour` when the writer takes escapes.
fn paint(
    writer: &mut Writer<'_>,
    colour: &str,
    text: impl Display,
) -> fmt::Result {
    if writer.has_ansi_escapes() {
        write!(writer, "{colour}{text}{RESET} ")
    } else {
        write!(writer, "{text} ")
    }
}

/// `<local time> <LEVEL> <module>:<line> <fields>`
struct LocalFmt;

impl<S, N> FormatEvent<S, N> for LocalFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();

        let now = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
        paint(&mut writer, DIM, now)?;
        paint(
            &mut writer,
            level_colour(*meta.level()),
            format_args!("{:>5}", meta.level()),
        )?;
        if let (Some(module), Some(line)) = (meta.module_path().or(meta.file()), meta.line()) {
            paint(&mut writer, CYAN, format_args!("{module}:{line}"))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Builds the level filter. `RUST_LOG` wins over `level`.
fn make_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level '{level}'")),
    }
}

/// Initializes logging. Call once at startup.
///
/// - stderr: coloured when attached to a terminal, plain when redirected.
/// - `log_file`: when given, every record is also appended there, uncoloured.
/// - Level: `level` (normally `info`), overridden by `RUST_LOG`.
pub fn init(
    level: &str,
    log_file: Option<&Path>,
) -> Result<()> {
    let filter = make_filter(level)?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalFmt)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file '{}'", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .event_format(LocalFmt)
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("logging already initialized")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_level_is_reported() {
        // RUST_LOG would mask the level under test
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }

        let err = make_filter("tax_core=loud").unwrap_err();

        assert!(err.to_string().contains("invalid log level"));
    }

    #[test]
    fn plain_levels_are_accepted() {
        for level in ["error", "warn", "info", "debug", "trace", "tax_core=debug"] {
            assert!(make_filter(level).is_ok(), "{level}");
        }
    }
}
