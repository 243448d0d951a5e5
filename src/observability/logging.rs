//! Tracing subscriber setup.
//!
//! Logs always go to stderr so that `run --snapshot-every` can stream
//! snapshots on stdout. `COLLAPSE_LOG_LEVEL` takes any `EnvFilter`
//! directive (e.g. `collapse::engine=debug`) and replaces the level
//! chosen by `-v`.

use std::io::IsTerminal;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::args::{ColorChoice, LogFormat};

/// Environment variable holding a filter directive.
pub const LOG_LEVEL_ENV: &str = "COLLAPSE_LOG_LEVEL";

/// Level enabled by `verbosity` repetitions of `-v`.
#[must_use]
pub const fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Whether stderr output should carry ANSI colors.
fn ansi_enabled(color: ColorChoice) -> bool {
    match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => {
            std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal()
        }
    }
}

/// Installs the global subscriber.
///
/// Module targets are shown from `-vv` up. A subscriber installed earlier
/// (tests, embedding applications) is left in place.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_for(verbosity).into())
        .with_env_var(LOG_LEVEL_ENV)
        .from_env_lossy();
    let targets = verbosity >= 2;

    let output: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Human => fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(ansi_enabled(color))
            .with_target(targets)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(targets)
            .boxed(),
    };

    if tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_saturates_at_trace() {
        assert_eq!(level_for(0), LevelFilter::WARN);
        assert_eq!(level_for(1), LevelFilter::INFO);
        assert_eq!(level_for(2), LevelFilter::DEBUG);
        assert_eq!(level_for(3), LevelFilter::TRACE);
        assert_eq!(level_for(u8::MAX), LevelFilter::TRACE);
    }

    #[test]
    fn explicit_color_choice_ignores_terminal() {
        assert!(ansi_enabled(ColorChoice::Always));
        assert!(!ansi_enabled(ColorChoice::Never));
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logging(LogFormat::Json, 3, ColorChoice::Never);
        init_logging(LogFormat::Human, 0, ColorChoice::Auto);
    }
}
