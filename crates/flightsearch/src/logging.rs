//! Diagnostics for flightsearch.
//!
//! Events go to stderr so that suggestion tables and JSON on stdout can be
//! piped. The crate's own events follow the CLI verbosity; everything else
//! is limited to errors. `FLIGHTSEARCH_LOG`, then `RUST_LOG`, replace the
//! derived filter entirely when set to a valid directive list.

use std::io::IsTerminal;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "FLIGHTSEARCH_LOG";

/// How much the crate reports about store access and session transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Warnings, such as a failed favorites refresh.
    #[default]
    Normal,
    /// Session transitions and store writes.
    Verbose,
    /// Every catalog query.
    Trace,
}

impl Verbosity {
    /// Map the `-q` and repeated `-v` flags. `-q` wins.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    fn level(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "debug",
            Self::Trace => "trace",
        }
    }

    /// Filter directives used when no environment override is present.
    #[must_use]
    pub fn directives(self) -> String {
        format!("error,flightsearch={}", self.level())
    }
}

/// Build the event filter from an optional override.
///
/// An override that fails to parse is reported on stderr and ignored.
fn build_filter(verbosity: Verbosity, overridden: Option<&str>) -> EnvFilter {
    if let Some(directives) = overridden.filter(|d| !d.trim().is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("flightsearch: ignoring log filter {directives:?}: {e}"),
        }
    }
    EnvFilter::new(verbosity.directives())
}

fn env_override() -> Option<String> {
    std::env::var(LOG_ENV)
        .or_else(|_| std::env::var(EnvFilter::DEFAULT_ENV))
        .ok()
}

/// Install the global subscriber.
///
/// Call once from `main`. Later calls, and calls after another subscriber
/// was installed, leave the existing one in place.
///
/// # Examples
///
/// ```no_run
/// use flightsearch::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(1, false));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let filter = build_filter(verbosity, env_override().as_deref());
    let stderr = std::io::stderr();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(stderr.is_terminal())
                .with_writer(std::io::stderr)
                .with_target(verbosity == Verbosity::Trace)
                .without_time(),
        )
        .try_init();
}

/// Warnings and errors only, captured by the test harness.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(filter: &EnvFilter) -> String {
        filter.to_string().to_lowercase()
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(Verbosity::from_flags(0, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(1, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(2, false), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(7, false), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(0, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(2, true), Verbosity::Quiet);
    }

    #[test]
    fn test_directives_scope_level_to_crate() {
        assert_eq!(Verbosity::Quiet.directives(), "error,flightsearch=error");
        assert_eq!(Verbosity::default().directives(), "error,flightsearch=warn");
        assert_eq!(Verbosity::Verbose.directives(), "error,flightsearch=debug");
        assert_eq!(Verbosity::Trace.directives(), "error,flightsearch=trace");
    }

    #[test]
    fn test_filter_without_override_uses_verbosity() {
        let filter = build_filter(Verbosity::Verbose, None);
        assert!(rendered(&filter).contains("flightsearch=debug"));
    }

    #[test]
    fn test_filter_override_replaces_verbosity() {
        let filter = build_filter(Verbosity::Quiet, Some("flightsearch::session=trace"));
        let text = rendered(&filter);

        assert!(text.contains("flightsearch::session=trace"));
        assert!(!text.contains("flightsearch=error"));
    }

    #[test]
    fn test_blank_or_invalid_override_is_ignored() {
        let blank = build_filter(Verbosity::Normal, Some("  "));
        assert!(rendered(&blank).contains("flightsearch=warn"));

        let invalid = build_filter(Verbosity::Normal, Some("flightsearch=loud"));
        assert!(rendered(&invalid).contains("flightsearch=warn"));
    }

    #[test]
    fn test_init_logging_is_repeatable() {
        init_logging(Verbosity::Quiet);
        init_logging(Verbosity::Trace);
        init_test_logging();
    }
}
