#![deny(missing_docs)]
//! Shared logging utilities for the Knock Knock workspace.
//!
//! This crate provides the `knock_*` logging macros used across the codebase,
//! a minimal test initializer for the global logger, and a helper for keeping
//! bearer credentials out of log output.

/// Number of leading characters of a credential that may appear in logs.
const REDACT_VISIBLE: usize = 4;

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! knock_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! knock_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! knock_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! knock_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! knock_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Renders a bearer token in a form that is safe to write to a log.
///
/// Only the first few characters survive; short tokens are hidden entirely.
pub fn redact_token(token: &str) -> String {
    let visible: String = token.chars().take(REDACT_VISIBLE).collect();
    if token.chars().count() <= REDACT_VISIBLE {
        "…".to_string()
    } else {
        format!("{visible}…")
    }
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::redact_token;

    #[test]
    fn redact_keeps_only_a_short_prefix() {
        assert_eq!(redact_token("eyJhbGciOiJIUzI1NiJ9.payload"), "eyJh…");
    }

    #[test]
    fn redact_hides_short_tokens_entirely() {
        assert_eq!(redact_token("abcd"), "…");
        assert_eq!(redact_token(""), "…");
    }
}
