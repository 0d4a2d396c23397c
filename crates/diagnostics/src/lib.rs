//! Structured logging for the ingest workspace
//!
//! Every crate logs through the macros exported here so that a single
//! environment variable controls verbosity for the whole process.
//!
//! Usage:
//! - Set INGEST_LOG=off (default) - no logs
//! - Set INGEST_LOG=info - one line per handled object
//! - Set INGEST_LOG=debug - batch previews, store registration, write options

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable consulted by [`init_diagnostics`]
pub const LOG_ENV_VAR: &str = "INGEST_LOG";

static INIT: Once = Once::new();

/// Verbosity requested through `INGEST_LOG`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSetting {
    Off,
    Level(emit::Level),
    /// Unrecognised value; treated as `info`
    Unknown,
}

/// Map an `INGEST_LOG` value onto a [`LogSetting`]
#[must_use]
pub fn parse_log_setting(value: &str) -> LogSetting {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" => LogSetting::Off,
        "debug" => LogSetting::Level(emit::Level::Debug),
        "info" => LogSetting::Level(emit::Level::Info),
        "warn" => LogSetting::Level(emit::Level::Warn),
        "error" => LogSetting::Level(emit::Level::Error),
        _ => LogSetting::Unknown,
    }
}

/// Initialize diagnostics based on the INGEST_LOG environment variable
///
/// Safe to call more than once; only the first call installs the emitter.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let raw = std::env::var(LOG_ENV_VAR).unwrap_or_default();

        let level = match parse_log_setting(&raw) {
            LogSetting::Off => return,
            LogSetting::Level(level) => level,
            LogSetting::Unknown => {
                // Bootstrap warning, the emitter is not installed yet
                eprintln!("Warning: Unknown {LOG_ENV_VAR} value '{raw}', using 'info'");
                emit::Level::Info
            }
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        // The runtime must outlive every emitting thread, including the tokio workers.
        std::mem::forget(rt);
    });
}

/// Log basic operations (objects handled, tables appended)
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log detailed diagnostics (batch previews, resolved locations, storage options)
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log conditions that do not stop the invocation
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures that abort the invocation
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

// Long-form names, matching the `log_*` spelling used by callers elsewhere

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::debug!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::error!($($arg)*)
    };
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;
