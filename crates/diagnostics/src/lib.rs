//! Logging setup shared by the platetree crates.
//!
//! Every crate logs through the short macros exported here (`info!`,
//! `debug!`, `warn!`, `error!`), which forward to `emit`. Nothing is
//! printed until [`init_diagnostics`] installs a terminal emitter.
//!
//! The level comes from the `PLATETREE_LOG` environment variable:
//! - `off` (default) - no logs
//! - `error`, `warn`, `info` - progressively chattier
//! - `debug` - per-line classification details

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable consulted by [`init_diagnostics`].
pub const LOG_ENV_VAR: &str = "PLATETREE_LOG";

static INIT: Once = Once::new();

/// Map a `PLATETREE_LOG` value to a minimum emit level.
///
/// Returns `Ok(None)` for `off`, and `Err` with the offending value when the
/// setting is not recognised.
pub fn parse_level(value: &str) -> Result<Option<emit::Level>, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" => Ok(None),
        "error" => Ok(Some(emit::Level::Error)),
        "warn" => Ok(Some(emit::Level::Warn)),
        "info" => Ok(Some(emit::Level::Info)),
        "debug" => Ok(Some(emit::Level::Debug)),
        other => Err(other.to_string()),
    }
}

/// Initialize diagnostics based on the `PLATETREE_LOG` environment variable.
///
/// Safe to call more than once; only the first call has an effect.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let setting = std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| "off".to_string());

        let (level, unknown) = match parse_level(&setting) {
            Ok(None) => return,
            Ok(Some(level)) => (level, None),
            Err(value) => (emit::Level::Info, Some(value)),
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        if let Some(value) = unknown {
            emit::warn!("Unknown {var} value {value}, using info", var: LOG_ENV_VAR);
        }

        // The emitter must outlive main; dropping the guard would flush and
        // tear it down.
        std::mem::forget(rt);
    });
}

/// Log basic operations (files read, datasets exported, repairs applied).
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log detailed diagnostics (per-line classification, slot assignments).
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log recoverable conditions (pruned plates, overwritten slots, empty input).
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures that stop a command.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;
