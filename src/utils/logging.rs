//! Tagged, switchable logging macros for background workers.
//!
//! The cadence loop and the capture/upload providers log a lot of per-cycle
//! detail. Each module that uses these macros declares two constants:
//!
//! ```rust,ignore
//! const ENABLE_LOGS: bool = true;
//! const LOG_TAG: &str = "cadence";
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("cycle finished for session {}", session_id);
//! // => "[cadence] cycle finished for session abc"
//! ```
//!
//! Flipping `ENABLE_LOGS` to `false` silences the module without touching
//! the global `RUST_LOG` filter.

#[macro_export]
macro_rules! log_debug {
    ($fmt:literal $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!(concat!("[{}] ", $fmt), LOG_TAG $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($fmt:literal $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!(concat!("[{}] ", $fmt), LOG_TAG $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($fmt:literal $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!(concat!("[{}] ", $fmt), LOG_TAG $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($fmt:literal $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!(concat!("[{}] ", $fmt), LOG_TAG $($arg)*);
        }
    };
}
