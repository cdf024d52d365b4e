#![deny(missing_docs)]
//! Shared logging utilities for the portal workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every line is
//! prefixed with the current page generation so requests from a page that
//! has since been reloaded are easy to tell apart.

use std::sync::atomic::{AtomicU32, Ordering};

static PAGE_GENERATION: AtomicU32 = AtomicU32::new(0);

/// Records the generation of the page currently shown.
/// The driver calls this after every reload.
pub fn set_page_generation(generation: u32) {
    PAGE_GENERATION.store(generation, Ordering::Relaxed);
}

/// Returns the generation of the page currently shown (0 before any reload).
pub fn page_generation() -> u32 {
    PAGE_GENERATION.load(Ordering::Relaxed)
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("[page {}] {}", $crate::page_generation(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("[page {}] {}", $crate::page_generation(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("[page {}] {}", $crate::page_generation(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("[page {}] {}", $crate::page_generation(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("[page {}] {}", $crate::page_generation(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

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
    use super::*;

    #[test]
    fn generation_round_trips_and_macros_expand() {
        initialize_for_tests();
        set_page_generation(3);
        assert_eq!(page_generation(), 3);
        engine_info!("request {} settled", 7);
        engine_debug!("plain message");
        set_page_generation(0);
    }
}
