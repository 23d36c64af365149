//! Logging setup
//!
//! Routing, worker lifecycle and decode diagnostics all go through
//! `tracing`. This module installs the subscriber that prints them.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Environment variable that raises the default level to debug
pub const DEBUG_ENV: &str = "SYSWATCH_DEBUG";

fn default_filter() -> EnvFilter {
	if std::env::var_os(DEBUG_ENV).is_some() {
		EnvFilter::new("syswatch=debug")
	} else {
		EnvFilter::new("syswatch=warn")
	}
}

/// Initialize the tracing system
///
/// This function sets up tracing with an `EnvFilter` that:
/// - Honors the `RUST_LOG` environment variable if set
/// - Falls back to debug output for this crate when `SYSWATCH_DEBUG` is set
/// - Only logs warnings and errors otherwise
///
/// Calling it again is a no-op, and so is calling it after another global
/// subscriber has been installed.
pub fn init_logging() {
	INIT.call_once(|| {
		let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter());

		let _ = tracing_subscriber::registry()
			.with(fmt::layer().with_target(true).with_thread_names(true))
			.with(filter)
			.try_init();
	});
}

/// Get the most verbose level currently enabled, as a string
#[must_use]
pub fn log_level() -> &'static str {
	if tracing::level_enabled!(tracing::Level::TRACE) {
		"trace"
	} else if tracing::level_enabled!(tracing::Level::DEBUG) {
		"debug"
	} else if tracing::level_enabled!(tracing::Level::INFO) {
		"info"
	} else if tracing::level_enabled!(tracing::Level::WARN) {
		"warn"
	} else if tracing::level_enabled!(tracing::Level::ERROR) {
		"error"
	} else {
		"off"
	}
}
