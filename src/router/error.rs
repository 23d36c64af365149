//! Error types for the router
//!
//! This module contains error types and a result type for the router.

use std::io;
use thiserror::Error;

/// Result type for router operations
pub type Result<T> = std::result::Result<T, RouterError>;

/// Error type for router operations
#[derive(Debug, Error)]
pub enum RouterError {
	/// Another thread is already running the dispatch loop
	#[error("The router dispatch loop is already running")]
	AlreadyRunning,

	/// The dispatch loop has been stopped and cannot be restarted
	#[error("The router has been stopped")]
	Stopped,

	/// Workers were still registered when the shutdown grace period ended
	#[error("{0} workers still registered after shutdown")]
	WorkersAlive(usize),

	/// The configuration cannot be used
	#[error("Invalid router configuration: {0}")]
	InvalidConfig(String),

	/// An I/O error occurred
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),

	/// Other error
	#[error("{0}")]
	Other(String),
}

impl From<&str> for RouterError {
	fn from(s: &str) -> Self {
		Self::Other(s.to_string())
	}
}

impl From<String> for RouterError {
	fn from(s: String) -> Self {
		Self::Other(s)
	}
}

/// Why an event could not be queued; the event is handed back
#[derive(Debug, Error)]
pub enum SubmitError<E> {
	/// The inbound queue is at capacity
	#[error("The router queue is full")]
	Full(E),

	/// The dispatch loop has stopped
	#[error("The router has been stopped")]
	Closed(E),
}

impl<E> SubmitError<E> {
	/// Take back the rejected event
	pub fn into_event(self) -> E {
		match self {
			Self::Full(e) | Self::Closed(e) => e,
		}
	}
}
