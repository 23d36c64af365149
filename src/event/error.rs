//! Error types for event parsing
//!
//! This module contains error types and a result type for turning raw
//! collector records into events.

use thiserror::Error;

/// Result type for event operations
pub type Result<T> = std::result::Result<T, EventError>;

/// Error type for event operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
	/// The record is shorter than the common context header
	#[error("context header needs {need} bytes, record has {len}")]
	ContextTooShort { len: usize, need: usize },

	/// The record body is shorter than its fixed header
	#[error("event body needs {need} bytes, got {len}")]
	BodyTooShort { len: usize, need: usize },

	/// The context has not been parsed yet
	#[error("event context has not been parsed")]
	ContextMissing,

	/// The syscall phase field is neither entry nor exit
	#[error("unknown syscall phase {0}")]
	UnknownPhase(u32),

	/// Other error
	#[error("{0}")]
	Other(String),
}

impl From<&str> for EventError {
	fn from(s: &str) -> Self {
		Self::Other(s.to_string())
	}
}

impl From<String> for EventError {
	fn from(s: String) -> Self {
		Self::Other(s)
	}
}
