//! Per-identity workers
//!
//! This module contains the `Worker` trait the router forwards events to,
//! the identity-keyed registry of live workers, and a thread-backed
//! worker implementation.

mod registry;
mod threaded;

pub use registry::{WorkerEntry, WorkerLink, WorkerRegistry};
pub use threaded::{EventSink, EventWorker, EventWorkerFactory, LogSink, WorkerConfig};

use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Why a worker refused an event; the event is handed back
#[derive(Debug, Error)]
pub enum AcceptError<E> {
	/// The worker has stopped taking events and is shutting down
	#[error("worker has retired")]
	Retired(E),

	/// The worker's queue is full
	#[error("worker queue is full")]
	Full(E),

	/// The worker's queue is gone
	#[error("worker queue is disconnected")]
	Disconnected(E),
}

impl<E> AcceptError<E> {
	/// Take back the rejected event
	pub fn into_event(self) -> E {
		match self {
			Self::Retired(e) | Self::Full(e) | Self::Disconnected(e) => e,
		}
	}
}

/// Error type for creating workers
#[derive(Debug, Error)]
pub enum WorkerError {
	/// The worker thread could not be started
	#[error("failed to spawn worker thread: {0}")]
	Spawn(#[from] io::Error),

	/// The worker configuration cannot be used
	#[error("invalid worker configuration: {0}")]
	InvalidConfig(String),

	/// Other error
	#[error("{0}")]
	Other(String),
}

impl From<&str> for WorkerError {
	fn from(s: &str) -> Self {
		Self::Other(s.to_string())
	}
}

impl From<String> for WorkerError {
	fn from(s: String) -> Self {
		Self::Other(s)
	}
}

/// Trait for consumers of one identity's event stream
pub trait Worker<E>: Send + Sync {
	/// Identity this worker was created for
	fn identity(&self) -> &str;

	/// Queue an event
	///
	/// This must not block. Events accepted by one worker are processed in
	/// the order they were accepted.
	fn accept(&self, event: E) -> Result<(), AcceptError<E>>;

	/// Ask the worker to finish
	///
	/// The worker observes this from its own loop and unregisters itself
	/// through its [`WorkerLink`] when it stops. A worker must also
	/// unregister if its thread dies.
	fn request_exit(&self);

	/// Whether [`request_exit`](Self::request_exit) has been called
	fn exit_requested(&self) -> bool;
}

/// Trait for creating a worker the first time an identity is seen
pub trait WorkerFactory<E>: Send + Sync {
	/// Check the factory can create workers, before any is needed
	fn validate(&self) -> Result<(), WorkerError> {
		Ok(())
	}

	/// Create a worker for `identity`
	///
	/// `link` is the worker's way back to the registry.
	fn create(&self, identity: &str, link: WorkerLink<E>) -> Result<Arc<dyn Worker<E>>, WorkerError>;
}

impl<E, F> WorkerFactory<E> for F
where
	F: Fn(&str, WorkerLink<E>) -> Result<Arc<dyn Worker<E>>, WorkerError> + Send + Sync,
{
	fn create(&self, identity: &str, link: WorkerLink<E>) -> Result<Arc<dyn Worker<E>>, WorkerError> {
		self(identity, link)
	}
}
