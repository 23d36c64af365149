//! Worker registry
//!
//! This module maps identities to their live worker. Each entry carries a
//! serial number so that a worker can only ever remove its own entry,
//! never one created for the same identity after it.

use crate::worker::{Worker, WorkerError, WorkerFactory};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::debug;

/// A registered worker and the serial of its registration
pub struct WorkerEntry<E> {
	pub serial: u64,
	pub worker: Arc<dyn Worker<E>>,
}

impl<E> Clone for WorkerEntry<E> {
	fn clone(&self) -> Self {
		Self {
			serial: self.serial,
			worker: Arc::clone(&self.worker),
		}
	}
}

impl<E> std::fmt::Debug for WorkerEntry<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WorkerEntry")
			.field("serial", &self.serial)
			.field("identity", &self.worker.identity())
			.finish()
	}
}

/// Identity-keyed registry of live workers
pub struct WorkerRegistry<E> {
	workers: Mutex<HashMap<String, WorkerEntry<E>>>,
	next_serial: AtomicU64,
}

impl<E> Default for WorkerRegistry<E> {
	fn default() -> Self {
		Self {
			workers: Mutex::new(HashMap::new()),
			next_serial: AtomicU64::new(1),
		}
	}
}

impl<E> std::fmt::Debug for WorkerRegistry<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WorkerRegistry").field("workers", &self.len()).finish()
	}
}

impl<E> WorkerRegistry<E> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	fn workers(&self) -> MutexGuard<'_, HashMap<String, WorkerEntry<E>>> {
		self.workers.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Get the live worker for `identity`
	pub fn get(&self, identity: &str) -> Option<WorkerEntry<E>> {
		self.workers().get(identity).cloned()
	}

	/// Get the worker for `identity`, creating it if there is none
	///
	/// Lookup and insertion happen under one lock, so two callers can
	/// never both create a worker for the same identity. The boolean is
	/// `true` when a worker was created.
	pub fn get_or_create(
		self: &Arc<Self>,
		identity: &str,
		factory: &dyn WorkerFactory<E>,
	) -> Result<(WorkerEntry<E>, bool), WorkerError> {
		let mut workers = self.workers();
		if let Some(entry) = workers.get(identity) {
			return Ok((entry.clone(), false));
		}

		let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
		let link = WorkerLink {
			registry: Arc::downgrade(self),
			identity: identity.to_string(),
			serial,
		};
		let entry = WorkerEntry {
			serial,
			worker: factory.create(identity, link)?,
		};
		workers.insert(identity.to_string(), entry.clone());
		debug!("Registered worker {} (serial {})", identity, serial);
		Ok((entry, true))
	}

	/// Remove the entry for `identity` if it is still registration `serial`
	pub fn remove(&self, identity: &str, serial: u64) -> bool {
		let mut workers = self.workers();
		match workers.get(identity) {
			Some(entry) if entry.serial == serial => {
				workers.remove(identity);
				debug!("Unregistered worker {} (serial {})", identity, serial);
				true
			},
			_ => false,
		}
	}

	/// Ask every live worker to exit
	///
	/// The workers are signalled outside the lock.
	pub fn request_exit_all(&self) -> usize {
		let entries: Vec<_> = self.workers().values().cloned().collect();
		for entry in &entries {
			entry.worker.request_exit();
		}
		entries.len()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.workers().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.workers().is_empty()
	}

	/// Identities of all live workers
	#[must_use]
	pub fn identities(&self) -> Vec<String> {
		self.workers().keys().cloned().collect()
	}
}

/// A worker's handle back to the registry that holds it
///
/// The handle is weak: it does not keep the registry alive.
pub struct WorkerLink<E> {
	registry: Weak<WorkerRegistry<E>>,
	identity: String,
	serial: u64,
}

impl<E> Clone for WorkerLink<E> {
	fn clone(&self) -> Self {
		Self {
			registry: Weak::clone(&self.registry),
			identity: self.identity.clone(),
			serial: self.serial,
		}
	}
}

impl<E> std::fmt::Debug for WorkerLink<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WorkerLink")
			.field("identity", &self.identity)
			.field("serial", &self.serial)
			.finish()
	}
}

impl<E> WorkerLink<E> {
	#[must_use]
	pub fn identity(&self) -> &str {
		&self.identity
	}

	#[must_use]
	pub const fn serial(&self) -> u64 {
		self.serial
	}

	/// Remove this worker's entry
	///
	/// Returns `false` if the entry was already gone or the registry has
	/// been dropped.
	pub fn unregister(&self) -> bool {
		self.registry
			.upgrade()
			.is_some_and(|registry| registry.remove(&self.identity, self.serial))
	}
}
