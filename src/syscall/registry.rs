//! Watch-point registry
//!
//! Descriptors are indexed both by name and by syscall number. The
//! process-wide registry is built from the static table on first access
//! and is read-only from then on.

use crate::syscall::point::WatchPoint;
use crate::syscall::table;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Result type for registration
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Reasons a watch-point cannot be registered
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
	/// Another point already uses this name
	#[error("watch-point {0} registered twice")]
	DuplicateName(String),

	/// Another syscall point already uses this number
	#[error("syscall number {nr} registered twice (by {name})")]
	DuplicateNumber { nr: u32, name: String },

	/// Only syscall-numbered points are accepted
	#[error("watch-point {0} has no syscall number")]
	NotSyscall(String),
}

/// Dual-indexed store of watch-point templates
#[derive(Debug, Default)]
pub struct WatchPointRegistry {
	by_name: HashMap<String, Arc<WatchPoint>>,
	by_nr: HashMap<u32, Arc<WatchPoint>>,
}

impl WatchPointRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a syscall watch-point
	///
	/// # Panics
	///
	/// Panics on a duplicate name, a duplicate number, or a point without
	/// a syscall number. Registration only happens before any event is
	/// served, so each of these is a broken table.
	pub fn register(&mut self, point: WatchPoint) {
		if let Err(e) = self.try_register(point) {
			panic!("Register watch-point failed: {e}");
		}
	}

	/// Register a syscall watch-point, reporting conflicts as errors
	///
	/// Nothing is inserted when an error is returned.
	pub fn try_register(&mut self, point: WatchPoint) -> Result<()> {
		let name = point.name().to_string();
		if self.by_name.contains_key(&name) {
			return Err(RegistryError::DuplicateName(name));
		}
		let Some(nr) = point.number() else {
			return Err(RegistryError::NotSyscall(name));
		};
		if self.by_nr.contains_key(&nr) {
			return Err(RegistryError::DuplicateNumber { nr, name });
		}

		let point = Arc::new(point);
		self.by_nr.insert(nr, Arc::clone(&point));
		self.by_name.insert(name, point);
		Ok(())
	}

	#[must_use]
	pub fn by_number(&self, nr: u32) -> Option<&WatchPoint> {
		self.by_nr.get(&nr).map(Arc::as_ref)
	}

	#[must_use]
	pub fn by_name(&self, name: &str) -> Option<&WatchPoint> {
		self.by_name.get(name).map(Arc::as_ref)
	}

	/// All registered points, in no particular order
	pub fn iter(&self) -> impl Iterator<Item = &WatchPoint> {
		self.by_name.values().map(Arc::as_ref)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.by_name.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.by_name.is_empty()
	}
}

static WATCH_POINTS: Lazy<WatchPointRegistry> = Lazy::new(|| {
	let mut registry = WatchPointRegistry::new();
	table::register_builtin(&mut registry);
	debug!("Registered {} syscall watch-points", registry.len());
	registry
});

/// Get the process-wide watch-point registry
#[must_use]
pub fn registry() -> &'static WatchPointRegistry {
	&WATCH_POINTS
}

/// Look up a built-in watch-point by syscall number
#[must_use]
pub fn watch_point_by_nr(nr: u32) -> Option<&'static WatchPoint> {
	registry().by_number(nr)
}

/// Look up a built-in watch-point by name
#[must_use]
pub fn watch_point_by_name(name: &str) -> Option<&'static WatchPoint> {
	registry().by_name(name)
}
