//! Builder for creating routers
//!
//! This module contains the `RouterBuilder` struct and related
//! functionality for configuring and building event routers.

use crate::event::TraceEvent;
use crate::router::{EventRouter, Result, RouterError};
use crate::worker::WorkerFactory;
use std::time::Duration;

/// What the router does when a worker refuses an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ForwardFailurePolicy {
	/// Log the failure and terminate the process
	#[default]
	Abort,
	/// Log the failure, drop the event and keep routing
	Drop,
}

/// Configuration for a router
#[derive(Debug, Clone)]
pub struct RouterConfig {
	/// Capacity of the inbound queue
	pub queue_capacity: usize,
	/// How long `shutdown` waits for workers to unregister
	pub shutdown_grace: Duration,
	/// How often the dispatch loop checks for a stop request
	pub poll_interval: Duration,
	/// Handling of forwarding failures
	pub forward_policy: ForwardFailurePolicy,
}

impl Default for RouterConfig {
	fn default() -> Self {
		Self {
			queue_capacity: 1024,
			shutdown_grace: Duration::from_millis(300),
			poll_interval: Duration::from_millis(100),
			forward_policy: ForwardFailurePolicy::Abort,
		}
	}
}

/// Builder for creating routers
pub struct RouterBuilder<E> {
	config: RouterConfig,
	factory: Box<dyn WorkerFactory<E>>,
}

impl<E> std::fmt::Debug for RouterBuilder<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouterBuilder").field("config", &self.config).finish()
	}
}

impl<E: TraceEvent> RouterBuilder<E> {
	/// Create a builder whose router creates workers with `factory`
	pub fn new<F: WorkerFactory<E> + 'static>(factory: F) -> Self {
		Self {
			config: RouterConfig::default(),
			factory: Box::new(factory),
		}
	}

	/// Replace the whole configuration
	#[must_use]
	pub fn config(mut self, config: RouterConfig) -> Self {
		self.config = config;
		self
	}

	/// Set the capacity of the inbound queue
	#[must_use]
	pub const fn queue_capacity(mut self, capacity: usize) -> Self {
		self.config.queue_capacity = capacity;
		self
	}

	/// Set how long shutdown waits for workers
	#[must_use]
	pub const fn shutdown_grace(mut self, grace: Duration) -> Self {
		self.config.shutdown_grace = grace;
		self
	}

	/// Set how often the dispatch loop checks for a stop request
	#[must_use]
	pub const fn poll_interval(mut self, interval: Duration) -> Self {
		self.config.poll_interval = interval;
		self
	}

	/// Set the forwarding failure policy
	#[must_use]
	pub const fn forward_policy(mut self, policy: ForwardFailurePolicy) -> Self {
		self.config.forward_policy = policy;
		self
	}

	/// Build the router
	pub fn build(self) -> Result<EventRouter<E>> {
		if self.config.queue_capacity == 0 {
			return Err(RouterError::InvalidConfig("queue capacity must be non-zero".into()));
		}
		if self.config.poll_interval.is_zero() {
			return Err(RouterError::InvalidConfig("poll interval must be non-zero".into()));
		}
		self.factory
			.validate()
			.map_err(|e| RouterError::InvalidConfig(e.to_string()))?;
		Ok(EventRouter::new(self.config, self.factory))
	}
}
