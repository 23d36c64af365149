//! Event router
//!
//! Producers submit raw events into one bounded queue. A single dispatch
//! loop takes them off in order, turns each into its concrete form and
//! hands it to the worker for the event's identity, creating that worker
//! the first time the identity is seen. Events of one identity therefore
//! reach their worker in the order they were submitted. When a worker
//! retires or dies it is replaced, and ordering holds per worker
//! instance from then on.

mod builder;
mod error;
mod stats;

pub use builder::{ForwardFailurePolicy, RouterBuilder, RouterConfig};
pub use error::{Result, RouterError, SubmitError};
pub use stats::{Dispatch, RouterStats};

use crate::event::TraceEvent;
use crate::worker::{AcceptError, WorkerFactory, WorkerRegistry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const SHUTDOWN_POLL: Duration = Duration::from_millis(10);

/// Routes events from producers to per-identity workers
pub struct EventRouter<E> {
	config: RouterConfig,
	incoming: SyncSender<E>,
	receiver: Mutex<Option<Receiver<E>>>,
	workers: Arc<WorkerRegistry<E>>,
	factory: Box<dyn WorkerFactory<E>>,
	stop: AtomicBool,
	stats: Mutex<RouterStats>,
}

impl<E> std::fmt::Debug for EventRouter<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventRouter")
			.field("config", &self.config)
			.field("workers", &self.workers.len())
			.field("stop", &self.stop.load(Ordering::Relaxed))
			.finish()
	}
}

impl<E: TraceEvent> EventRouter<E> {
	/// Create a router builder
	pub fn builder<F: WorkerFactory<E> + 'static>(factory: F) -> RouterBuilder<E> {
		RouterBuilder::new(factory)
	}

	pub(crate) fn new(config: RouterConfig, factory: Box<dyn WorkerFactory<E>>) -> Self {
		let (incoming, receiver) = mpsc::sync_channel(config.queue_capacity);
		Self {
			config,
			incoming,
			receiver: Mutex::new(Some(receiver)),
			workers: Arc::new(WorkerRegistry::new()),
			factory,
			stop: AtomicBool::new(false),
			stats: Mutex::new(RouterStats::default()),
		}
	}

	/// Queue an event, blocking while the queue is full
	pub fn submit(&self, event: E) -> std::result::Result<(), SubmitError<E>> {
		if self.stop_requested() {
			return Err(SubmitError::Closed(event));
		}
		self.incoming
			.send(event)
			.map_err(|mpsc::SendError(event)| SubmitError::Closed(event))
	}

	/// Queue an event without blocking
	pub fn try_submit(&self, event: E) -> std::result::Result<(), SubmitError<E>> {
		if self.stop_requested() {
			return Err(SubmitError::Closed(event));
		}
		self.incoming.try_send(event).map_err(|e| match e {
			TrySendError::Full(event) => SubmitError::Full(event),
			TrySendError::Disconnected(event) => SubmitError::Closed(event),
		})
	}

	/// Run the dispatch loop on the calling thread until [`stop`](Self::stop)
	///
	/// Only one thread may run the loop. Once it returns the router takes
	/// no more events: producers blocked in [`submit`](Self::submit) get
	/// their event back. Events still queued at that point are dropped and
	/// counted in [`RouterStats::dropped_on_stop`]. A producer that passed
	/// the stop check can still land an event between that final drain and
	/// the queue closing; such an event is lost without being counted.
	pub fn run(&self) -> Result<()> {
		let mut receiver = match self.receiver.try_lock() {
			Ok(guard) => guard,
			Err(TryLockError::WouldBlock) => return Err(RouterError::AlreadyRunning),
			Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
		};
		let Some(rx) = receiver.as_ref() else {
			return Err(RouterError::Stopped);
		};

		info!("Event router started");
		while !self.stop_requested() {
			match rx.recv_timeout(self.config.poll_interval) {
				Ok(event) => {
					let outcome = self.dispatch(event);
					self.stats().record(outcome);
				},
				Err(RecvTimeoutError::Timeout) => {},
				Err(RecvTimeoutError::Disconnected) => break,
			}
		}

		let pending = rx.try_iter().count() as u64;
		receiver.take();
		if pending > 0 {
			self.stats().dropped_on_stop += pending;
			warn!("Event router stopped, dropping {} queued events", pending);
		}
		info!("Event router stopped");
		Ok(())
	}

	/// Run the dispatch loop on a new thread
	pub fn spawn(self: &Arc<Self>) -> Result<JoinHandle<Result<()>>> {
		let router = Arc::clone(self);
		let handle = thread::Builder::new()
			.name("event-router".to_string())
			.spawn(move || router.run())?;
		Ok(handle)
	}

	fn dispatch(&self, mut event: E) -> Dispatch {
		if let Err(e) = event.parse_context() {
			warn!("Failed to parse event context: kind={} error={}", event.kind(), e);
			return Dispatch::ParseFailed;
		}

		let event = event.classify();
		if event.event_id() == 0 {
			debug!("Skipping unclassified event: kind={}", event.kind());
			return Dispatch::Unclassified;
		}

		let identity = event.identity();
		self.forward(&identity, event)
	}

	fn forward(&self, identity: &str, mut event: E) -> Dispatch {
		let mut retried = false;
		loop {
			let (entry, created) = match self.workers.get_or_create(identity, self.factory.as_ref()) {
				Ok(found) => found,
				Err(e) => return self.forward_failed(identity, &e),
			};
			if created {
				self.stats().workers_created += 1;
			}

			match entry.worker.accept(event) {
				Ok(()) => return Dispatch::Forwarded,
				// The worker closed its inbox or died between lookup and accept.
				Err(AcceptError::Retired(rejected) | AcceptError::Disconnected(rejected)) if !retried => {
					self.workers.remove(identity, entry.serial);
					retried = true;
					event = rejected;
				},
				Err(e) => return self.forward_failed(identity, &e),
			}
		}
	}

	fn forward_failed(&self, identity: &str, reason: &dyn std::fmt::Display) -> Dispatch {
		match self.config.forward_policy {
			ForwardFailurePolicy::Abort => {
				error!("Failed to forward event to worker {}: {}", identity, reason);
				std::process::exit(1);
			},
			ForwardFailurePolicy::Drop => {
				warn!("Dropping event for worker {}: {}", identity, reason);
				Dispatch::ForwardFailed
			},
		}
	}
}

impl<E> EventRouter<E> {
	/// Ask the dispatch loop to return
	pub fn stop(&self) {
		self.stop.store(true, Ordering::SeqCst);
	}

	#[must_use]
	pub fn stop_requested(&self) -> bool {
		self.stop.load(Ordering::SeqCst)
	}

	/// Ask every worker to exit and wait for them to unregister
	///
	/// Returns as soon as the registry is empty, or
	/// [`RouterError::WorkersAlive`] once the grace period has passed with
	/// workers still registered.
	pub fn shutdown(&self) -> Result<()> {
		let signalled = self.workers.request_exit_all();
		if signalled == 0 {
			return Ok(());
		}
		debug!("Asked {} workers to exit", signalled);

		let deadline = Instant::now() + self.config.shutdown_grace;
		loop {
			let alive = self.workers.len();
			if alive == 0 {
				return Ok(());
			}
			let now = Instant::now();
			if now >= deadline {
				warn!("{} workers still alive after shutdown: {:?}", alive, self.workers.identities());
				return Err(RouterError::WorkersAlive(alive));
			}
			thread::sleep(SHUTDOWN_POLL.min(deadline - now));
		}
	}

	fn stats(&self) -> MutexGuard<'_, RouterStats> {
		self.stats.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Snapshot of the dispatch counters
	#[must_use]
	pub fn statistics(&self) -> RouterStats {
		self.stats().clone()
	}

	/// The registry of live workers
	#[must_use]
	pub fn workers(&self) -> &WorkerRegistry<E> {
		&self.workers
	}

	#[must_use]
	pub const fn config(&self) -> &RouterConfig {
		&self.config
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::event::{EventError, Result as EventResult};
	use crate::worker::{EventSink, EventWorkerFactory, Worker, WorkerError, WorkerLink};

	#[derive(Debug)]
	struct Probe {
		id: u32,
		key: &'static str,
		broken: bool,
	}

	impl TraceEvent for Probe {
		fn kind(&self) -> u32 {
			7
		}

		fn parse_context(&mut self) -> EventResult<()> {
			if self.broken { Err(EventError::ContextMissing) } else { Ok(()) }
		}

		fn classify(self) -> Self {
			self
		}

		fn event_id(&self) -> u32 {
			self.id
		}

		fn identity(&self) -> String {
			self.key.to_string()
		}
	}

	#[derive(Clone, Copy)]
	enum Refusal {
		Full,
		Retired,
		Disconnected,
	}

	struct Refusing {
		refusal: Refusal,
	}

	impl Worker<Probe> for Refusing {
		fn identity(&self) -> &str {
			"r"
		}

		fn accept(&self, event: Probe) -> std::result::Result<(), AcceptError<Probe>> {
			Err(match self.refusal {
				Refusal::Full => AcceptError::Full(event),
				Refusal::Retired => AcceptError::Retired(event),
				Refusal::Disconnected => AcceptError::Disconnected(event),
			})
		}

		fn request_exit(&self) {}

		fn exit_requested(&self) -> bool {
			false
		}
	}

	fn refusing(refusal: Refusal) -> impl Fn(&str, WorkerLink<Probe>) -> std::result::Result<Arc<dyn Worker<Probe>>, WorkerError> + Send + Sync {
		move |_, _| {
			let worker: Arc<dyn Worker<Probe>> = Arc::new(Refusing { refusal });
			Ok(worker)
		}
	}

	fn probe(id: u32, broken: bool) -> Probe {
		Probe { id, key: "r", broken }
	}

	#[test]
	fn dispatch_reports_parse_and_classification_failures() {
		let router = EventRouter::builder(refusing(Refusal::Full))
			.forward_policy(ForwardFailurePolicy::Drop)
			.build()
			.unwrap();
		assert_eq!(router.dispatch(probe(1, true)), Dispatch::ParseFailed);
		assert_eq!(router.dispatch(probe(0, false)), Dispatch::Unclassified);
		assert!(router.workers().is_empty());
	}

	#[test]
	fn full_worker_drops_event_under_drop_policy() {
		let router = EventRouter::builder(refusing(Refusal::Full))
			.forward_policy(ForwardFailurePolicy::Drop)
			.build()
			.unwrap();
		assert_eq!(router.dispatch(probe(1, false)), Dispatch::ForwardFailed);
		assert_eq!(router.statistics().workers_created, 1);
	}

	#[test]
	fn retired_or_dead_worker_is_replaced_once() {
		for refusal in [Refusal::Retired, Refusal::Disconnected] {
			let router = EventRouter::builder(refusing(refusal))
				.forward_policy(ForwardFailurePolicy::Drop)
				.build()
				.unwrap();
			assert_eq!(router.dispatch(probe(1, false)), Dispatch::ForwardFailed);
			// The first worker was removed and a second one created for the retry.
			assert_eq!(router.statistics().workers_created, 2);
			assert_eq!(router.workers().len(), 1);
		}
	}

	#[test]
	fn events_queued_at_stop_are_counted() {
		let router = EventRouter::builder(refusing(Refusal::Full))
			.poll_interval(Duration::from_millis(5))
			.build()
			.unwrap();
		for _ in 0..3 {
			router.submit(probe(1, false)).unwrap();
		}
		router.stop();
		router.run().unwrap();

		let stats = router.statistics();
		assert_eq!(stats.dropped_on_stop, 3);
		assert_eq!(stats.dispatched(), 0);
		assert!(router.workers().is_empty());
	}

	#[test]
	fn second_run_is_rejected() {
		let router = Arc::new(
			EventRouter::builder(refusing(Refusal::Full))
				.poll_interval(Duration::from_millis(5))
				.forward_policy(ForwardFailurePolicy::Drop)
				.build()
				.unwrap(),
		);
		let handle = router.spawn().unwrap();
		router.submit(probe(0, false)).unwrap();
		while router.statistics().unclassified == 0 {
			thread::sleep(Duration::from_millis(1));
		}
		assert!(matches!(router.run(), Err(RouterError::AlreadyRunning)));

		router.stop();
		handle.join().unwrap().unwrap();
		assert!(matches!(router.run(), Err(RouterError::Stopped)));
		assert!(matches!(router.try_submit(probe(1, false)), Err(SubmitError::Closed(_))));
	}

	#[test]
	fn zero_capacity_is_rejected() {
		let built = EventRouter::<Probe>::builder(refusing(Refusal::Full)).queue_capacity(0).build();
		assert!(matches!(built, Err(RouterError::InvalidConfig(_))));
	}

	#[test]
	fn unusable_worker_factory_is_rejected() {
		struct Discard;

		impl EventSink<Probe> for Discard {
			fn consume(&mut self, _identity: &str, _event: Probe) {}
		}

		let factory = EventWorkerFactory::new(|_| -> Box<dyn EventSink<Probe>> { Box::new(Discard) }).queue_capacity(0);
		let built = EventRouter::builder(factory).build();
		assert!(matches!(built, Err(RouterError::InvalidConfig(_))));
	}
}
