//! Thread-backed worker
//!
//! An `EventWorker` owns a bounded inbox and a thread that feeds the
//! events to an [`EventSink`] in arrival order. It stops when asked to or
//! after staying idle for a configurable number of ticks, drains whatever
//! was already queued and then removes itself from the registry. A
//! panicking sink still closes the inbox and unregisters the worker.
//!
//! Ordering holds per worker instance. Once a worker has closed its inbox
//! the router may start a successor for the same identity, and the
//! successor's events can be consumed while the predecessor is still
//! draining its backlog.

use crate::worker::{AcceptError, Worker, WorkerError, WorkerFactory, WorkerLink};
use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for an event worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
	/// Capacity of the worker's inbox
	pub queue_capacity: usize,
	/// How long the worker waits for an event before counting a tick
	pub tick: Duration,
	/// Consecutive idle ticks after which the worker exits on its own
	pub idle_ticks: Option<u32>,
}

impl WorkerConfig {
	/// Check that the configuration can drive a worker
	pub fn validate(&self) -> Result<(), WorkerError> {
		if self.queue_capacity == 0 {
			return Err(WorkerError::InvalidConfig("queue capacity must be non-zero".into()));
		}
		if self.tick.is_zero() {
			return Err(WorkerError::InvalidConfig("tick must be non-zero".into()));
		}
		if self.idle_ticks == Some(0) {
			return Err(WorkerError::InvalidConfig("idle ticks must be non-zero".into()));
		}
		Ok(())
	}
}

impl Default for WorkerConfig {
	fn default() -> Self {
		Self {
			queue_capacity: 1024,
			tick: Duration::from_millis(100),
			idle_ticks: Some(10),
		}
	}
}

/// Trait for the consumer at the end of a worker
pub trait EventSink<E>: Send {
	/// Handle one event for `identity`
	fn consume(&mut self, identity: &str, event: E);

	/// Called once after the last event
	fn finish(&mut self, _identity: &str) {}
}

/// Sink that writes every event to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl<E: Display> EventSink<E> for LogSink {
	fn consume(&mut self, identity: &str, event: E) {
		info!("{}: {}", identity, event);
	}
}

/// Worker running on its own thread
pub struct EventWorker<E> {
	identity: String,
	inbox: Mutex<Option<SyncSender<E>>>,
	exit: AtomicBool,
	processed: AtomicU64,
}

impl<E> std::fmt::Debug for EventWorker<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventWorker")
			.field("identity", &self.identity)
			.field("exit", &self.exit.load(Ordering::Relaxed))
			.field("processed", &self.processed())
			.finish()
	}
}

impl<E: Send + 'static> EventWorker<E> {
	/// Start a worker thread for the identity in `link`
	pub fn spawn(
		link: WorkerLink<E>,
		config: &WorkerConfig,
		sink: Box<dyn EventSink<E>>,
	) -> Result<Arc<Self>, WorkerError> {
		config.validate()?;
		let (tx, rx) = mpsc::sync_channel(config.queue_capacity);
		let worker = Arc::new(Self {
			identity: link.identity().to_string(),
			inbox: Mutex::new(Some(tx)),
			exit: AtomicBool::new(false),
			processed: AtomicU64::new(0),
		});

		let runner = Arc::clone(&worker);
		let tick = config.tick;
		let idle_ticks = config.idle_ticks;
		thread::Builder::new()
			.name(format!("worker-{}", worker.identity))
			.spawn(move || runner.run(rx, link, sink, tick, idle_ticks))?;
		Ok(worker)
	}

	fn run(
		&self,
		rx: Receiver<E>,
		link: WorkerLink<E>,
		mut sink: Box<dyn EventSink<E>>,
		tick: Duration,
		idle_ticks: Option<u32>,
	) {
		let registration = Registration { worker: self, link };
		debug!("Worker {} started", self.identity);
		let mut idle = 0;
		while !self.exit_requested() {
			match rx.recv_timeout(tick) {
				Ok(event) => {
					idle = 0;
					self.consume(sink.as_mut(), event);
				},
				Err(RecvTimeoutError::Timeout) => {
					idle += 1;
					if idle_ticks.is_some_and(|max| idle >= max) {
						debug!("Worker {} idle for {} ticks", self.identity, idle);
						break;
					}
				},
				Err(RecvTimeoutError::Disconnected) => break,
			}
		}

		// Anything accepted before the inbox closes is in `rx`, anything
		// after is handed back to the router as retired.
		self.close();
		while let Ok(event) = rx.try_recv() {
			self.consume(sink.as_mut(), event);
		}
		sink.finish(&self.identity);
		drop(registration);
		debug!("Worker {} exited after {} events", self.identity, self.processed());
	}

	fn consume(&self, sink: &mut dyn EventSink<E>, event: E) {
		sink.consume(&self.identity, event);
		self.processed.fetch_add(1, Ordering::Relaxed);
	}
}

/// Closes the inbox and unregisters the worker when its thread ends,
/// including by unwinding
struct Registration<'a, E> {
	worker: &'a EventWorker<E>,
	link: WorkerLink<E>,
}

impl<E> Drop for Registration<'_, E> {
	fn drop(&mut self) {
		self.worker.close();
		self.link.unregister();
		if thread::panicking() {
			warn!("Worker {} panicked after {} events", self.worker.identity, self.worker.processed());
		}
	}
}

impl<E> EventWorker<E> {
	fn close(&self) {
		self.inbox.lock().unwrap_or_else(PoisonError::into_inner).take();
	}

	/// Number of events handed to the sink so far
	#[must_use]
	pub fn processed(&self) -> u64 {
		self.processed.load(Ordering::Relaxed)
	}
}

impl<E: Send> Worker<E> for EventWorker<E> {
	fn identity(&self) -> &str {
		&self.identity
	}

	fn accept(&self, event: E) -> Result<(), AcceptError<E>> {
		let inbox = self.inbox.lock().unwrap_or_else(PoisonError::into_inner);
		let Some(tx) = inbox.as_ref() else {
			return Err(AcceptError::Retired(event));
		};
		tx.try_send(event).map_err(|e| match e {
			TrySendError::Full(event) => AcceptError::Full(event),
			TrySendError::Disconnected(event) => AcceptError::Disconnected(event),
		})
	}

	fn request_exit(&self) {
		self.exit.store(true, Ordering::SeqCst);
	}

	fn exit_requested(&self) -> bool {
		self.exit.load(Ordering::SeqCst)
	}
}

type SinkMaker<E> = dyn Fn(&str) -> Box<dyn EventSink<E>> + Send + Sync;

/// Factory creating one [`EventWorker`] per identity
pub struct EventWorkerFactory<E> {
	config: WorkerConfig,
	make_sink: Box<SinkMaker<E>>,
	_event: PhantomData<fn(E)>,
}

impl<E> std::fmt::Debug for EventWorkerFactory<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventWorkerFactory").field("config", &self.config).finish()
	}
}

impl<E: Send + 'static> EventWorkerFactory<E> {
	/// Create a factory building each worker's sink with `make_sink`
	pub fn new<F>(make_sink: F) -> Self
	where
		F: Fn(&str) -> Box<dyn EventSink<E>> + Send + Sync + 'static,
	{
		Self {
			config: WorkerConfig::default(),
			make_sink: Box::new(make_sink),
			_event: PhantomData,
		}
	}

	/// Create a factory whose workers log every event
	#[must_use]
	pub fn logging() -> Self
	where
		E: Display,
	{
		Self::new(|_| -> Box<dyn EventSink<E>> { Box::new(LogSink) })
	}

	#[must_use]
	pub fn config(mut self, config: WorkerConfig) -> Self {
		self.config = config;
		self
	}

	#[must_use]
	pub const fn queue_capacity(mut self, capacity: usize) -> Self {
		self.config.queue_capacity = capacity;
		self
	}

	#[must_use]
	pub const fn tick(mut self, tick: Duration) -> Self {
		self.config.tick = tick;
		self
	}

	#[must_use]
	pub const fn idle_ticks(mut self, idle_ticks: Option<u32>) -> Self {
		self.config.idle_ticks = idle_ticks;
		self
	}
}

impl<E: Send + 'static> WorkerFactory<E> for EventWorkerFactory<E> {
	fn validate(&self) -> Result<(), WorkerError> {
		self.config.validate()
	}

	fn create(&self, identity: &str, link: WorkerLink<E>) -> Result<Arc<dyn Worker<E>>, WorkerError> {
		let sink = (self.make_sink)(identity);
		let worker: Arc<dyn Worker<E>> = EventWorker::spawn(link, &self.config, sink)?;
		Ok(worker)
	}
}
