//! syswatch - Event routing for a syscall and uprobe tracer
//!
//! Collector buffers hand raw records to an [`EventRouter`]. The router
//! parses each record's context, re-types it into a concrete [`Event`]
//! and forwards it to the worker owning the record's identity
//! (`uid_pid_tid_comm`), creating that worker on first sight. The
//! [`syscall`] module carries the per-syscall argument metadata used both
//! to configure the collector and to render captured arguments.
//!
//! # Getting Started
//!
//! ```rust
//! use std::sync::Arc;
//! use syswatch::Event;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     syswatch::init_logging();
//!
//!     // Workers log every event they receive
//!     let router = Arc::new(syswatch::new().build()?);
//!     let handle = router.spawn()?;
//!
//!     // Too short to carry a context; the router reports and skips it
//!     router.submit(Event::raw(1, vec![0; 8])).ok();
//!
//!     router.stop();
//!     handle.join().expect("router thread panicked")?;
//!     router.shutdown()?;
//!
//!     let openat = syswatch::syscall::watch_point_by_name("openat").unwrap();
//!     assert_eq!(openat.number(), Some(56));
//!     Ok(())
//! }
//! ```

pub mod event;
pub mod router;
pub mod syscall;
pub mod util;
pub mod worker;

pub use event::{Event, EventContext, EventError, TraceEvent};
pub use router::{EventRouter, ForwardFailurePolicy, RouterBuilder, RouterConfig, RouterError, RouterStats};
pub use syscall::{WatchPoint, watch_point_by_name, watch_point_by_nr};
pub use util::init_logging;
pub use worker::{EventSink, EventWorkerFactory, Worker, WorkerConfig, WorkerFactory};

/// Create a builder for a router over [`Event`]s whose workers log what
/// they receive
#[must_use]
pub fn new() -> RouterBuilder<Event> {
	RouterBuilder::new(EventWorkerFactory::logging())
}

/// Create a builder for a router whose workers feed sinks made by
/// `make_sink`
pub fn with_sink<F>(make_sink: F) -> RouterBuilder<Event>
where
	F: Fn(&str) -> Box<dyn EventSink<Event>> + Send + Sync + 'static,
{
	RouterBuilder::new(EventWorkerFactory::new(make_sink))
}
