//! Trace events
//!
//! This module contains the contract the router consumes from events and
//! the concrete event model for records produced by the collector.

mod context;
mod error;
mod record;

pub use context::{COMM_LEN, ContextHeader, EventClass, EventContext};
pub use error::{EventError, Result};
pub use record::{Event, RawEvent, SyscallEvent, SyscallHeader, UprobeEvent, UprobeRegs};

/// Trait for events that can be routed
///
/// The router only ever calls these methods, in this order: parse the
/// context, re-type the event, check its id, then key it by identity.
pub trait TraceEvent: Send + 'static {
	/// Code of the collector the event came from, for diagnostics
	fn kind(&self) -> u32;

	/// Parse the common context out of the raw record
	fn parse_context(&mut self) -> Result<()>;

	/// Re-type the event into its concrete variant
	///
	/// Events whose class is unknown come back unchanged and report an
	/// [`event_id`](Self::event_id) of zero.
	#[must_use]
	fn classify(self) -> Self
	where
		Self: Sized;

	/// Classification id; zero means there is nothing to route
	fn event_id(&self) -> u32;

	/// Key of the traced subject the event belongs to
	fn identity(&self) -> String;
}
