//! Dispatch statistics

/// Result of dispatching one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dispatch {
	/// Handed to the worker for its identity
	Forwarded,
	/// The raw context could not be parsed
	ParseFailed,
	/// The event classified as nothing to route
	Unclassified,
	/// The worker refused the event and it was dropped
	ForwardFailed,
}

/// Counters kept by the dispatch loop
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RouterStats {
	pub forwarded: u64,
	pub parse_failures: u64,
	pub unclassified: u64,
	pub forward_failures: u64,
	/// Workers created on first sight of an identity
	pub workers_created: u64,
	/// Events still queued when the dispatch loop stopped
	pub dropped_on_stop: u64,
}

impl RouterStats {
	/// Count one dispatch outcome
	pub const fn record(&mut self, outcome: Dispatch) {
		match outcome {
			Dispatch::Forwarded => self.forwarded += 1,
			Dispatch::ParseFailed => self.parse_failures += 1,
			Dispatch::Unclassified => self.unclassified += 1,
			Dispatch::ForwardFailed => self.forward_failures += 1,
		}
	}

	/// Every event the loop has taken off the queue
	#[must_use]
	pub const fn dispatched(&self) -> u64 {
		self.forwarded + self.parse_failures + self.unclassified + self.forward_failures
	}
}
