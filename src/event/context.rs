//! Common event context
//!
//! Every raw record starts with the same fixed header naming the event
//! class and the task that produced it.

use crate::event::error::{EventError, Result};
use plain::Plain;
use std::fmt;

/// Width of the command name field in the header
pub const COMM_LEN: usize = 16;

/// Wire layout of the context header
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct ContextHeader {
	pub event_id: u32,
	pub pid: u32,
	pub tid: u32,
	pub uid: u32,
	pub timestamp: u64,
	pub comm: [u8; COMM_LEN],
}

// SAFETY: `repr(C)` integers and a byte array, no padding, any bit
// pattern is valid.
unsafe impl Plain for ContextHeader {}

impl ContextHeader {
	pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Classification carried in the context header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum EventClass {
	/// Nothing to route
	None = 0,
	/// A syscall entry or exit
	Syscall = 1,
	/// A user-space probe hit
	Uprobe = 2,
}

impl EventClass {
	/// Map a header id onto a known class; unknown ids are `None`
	#[must_use]
	pub const fn from_id(id: u32) -> Self {
		match id {
			1 => Self::Syscall,
			2 => Self::Uprobe,
			_ => Self::None,
		}
	}
}

/// Parsed context of one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
	pub event_id: u32,
	pub pid: u32,
	pub tid: u32,
	pub uid: u32,
	pub timestamp: u64,
	pub comm: String,
}

impl EventContext {
	/// Parse the header at the front of `data`
	///
	/// Returns the context and the number of bytes consumed.
	pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
		let mut header = ContextHeader::default();
		plain::copy_from_bytes(&mut header, data).map_err(|_| EventError::ContextTooShort {
			len: data.len(),
			need: ContextHeader::SIZE,
		})?;
		Ok((Self::from(header), ContextHeader::SIZE))
	}

	#[must_use]
	pub const fn class(&self) -> EventClass {
		EventClass::from_id(self.event_id)
	}

	/// Key naming the traced subject this event belongs to
	#[must_use]
	pub fn identity(&self) -> String {
		format!("{}_{}_{}_{}", self.uid, self.pid, self.tid, self.comm)
	}
}

impl From<ContextHeader> for EventContext {
	fn from(header: ContextHeader) -> Self {
		let end = header.comm.iter().position(|&b| b == 0).unwrap_or(COMM_LEN);
		Self {
			event_id: header.event_id,
			pid: header.pid,
			tid: header.tid,
			uid: header.uid,
			timestamp: header.timestamp,
			comm: String::from_utf8_lossy(&header.comm[..end]).into_owned(),
		}
	}
}

impl fmt::Display for EventContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}_{}_{}] {}", self.uid, self.pid, self.tid, self.comm)
	}
}
