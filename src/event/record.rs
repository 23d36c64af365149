//! Concrete event variants
//!
//! A record arrives as [`Event::Raw`]. Once its context is parsed it is
//! re-tagged, by the class in its header, into exactly one of the
//! classified variants. Bodies are decoded lazily by whoever consumes the
//! event.

use crate::event::TraceEvent;
use crate::event::context::{EventClass, EventContext};
use crate::event::error::{EventError, Result};
use crate::syscall::{self, Phase, SyscallRecord, WatchPoint};
use plain::Plain;
use std::fmt;

/// A record as delivered by the collector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
	/// Code of the collector buffer the record came from
	pub kind: u32,
	pub data: Vec<u8>,
	context: Option<(EventContext, usize)>,
}

impl RawEvent {
	#[must_use]
	pub const fn new(kind: u32, data: Vec<u8>) -> Self {
		Self {
			kind,
			data,
			context: None,
		}
	}

	#[must_use]
	pub fn context(&self) -> Option<&EventContext> {
		self.context.as_ref().map(|(ctx, _)| ctx)
	}
}

/// Wire layout of a syscall body
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SyscallHeader {
	pub nr: u32,
	pub phase: u32,
	pub args: [u64; 6],
	pub ret: i64,
}

/// Wire layout of a uprobe body
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UprobeRegs {
	pub pc: u64,
	pub lr: u64,
	pub sp: u64,
}

// SAFETY: `repr(C)` aggregates of 32/64-bit integers laid out without
// padding.
unsafe impl Plain for SyscallHeader {}
unsafe impl Plain for UprobeRegs {}

fn read_header<T: Plain + Default>(body: &[u8]) -> Result<T> {
	let mut header = T::default();
	plain::copy_from_bytes(&mut header, body).map_err(|_| EventError::BodyTooShort {
		len: body.len(),
		need: std::mem::size_of::<T>(),
	})?;
	Ok(header)
}

/// A syscall entry or exit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyscallEvent {
	pub kind: u32,
	pub context: EventContext,
	body: Vec<u8>,
}

impl SyscallEvent {
	/// Borrow the body as a decoder record
	pub fn record(&self) -> Result<SyscallRecord<'_>> {
		let header: SyscallHeader = read_header(&self.body)?;
		let phase = Phase::from_raw(header.phase).ok_or(EventError::UnknownPhase(header.phase))?;
		Ok(SyscallRecord {
			nr: header.nr,
			phase,
			args: header.args,
			ret: header.ret,
			payload: &self.body[std::mem::size_of::<SyscallHeader>()..],
		})
	}

	/// Decode the arguments against the built-in watch-points
	///
	/// `Ok(None)` means the syscall number has no watch-point.
	pub fn decode(&self) -> Result<Option<WatchPoint>> {
		Ok(syscall::decode(&self.record()?))
	}
}

impl fmt::Display for SyscallEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.record() {
			Ok(record) => match syscall::decode(&record) {
				Some(point) => write!(f, "{} {:?} {}", self.context, record.phase, point),
				None => write!(f, "{} {:?} nr={}", self.context, record.phase, record.nr),
			},
			Err(e) => write!(f, "{} <{}>", self.context, e),
		}
	}
}

/// A user-space probe hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UprobeEvent {
	pub kind: u32,
	pub context: EventContext,
	body: Vec<u8>,
}

impl UprobeEvent {
	pub fn regs(&self) -> Result<UprobeRegs> {
		read_header(&self.body)
	}
}

impl fmt::Display for UprobeEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.regs() {
			Ok(r) => write!(f, "{} pc=0x{:x} lr=0x{:x} sp=0x{:x}", self.context, r.pc, r.lr, r.sp),
			Err(e) => write!(f, "{} <{}>", self.context, e),
		}
	}
}

/// Every event the router can carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
	/// Not yet classified, or of an unknown class
	Raw(RawEvent),
	Syscall(SyscallEvent),
	Uprobe(UprobeEvent),
}

impl Event {
	#[must_use]
	pub const fn raw(kind: u32, data: Vec<u8>) -> Self {
		Self::Raw(RawEvent::new(kind, data))
	}

	#[must_use]
	pub fn context(&self) -> Option<&EventContext> {
		match self {
			Self::Raw(raw) => raw.context(),
			Self::Syscall(e) => Some(&e.context),
			Self::Uprobe(e) => Some(&e.context),
		}
	}

	#[must_use]
	pub fn class(&self) -> EventClass {
		match self {
			Self::Raw(_) => EventClass::None,
			Self::Syscall(_) => EventClass::Syscall,
			Self::Uprobe(_) => EventClass::Uprobe,
		}
	}
}

impl TraceEvent for Event {
	fn kind(&self) -> u32 {
		match self {
			Self::Raw(raw) => raw.kind,
			Self::Syscall(e) => e.kind,
			Self::Uprobe(e) => e.kind,
		}
	}

	fn parse_context(&mut self) -> Result<()> {
		if let Self::Raw(raw) = self {
			if raw.context.is_none() {
				raw.context = Some(EventContext::parse(&raw.data)?);
			}
		}
		Ok(())
	}

	fn classify(self) -> Self {
		let mut raw = match self {
			Self::Raw(raw) => raw,
			classified => return classified,
		};
		let Some((context, used)) = raw.context.take() else {
			return Self::Raw(raw);
		};
		let kind = raw.kind;
		let strip = |mut data: Vec<u8>| {
			data.drain(..used);
			data
		};
		match context.class() {
			EventClass::None => {
				raw.context = Some((context, used));
				Self::Raw(raw)
			},
			EventClass::Syscall => Self::Syscall(SyscallEvent {
				kind,
				context,
				body: strip(raw.data),
			}),
			EventClass::Uprobe => Self::Uprobe(UprobeEvent {
				kind,
				context,
				body: strip(raw.data),
			}),
		}
	}

	fn event_id(&self) -> u32 {
		self.class() as u32
	}

	fn identity(&self) -> String {
		self.context().map(EventContext::identity).unwrap_or_default()
	}
}

impl fmt::Display for Event {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Raw(raw) => match raw.context() {
				Some(ctx) => write!(f, "{} unclassified id={}", ctx, ctx.event_id),
				None => write!(f, "raw kind={} len={}", raw.kind, raw.data.len()),
			},
			Self::Syscall(e) => fmt::Display::fmt(e, f),
			Self::Uprobe(e) => fmt::Display::fmt(e, f),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::event::context::COMM_LEN;

	fn record(event_id: u32, body: &[u8]) -> Vec<u8> {
		let mut out = Vec::new();
		for v in [event_id, 7, 8, 0] {
			out.extend_from_slice(&v.to_le_bytes());
		}
		out.extend_from_slice(&1u64.to_le_bytes());
		let mut comm = [0u8; COMM_LEN];
		comm[..2].copy_from_slice(b"sh");
		out.extend_from_slice(&comm);
		out.extend_from_slice(body);
		out
	}

	fn syscall_body(nr: u32, phase: u32, args: [u64; 6], ret: i64) -> Vec<u8> {
		let mut out = Vec::new();
		out.extend_from_slice(&nr.to_le_bytes());
		out.extend_from_slice(&phase.to_le_bytes());
		for a in args {
			out.extend_from_slice(&a.to_le_bytes());
		}
		out.extend_from_slice(&ret.to_le_bytes());
		out
	}

	#[test]
	fn syscall_record_is_retagged_and_decoded() {
		let mut event = Event::raw(3, record(1, &syscall_body(23, 0, [5, 0, 0, 0, 0, 0], 0)));
		event.parse_context().unwrap();
		let event = event.classify();
		assert_eq!(event.event_id(), EventClass::Syscall as u32);
		assert_eq!(event.identity(), "0_7_8_sh");
		assert_eq!(event.kind(), 3);

		let Event::Syscall(syscall) = &event else {
			panic!("expected a syscall event, got {event:?}");
		};
		let point = syscall.decode().unwrap().unwrap();
		assert_eq!(point.name(), "dup");
		assert_eq!(point.args()[0].value(), "5");
		assert!(event.to_string().contains("[dup] 1"));
	}

	#[test]
	fn zero_id_stays_unclassified() {
		let mut event = Event::raw(0, record(0, &[]));
		event.parse_context().unwrap();
		let event = event.classify();
		assert_eq!(event.event_id(), 0);
		assert!(matches!(event, Event::Raw(_)));
	}

	#[test]
	fn classify_without_context_is_a_no_op() {
		let event = Event::raw(1, vec![1, 2, 3]).classify();
		assert_eq!(event.event_id(), 0);
	}

	#[test]
	fn short_syscall_body_reports_error() {
		let mut event = Event::raw(1, record(1, &[0u8; 10]));
		event.parse_context().unwrap();
		let Event::Syscall(syscall) = event.classify() else {
			panic!("expected a syscall event");
		};
		assert!(matches!(syscall.record(), Err(EventError::BodyTooShort { len: 10, .. })));
	}

	#[test]
	fn uprobe_regs_are_read() {
		let mut body = Vec::new();
		for v in [0x1000u64, 0x2000, 0x3000] {
			body.extend_from_slice(&v.to_le_bytes());
		}
		let mut event = Event::raw(2, record(2, &body));
		event.parse_context().unwrap();
		let Event::Uprobe(uprobe) = event.classify() else {
			panic!("expected a uprobe event");
		};
		assert_eq!(uprobe.regs().unwrap(), UprobeRegs { pc: 0x1000, lr: 0x2000, sp: 0x3000 });
	}
}
