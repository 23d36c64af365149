//! Helpers shared by the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use syswatch::event::{COMM_LEN, EventClass};
use syswatch::{Event, EventSink, TraceEvent};

/// Encode a context header
pub fn context(class: u32, pid: u32, tid: u32, uid: u32, timestamp: u64, comm: &str) -> Vec<u8> {
	let mut out = Vec::new();
	for field in [class, pid, tid, uid] {
		out.extend_from_slice(&field.to_ne_bytes());
	}
	out.extend_from_slice(&timestamp.to_ne_bytes());
	let mut name = [0u8; COMM_LEN];
	let len = comm.len().min(COMM_LEN - 1);
	name[..len].copy_from_slice(&comm.as_bytes()[..len]);
	out.extend_from_slice(&name);
	out
}

/// Encode a syscall record: context, fixed body, then payload
pub fn syscall_record(tid: u32, timestamp: u64, nr: u32, phase: u32, args: [u64; 6], ret: i64, payload: &[u8]) -> Vec<u8> {
	let mut out = context(EventClass::Syscall as u32, 100, tid, 0, timestamp, "probe");
	out.extend_from_slice(&nr.to_ne_bytes());
	out.extend_from_slice(&phase.to_ne_bytes());
	for arg in args {
		out.extend_from_slice(&arg.to_ne_bytes());
	}
	out.extend_from_slice(&ret.to_ne_bytes());
	out.extend_from_slice(payload);
	out
}

/// A syscall event for thread `tid`, tagged with `seq` in its timestamp
pub fn syscall_event(tid: u32, seq: u64) -> Event {
	Event::raw(1, syscall_record(tid, seq, 23, 0, [3, 0, 0, 0, 0, 0], 0, &[]))
}

/// Length-prefixed string as the collector writes it
pub fn payload_string(s: &str) -> Vec<u8> {
	let mut out = Vec::new();
	out.extend_from_slice(&((s.len() + 1) as u32).to_le_bytes());
	out.extend_from_slice(s.as_bytes());
	out.push(0);
	out
}

/// Everything a set of workers consumed, in consumption order
pub type Journal = Arc<Mutex<Vec<(String, Event)>>>;

pub struct Collect(pub Journal);

impl EventSink<Event> for Collect {
	fn consume(&mut self, identity: &str, event: Event) {
		assert_eq!(identity, event.identity());
		self.0.lock().unwrap().push((identity.to_string(), event));
	}
}

pub fn journal() -> Journal {
	Arc::new(Mutex::new(Vec::new()))
}

/// Timestamps consumed for `identity`, in order
pub fn sequence(journal: &Journal, identity: &str) -> Vec<u64> {
	journal
		.lock()
		.unwrap()
		.iter()
		.filter(|(id, _)| id == identity)
		.filter_map(|(_, event)| event.context().map(|ctx| ctx.timestamp))
		.collect()
}

/// Poll `cond` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
	let deadline = Instant::now() + timeout;
	while Instant::now() < deadline {
		if cond() {
			return true;
		}
		thread::sleep(Duration::from_millis(2));
	}
	cond()
}
