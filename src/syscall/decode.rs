//! Syscall argument decoding
//!
//! This module turns a captured syscall record into a populated copy of
//! its watch-point. The template in the registry is never touched; each
//! decode works on its own instance.

use crate::syscall::point::{Direction, PointArg, WatchPoint};
use crate::syscall::registry::{self, WatchPointRegistry};
use crate::syscall::types::{ArgKind, TypeAlias};
use crate::util::bytes::{ByteReader, hex};

/// Value written into an accumulator whose payload ran out
pub const TRUNCATED_VALUE: &str = "<truncated>";

/// Which side of the syscall a record was captured on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
	Enter,
	Exit,
}

impl Phase {
	#[must_use]
	pub const fn from_raw(raw: u32) -> Option<Self> {
		match raw {
			0 => Some(Self::Enter),
			1 => Some(Self::Exit),
			_ => None,
		}
	}

	const fn direction(self) -> Direction {
		match self {
			Self::Enter => Direction::Enter,
			Self::Exit => Direction::Exit,
		}
	}
}

/// One captured syscall: register values plus the dereferenced payload
#[derive(Debug, Clone, Copy)]
pub struct SyscallRecord<'a> {
	pub nr: u32,
	pub phase: Phase,
	pub args: [u64; 6],
	pub ret: i64,
	pub payload: &'a [u8],
}

/// Decode `record` against the built-in registry
#[must_use]
pub fn decode(record: &SyscallRecord<'_>) -> Option<WatchPoint> {
	decode_with(registry::registry(), record)
}

/// Decode `record` against `registry`
///
/// Returns `None` when the syscall number is not registered. Arguments
/// captured on the other phase keep their unset value.
#[must_use]
pub fn decode_with(registry: &WatchPointRegistry, record: &SyscallRecord<'_>) -> Option<WatchPoint> {
	let mut point = registry.by_number(record.nr)?.instantiate();
	let mut reader = ByteReader::new(record.payload);
	let mut truncated = false;
	let direction = record.phase.direction();

	for (i, arg) in point.args_mut().iter_mut().enumerate() {
		if arg.direction != direction {
			continue;
		}
		let raw = record.args.get(i).copied().unwrap_or_default();
		if arg.arg_type.reads_payload() && truncated {
			arg.set_value(TRUNCATED_VALUE);
			continue;
		}
		match read_value(arg, raw, &mut reader) {
			Some(value) => arg.set_value(value),
			None => {
				truncated = true;
				arg.set_value(TRUNCATED_VALUE);
			},
		}
	}

	if record.phase == Phase::Exit {
		let ret = point.ret_mut();
		match ret.arg_type.kind {
			ArgKind::None => {},
			ArgKind::Pointer => ret.set_value(format!("0x{:x}", record.ret)),
			_ => ret.set_value(record.ret.to_string()),
		}
	}

	Some(point)
}

fn read_value(arg: &PointArg, raw: u64, reader: &mut ByteReader<'_>) -> Option<String> {
	let arg_type = arg.arg_type;
	match arg_type.kind {
		ArgKind::None => Some(String::new()),
		ArgKind::Num => Some(format_number(arg_type.alias, raw)),
		ArgKind::Pointer => Some(format!("0x{raw:x}")),
		ArgKind::String => reader.read_string(),
		ArgKind::StringArr => {
			let count = reader.read_u32()?;
			let items = (0..count).map(|_| reader.read_string()).collect::<Option<Vec<_>>>()?;
			serde_json::to_string(&items).ok()
		},
		ArgKind::Struct => {
			let bytes = reader.take(arg_type.size as usize)?;
			Some(format_struct(arg_type.alias, bytes))
		},
	}
}

fn format_number(alias: TypeAlias, raw: u64) -> String {
	match alias {
		TypeAlias::Int => (raw as i64).to_string(),
		TypeAlias::Uint32 => (raw as u32).to_string(),
		_ => raw.to_string(),
	}
}

fn format_struct(alias: TypeAlias, bytes: &[u8]) -> String {
	format_known_struct(alias, &mut ByteReader::new(bytes)).unwrap_or_else(|| hex(bytes))
}

fn format_known_struct(alias: TypeAlias, reader: &mut ByteReader<'_>) -> Option<String> {
	match alias {
		TypeAlias::Timespec => {
			let sec = reader.read_i64()?;
			let nsec = reader.read_i64()?;
			Some(format!("{{sec={sec}, nsec={nsec}}}"))
		},
		TypeAlias::Sockaddr => {
			let family = reader.read_u16()?;
			let data = reader.take(14)?;
			Some(format!("{{family={family}, data={}}}", hex(data)))
		},
		TypeAlias::Sigaction => {
			let handler = reader.read_u64()?;
			let _sigaction = reader.read_u64()?;
			let mask = reader.read_u64()?;
			let flags = reader.read_u64()?;
			Some(format!("{{handler=0x{handler:x}, mask=0x{mask:x}, flags=0x{flags:x}}}"))
		},
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::syscall::point::{PointArgs, UNSET_VALUE};
	use crate::syscall::types::{INT, STRING, TIMESPEC, UINT32};

	fn len_prefixed(s: &str) -> Vec<u8> {
		let mut out = (s.len() as u32).to_le_bytes().to_vec();
		out.extend_from_slice(s.as_bytes());
		out
	}

	#[test]
	fn openat_entry_decodes_registers_and_path() {
		let payload = len_prefixed("/etc/hosts");
		let record = SyscallRecord {
			nr: 56,
			phase: Phase::Enter,
			args: [(-100i64) as u64, 0xdead, 0x80000, 0o644, 0, 0],
			ret: 0,
			payload: &payload,
		};
		let point = decode(&record).unwrap();
		let values: Vec<_> = point.args().iter().map(|a| a.value().to_string()).collect();
		assert_eq!(values, ["-100", "/etc/hosts", "524288", "420"]);
		assert_eq!(point.ret().value(), UNSET_VALUE);
	}

	#[test]
	fn exit_fills_only_exit_args_and_return() {
		let mut registry = WatchPointRegistry::new();
		registry.register(WatchPoint::syscall(
			17,
			PointArgs::new("getcwd", vec![PointArg::exit("buf", &STRING), PointArg::enter("size", &UINT32)]),
		));
		let payload = len_prefixed("/root\0");
		let record = SyscallRecord {
			nr: 17,
			phase: Phase::Exit,
			args: [0x1000, 4096, 0, 0, 0, 0],
			ret: 6,
			payload: &payload,
		};
		let point = decode_with(&registry, &record).unwrap();
		assert_eq!(point.args()[0].value(), "/root");
		assert_eq!(point.args()[1].value(), UNSET_VALUE);
		assert_eq!(point.ret().value(), "6");
	}

	#[test]
	fn short_payload_marks_remaining_args_truncated() {
		let mut registry = WatchPointRegistry::new();
		registry.register(WatchPoint::syscall(
			101,
			PointArgs::new(
				"nanosleep",
				vec![PointArg::enter("req", &TIMESPEC), PointArg::enter("rem", &TIMESPEC), PointArg::enter("n", &INT)],
			),
		));
		let mut payload = 1i64.to_le_bytes().to_vec();
		payload.extend_from_slice(&500i64.to_le_bytes());
		let record = SyscallRecord {
			nr: 101,
			phase: Phase::Enter,
			args: [0, 0, 9, 0, 0, 0],
			ret: 0,
			payload: &payload,
		};
		let point = decode_with(&registry, &record).unwrap();
		assert_eq!(point.args()[0].value(), "{sec=1, nsec=500}");
		assert_eq!(point.args()[1].value(), TRUNCATED_VALUE);
		assert_eq!(point.args()[2].value(), "9");
	}

	#[test]
	fn unknown_number_is_absent() {
		let record = SyscallRecord {
			nr: 100_000,
			phase: Phase::Enter,
			args: [0; 6],
			ret: 0,
			payload: &[],
		};
		assert!(decode(&record).is_none());
	}

	#[test]
	fn phase_from_raw_rejects_unknown() {
		assert_eq!(Phase::from_raw(1), Some(Phase::Exit));
		assert_eq!(Phase::from_raw(7), None);
	}
}
