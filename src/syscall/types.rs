//! Argument type catalog
//!
//! This module contains the closed set of argument encodings a watch-point
//! can declare. Every entry is a `static` and descriptors hold `&'static`
//! references to them, so the catalog is shared and never mutated.

use serde::Serialize;
use std::fmt;
use std::mem::size_of;

/// Coarse decode class of an argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum ArgKind {
	None = 0,
	Num = 1,
	String = 6,
	StringArr = 7,
	Pointer = 8,
	Struct = 9,
}

/// Semantic alias of an argument
///
/// The numeric values are part of the snapshot layout handed to the
/// kernel-side collector and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum TypeAlias {
	None = 0,
	Num,
	Int,
	Uint,
	Uint32,
	Uint64,
	String,
	StringArr,
	Pointer,
	Struct,
	Timespec,
	Stat,
	Statfs,
	Sigaction,
	Utsname,
	Sockaddr,
}

impl TypeAlias {
	/// Lowercase name used in formatted output
	#[must_use]
	pub const fn name(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Num => "num",
			Self::Int => "int",
			Self::Uint => "uint",
			Self::Uint32 => "uint32",
			Self::Uint64 => "uint64",
			Self::String => "string",
			Self::StringArr => "string_arr",
			Self::Pointer => "pointer",
			Self::Struct => "struct",
			Self::Timespec => "timespec",
			Self::Stat => "stat",
			Self::Statfs => "statfs",
			Self::Sigaction => "sigaction",
			Self::Utsname => "utsname",
			Self::Sockaddr => "sockaddr",
		}
	}
}

impl fmt::Display for TypeAlias {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// An argument encoding: alias, decode kind and width in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgType {
	pub alias: TypeAlias,
	pub kind: ArgKind,
	pub size: u32,
}

impl ArgType {
	#[must_use]
	pub const fn new(alias: TypeAlias, kind: ArgKind, size: usize) -> Self {
		Self {
			alias,
			kind,
			size: size as u32,
		}
	}

	/// Whether the argument is read from the captured payload rather than
	/// from the register value alone
	#[must_use]
	pub const fn reads_payload(&self) -> bool {
		matches!(self.kind, ArgKind::String | ArgKind::StringArr | ArgKind::Struct)
	}
}

/// Kernel `struct sigaction` as laid out by the arm64 ABI
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct Sigaction {
	pub sa_handler: u64,
	pub sa_sigaction: u64,
	pub sa_mask: u64,
	pub sa_flags: u64,
	pub sa_restorer: u64,
}

/// A `sockaddr` header followed by the largest family-specific payload
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawSockaddrAny {
	pub family: u16,
	pub data: [u8; 14],
	pub pad: [u8; 96],
}

pub static NONE: ArgType = ArgType::new(TypeAlias::None, ArgKind::None, 0);
pub static INT: ArgType = ArgType::new(TypeAlias::Int, ArgKind::Num, size_of::<isize>());
pub static UINT: ArgType = ArgType::new(TypeAlias::Uint, ArgKind::Num, size_of::<usize>());
pub static UINT32: ArgType = ArgType::new(TypeAlias::Uint32, ArgKind::Num, size_of::<usize>());
pub static UINT64: ArgType = ArgType::new(TypeAlias::Uint64, ArgKind::Num, size_of::<u64>());
pub static STRING: ArgType = ArgType::new(TypeAlias::String, ArgKind::String, size_of::<u64>());
pub static STRING_ARR: ArgType = ArgType::new(TypeAlias::StringArr, ArgKind::StringArr, size_of::<u64>());
pub static POINTER: ArgType = ArgType::new(TypeAlias::Pointer, ArgKind::Pointer, size_of::<u64>());
pub static TIMESPEC: ArgType = ArgType::new(TypeAlias::Timespec, ArgKind::Struct, size_of::<libc::timespec>());
pub static STAT: ArgType = ArgType::new(TypeAlias::Stat, ArgKind::Struct, size_of::<libc::stat>());
pub static STATFS: ArgType = ArgType::new(TypeAlias::Statfs, ArgKind::Struct, size_of::<libc::statfs>());
pub static SIGACTION: ArgType = ArgType::new(TypeAlias::Sigaction, ArgKind::Struct, size_of::<Sigaction>());
pub static UTSNAME: ArgType = ArgType::new(TypeAlias::Utsname, ArgKind::Struct, size_of::<libc::utsname>());
pub static SOCKADDR: ArgType = ArgType::new(TypeAlias::Sockaddr, ArgKind::Struct, size_of::<RawSockaddrAny>());

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn alias_codes_follow_declaration_order() {
		assert_eq!(TypeAlias::None as u32, 0);
		assert_eq!(TypeAlias::Int as u32, 2);
		assert_eq!(TypeAlias::Pointer as u32, 8);
		assert_eq!(TypeAlias::Sockaddr as u32, 15);
	}

	#[test]
	fn kinds_share_codes_with_their_alias() {
		assert_eq!(ArgKind::String as u32, TypeAlias::String as u32);
		assert_eq!(ArgKind::Pointer as u32, TypeAlias::Pointer as u32);
		assert_eq!(ArgKind::Struct as u32, TypeAlias::Struct as u32);
	}

	#[test]
	fn widths_come_from_host_types() {
		assert_eq!(UINT64.size, 8);
		assert_eq!(SIGACTION.size, 40);
		assert_eq!(SOCKADDR.size, 112);
		assert_eq!(TIMESPEC.size as usize, size_of::<libc::timespec>());
		assert!(STAT.size > 0);
		assert!(!INT.reads_payload());
		assert!(STRING.reads_payload());
	}
}
