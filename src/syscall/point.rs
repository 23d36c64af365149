//! Watch-point descriptors
//!
//! A watch-point describes the argument and return layout of one
//! observable call site. The registry holds immutable templates; decoders
//! work on owned copies whose value accumulators are independent.

use crate::syscall::types::{ArgType, UINT64};
use plain::Plain;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::borrow::Cow;
use std::fmt;

/// Maximum number of arguments carried by a [`PointTypes`] snapshot
pub const MAX_POINT_ARG_COUNT: usize = 6;

/// Value of an accumulator that nothing has written yet
pub const UNSET_VALUE: &str = "???";

/// When an argument is captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Direction {
	/// Never captured
	None = 0,
	/// Captured at syscall entry
	Enter = 1,
	/// Captured at syscall exit
	Exit = 2,
}

impl Direction {
	#[must_use]
	pub const fn name(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Enter => "enter",
			Self::Exit => "exit",
		}
	}
}

/// One argument of a watch-point together with its formatted value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointArg {
	pub name: Cow<'static, str>,
	pub direction: Direction,
	pub arg_type: &'static ArgType,
	value: String,
}

impl PointArg {
	pub fn new(name: impl Into<Cow<'static, str>>, direction: Direction, arg_type: &'static ArgType) -> Self {
		Self {
			name: name.into(),
			direction,
			arg_type,
			value: UNSET_VALUE.to_string(),
		}
	}

	/// An argument read when the syscall is entered
	pub fn enter(name: impl Into<Cow<'static, str>>, arg_type: &'static ArgType) -> Self {
		Self::new(name, Direction::Enter, arg_type)
	}

	/// An argument read when the syscall returns
	pub fn exit(name: impl Into<Cow<'static, str>>, arg_type: &'static ArgType) -> Self {
		Self::new(name, Direction::Exit, arg_type)
	}

	#[must_use]
	pub fn value(&self) -> &str {
		&self.value
	}

	pub fn set_value(&mut self, value: impl Into<String>) {
		self.value = value.into();
	}

	pub fn append_value(&mut self, value: &str) {
		self.value.push_str(value);
	}

	pub fn reset(&mut self) {
		self.value.clear();
		self.value.push_str(UNSET_VALUE);
	}

	fn filter_type(&self) -> FilterArgType {
		FilterArgType {
			direction: self.direction as u32,
			alias: self.arg_type.alias as u32,
			kind: self.arg_type.kind as u32,
			size: self.arg_type.size,
		}
	}
}

impl Serialize for PointArg {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut s = serializer.serialize_struct("PointArg", 6)?;
		s.serialize_field("name", &self.name)?;
		s.serialize_field("direction", self.direction.name())?;
		s.serialize_field("alias", &self.arg_type.alias)?;
		s.serialize_field("kind", &self.arg_type.kind)?;
		s.serialize_field("size", &self.arg_type.size)?;
		s.serialize_field("value", &self.value)?;
		s.end()
	}
}

/// Name, return descriptor and ordered arguments of a call site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointArgs {
	pub name: Cow<'static, str>,
	pub ret: PointArg,
	pub args: Vec<PointArg>,
}

impl PointArgs {
	/// A call site returning a 64-bit value captured at exit
	pub fn new(name: impl Into<Cow<'static, str>>, args: Vec<PointArg>) -> Self {
		Self::with_ret(name, PointArg::exit("ret", &UINT64), args)
	}

	pub fn with_ret(name: impl Into<Cow<'static, str>>, ret: PointArg, args: Vec<PointArg>) -> Self {
		Self {
			name: name.into(),
			ret,
			args,
		}
	}
}

/// A watch-point, optionally bound to a syscall number
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchPoint {
	/// A named call site with no syscall number
	Plain(PointArgs),
	/// A syscall identified by its number
	Syscall { nr: u32, point: PointArgs },
}

impl WatchPoint {
	#[must_use]
	pub const fn syscall(nr: u32, point: PointArgs) -> Self {
		Self::Syscall { nr, point }
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.point().name
	}

	/// Syscall number, if this is a syscall watch-point
	#[must_use]
	pub const fn number(&self) -> Option<u32> {
		match self {
			Self::Plain(_) => None,
			Self::Syscall { nr, .. } => Some(*nr),
		}
	}

	#[must_use]
	pub const fn point(&self) -> &PointArgs {
		match self {
			Self::Plain(point) | Self::Syscall { point, .. } => point,
		}
	}

	pub const fn point_mut(&mut self) -> &mut PointArgs {
		match self {
			Self::Plain(point) | Self::Syscall { point, .. } => point,
		}
	}

	#[must_use]
	pub fn args(&self) -> &[PointArg] {
		&self.point().args
	}

	pub fn args_mut(&mut self) -> &mut [PointArg] {
		&mut self.point_mut().args
	}

	#[must_use]
	pub const fn ret(&self) -> &PointArg {
		&self.point().ret
	}

	pub const fn ret_mut(&mut self) -> &mut PointArg {
		&mut self.point_mut().ret
	}

	/// Copy this descriptor with every accumulator reset
	///
	/// Names and argument types are shared with `self`; only the values
	/// are owned by the copy.
	#[must_use]
	pub fn instantiate(&self) -> Self {
		let mut copy = self.clone();
		copy.ret_mut().reset();
		for arg in copy.args_mut() {
			arg.reset();
		}
		copy
	}

	/// Render as `[name] count [args...]`
	#[must_use]
	pub fn format(&self) -> String {
		let args = serde_json::to_string(self.args()).unwrap_or_else(|_| String::from("[]"));
		format!("[{}] {} {}", self.name(), self.args().len(), args)
	}

	/// Fixed-size snapshot for low-level consumers
	///
	/// Arguments beyond [`MAX_POINT_ARG_COUNT`] are dropped.
	#[must_use]
	pub fn config(&self) -> PointTypes {
		let mut types = PointTypes {
			count: self.args().len().min(MAX_POINT_ARG_COUNT) as u32,
			ret: self.ret().filter_type(),
			..PointTypes::default()
		};
		for (slot, arg) in types.args.iter_mut().zip(self.args()) {
			*slot = arg.filter_type();
		}
		types
	}
}

impl fmt::Display for WatchPoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.format())
	}
}

/// Per-argument entry of a [`PointTypes`] snapshot
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterArgType {
	pub direction: u32,
	pub alias: u32,
	pub kind: u32,
	pub size: u32,
}

/// Fixed-capacity transfer form of a watch-point
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PointTypes {
	pub count: u32,
	pub args: [FilterArgType; MAX_POINT_ARG_COUNT],
	pub ret: FilterArgType,
}

// SAFETY: both structs are `repr(C)` aggregates of `u32` with no padding
// and every bit pattern is a valid value.
unsafe impl Plain for FilterArgType {}
unsafe impl Plain for PointTypes {}

impl PointTypes {
	/// Byte image of the snapshot, independent of the argument count
	#[must_use]
	pub fn as_bytes(&self) -> &[u8] {
		// SAFETY: `PointTypes` is `Plain`.
		unsafe { plain::as_bytes(self) }
	}

	/// Descriptors of the arguments actually carried
	#[must_use]
	pub fn active_args(&self) -> &[FilterArgType] {
		&self.args[..self.count as usize]
	}
}
