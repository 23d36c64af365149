//! Syscall ABI metadata
//!
//! This module contains the argument type catalog, the watch-point
//! descriptors built from it, the registry indexing them, and the decoder
//! that fills a descriptor from a captured record.

pub mod decode;
mod point;
mod registry;
mod table;
pub mod types;

pub use decode::{Phase, SyscallRecord, decode, decode_with};
pub use point::{
	Direction, FilterArgType, MAX_POINT_ARG_COUNT, PointArg, PointArgs, PointTypes, UNSET_VALUE, WatchPoint,
};
pub use registry::{RegistryError, WatchPointRegistry, registry, watch_point_by_name, watch_point_by_nr};
pub use table::{builtin_points, register_builtin};
pub use types::{ArgKind, ArgType, TypeAlias};
