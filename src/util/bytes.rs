//! Byte cursor for captured payloads
//!
//! This module provides a little-endian reader over the variable-length
//! part of a raw event. Every read returns `None` once the payload is
//! exhausted instead of panicking.

/// Little-endian cursor over a byte slice
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
	data: &'a [u8],
	pos: usize,
}

impl<'a> ByteReader<'a> {
	#[must_use]
	pub const fn new(data: &'a [u8]) -> Self {
		Self { data, pos: 0 }
	}

	/// Number of unread bytes
	#[inline]
	#[must_use]
	pub const fn remaining(&self) -> usize {
		self.data.len() - self.pos
	}

	/// Take the next `len` bytes
	pub fn take(&mut self, len: usize) -> Option<&'a [u8]> {
		if self.remaining() < len {
			return None;
		}
		let bytes = &self.data[self.pos..self.pos + len];
		self.pos += len;
		Some(bytes)
	}

	fn array<const N: usize>(&mut self) -> Option<[u8; N]> {
		self.take(N)?.try_into().ok()
	}

	pub fn read_u16(&mut self) -> Option<u16> {
		self.array().map(u16::from_le_bytes)
	}

	pub fn read_u32(&mut self) -> Option<u32> {
		self.array().map(u32::from_le_bytes)
	}

	pub fn read_u64(&mut self) -> Option<u64> {
		self.array().map(u64::from_le_bytes)
	}

	pub fn read_i64(&mut self) -> Option<i64> {
		self.array().map(i64::from_le_bytes)
	}

	/// Read a `u32` length followed by that many bytes of text
	///
	/// Invalid UTF-8 is replaced rather than rejected; a trailing NUL is
	/// dropped.
	pub fn read_string(&mut self) -> Option<String> {
		let len = self.read_u32()? as usize;
		let bytes = self.take(len)?;
		let bytes = bytes.strip_suffix(&[0]).unwrap_or(bytes);
		Some(String::from_utf8_lossy(bytes).into_owned())
	}
}

/// Lowercase hex rendering of a byte slice
#[must_use]
pub fn hex(bytes: &[u8]) -> String {
	use std::fmt::Write;

	let mut out = String::with_capacity(bytes.len() * 2);
	for b in bytes {
		let _ = write!(out, "{b:02x}");
	}
	out
}
