//! Utility modules for syswatch
//!
//! This module contains the logging setup and the byte reader used to
//! decode collector records.

pub mod bytes;
pub mod logging;

pub use bytes::{ByteReader, hex};
pub use logging::{init_logging, log_level};
