//! Reads and writes little-endian binary data in files and in-memory buffers.
//!
//! [`BinaryReader`] and [`BinaryWriter`] are a matched pair: every `write_*` method has a
//! `read_*` counterpart that decodes exactly the bytes it produced.
//!
//! # Encoding
//! * Integers of 1, 2, 4, 8 and 16 bytes use their little-endian representation.
//! * `f32` and `f64` use their IEEE-754 bit patterns, little-endian.
//! * Variable-length integers use 7 bits per byte, least significant group first, with the
//!   high bit set on every byte except the last. At most [`VARINT_MAX_GROUPS`] bytes are
//!   accepted when decoding.
//! * Strings are raw bytes, either with a length known to the caller or prefixed by their
//!   length in bytes as a variable-length integer. There is no terminator.
//!
//! The variable-length integer and length-prefixed string forms are compatible with .NET's
//! `System.IO.BinaryWriter` for UTF-8 strings.
//!
//! # Features
//! * `bstr` (default): `read_bstring*` methods returning `bstr::BString`.
//! * `wide-float`: [`WideFloat`], an opaque 16-byte float, and the methods that read and
//!   write it. Its bit layout is not portable.

#![forbid(unsafe_code)]
#![forbid(unused_must_use)]
#![warn(missing_docs)]

mod error;
mod float;
pub mod fs_util;
mod reader;
mod writer;


pub use error::{Error, Result};
#[cfg(feature = "wide-float")]
pub use float::WideFloat;
pub use fs_util::FileUtilError;
pub use reader::BinaryReader;
pub use writer::BinaryWriter;

/// Maximum number of bytes in an encoded variable-length integer.
pub const VARINT_MAX_GROUPS: u32 = 10;

/// Version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
