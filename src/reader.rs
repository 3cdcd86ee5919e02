use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use zerocopy::IntoBytes;

use crate::float::check_width;
use crate::{Error, Result, VARINT_MAX_GROUPS};

#[cfg(feature = "wide-float")]
use crate::WideFloat;

/// The backing store of a loaded `BinaryReader`.
#[derive(Debug)]
enum Source {
    File {
        file: BufReader<File>,
        path: PathBuf,
    },
    Buffer(Vec<u8>),
}

/// Reads little-endian values from a file or from an owned in-memory buffer.
///
/// Fixed-size values use the little-endian in-memory representation of the type. Integers
/// can also be read in a variable-length form (see [`read_7bit_encoded_int`]), and strings
/// either with an explicit length or prefixed by a variable-length byte count.
///
/// The reader keeps a cursor that starts at 0 and advances by the size of every value read.
/// A read that needs more bytes than remain in the source fails with an `Io` error of kind
/// `UnexpectedEof` and leaves the cursor unchanged. Nothing else resets the cursor, except
/// re-targeting the reader with [`change_file`] or [`change_buffer`].
///
/// Any buffer returned by a read is owned by the caller.
///
/// [`read_7bit_encoded_int`]: Self::read_7bit_encoded_int
/// [`change_file`]: Self::change_file
/// [`change_buffer`]: Self::change_buffer
#[derive(Debug)]
pub struct BinaryReader {
    source: Option<Source>,
    cursor: u64,
    size: u64,
}

impl BinaryReader {
    /// Opens the file at `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = Self::unloaded();
        reader.change_file(path)?;
        Ok(reader)
    }

    /// Takes ownership of `bytes` and reads from it. No filesystem access happens.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mut reader = Self::unloaded();
        reader.change_buffer(bytes);
        reader
    }

    /// Takes ownership of `bytes` and reads from its first `len` bytes.
    ///
    /// Fails with `Error::Range` if `len` is larger than the buffer.
    pub fn from_buffer(mut bytes: Vec<u8>, len: usize) -> Result<Self> {
        if len > bytes.len() {
            return Err(Error::Range {
                length: len,
                buffer_size: bytes.len(),
                start: 0,
            });
        }
        bytes.truncate(len);
        Ok(Self::from_bytes(bytes))
    }

    fn unloaded() -> Self {
        Self {
            source: None,
            cursor: 0,
            size: 0,
        }
    }

    /// Closes the current source, if any, and starts reading the file at `path` from offset 0.
    ///
    /// If the new file cannot be opened, the reader is left closed.
    pub fn change_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.close();
        self.cursor = 0;
        self.size = 0;

        let mut file = File::open(path)?;
        let size = file.seek(SeekFrom::End(0))?;
        file.rewind()?;

        log::debug!("opened {} for reading ({size} bytes)", path.display());
        self.source = Some(Source::File {
            file: BufReader::new(file),
            path: path.to_path_buf(),
        });
        self.size = size;
        Ok(())
    }

    /// Starts reading from `bytes`, from offset 0. If a file is open, it is closed first.
    pub fn change_buffer(&mut self, bytes: Vec<u8>) {
        if matches!(self.source, Some(Source::File { .. })) {
            self.close();
        }
        log::debug!("reading from a {}-byte buffer", bytes.len());
        self.size = bytes.len() as u64;
        self.cursor = 0;
        self.source = Some(Source::Buffer(bytes));
    }

    /// Releases the file handle or buffer. Calling this on a closed reader does nothing.
    pub fn close(&mut self) {
        match self.source.take() {
            Some(Source::File { path, .. }) => log::debug!("closed {}", path.display()),
            Some(Source::Buffer(_)) | None => {}
        }
    }

    /// Returns `true` if a file or buffer is open.
    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    /// The path of the open file, if reading from a file.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            Some(Source::File { path, .. }) => Some(path),
            _ => None,
        }
    }

    /// The current read position, in bytes from the start of the source.
    #[inline]
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Total length of the source, computed when it was opened.
    #[inline]
    pub fn len(&self) -> u64 {
        self.size
    }

    /// Returns `true` if the source has no bytes at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of bytes between the cursor and the end of the source.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.size.saturating_sub(self.cursor)
    }

    /// Moves the cursor to `pos`. Seeking past the end is allowed; the next read will fail.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        match self.source.as_mut() {
            None => return Err(Error::InvalidState),
            Some(Source::File { file, .. }) => {
                file.seek(SeekFrom::Start(pos))?;
            }
            Some(Source::Buffer(_)) => {}
        }
        self.cursor = pos;
        Ok(())
    }

    /// Fills `buf` from the cursor and advances the cursor by `buf.len()`.
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let needed = buf.len();
        let cursor = self.cursor;
        let available = self.size.saturating_sub(cursor);

        match self.source.as_mut() {
            None => return Err(Error::InvalidState),
            Some(Source::Buffer(data)) => {
                let rest = usize::try_from(cursor)
                    .ok()
                    .and_then(|c| data.get(c..))
                    .unwrap_or(&[]);
                if rest.len() < needed {
                    return Err(Error::short_read(needed, rest.len() as u64));
                }
                buf.copy_from_slice(&rest[..needed]);
            }
            Some(Source::File { file, .. }) => {
                if let Err(e) = file.read_exact(buf) {
                    // read_exact leaves the position unspecified on failure.
                    file.seek(SeekFrom::Start(cursor))?;
                    return Err(if e.kind() == ErrorKind::UnexpectedEof {
                        Error::short_read(needed, available)
                    } else {
                        e.into()
                    });
                }
            }
        }

        self.cursor += needed as u64;
        Ok(())
    }

    /// Reads a small array of bytes, with a constant length.
    #[inline(always)]
    pub fn read_cbytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Reads `len` bytes into a new `Vec`.
    ///
    /// The length is checked against the remaining size of the source before anything is
    /// allocated, so a corrupt length prefix cannot cause a huge allocation.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        if !self.is_loaded() {
            return Err(Error::InvalidState);
        }
        if len as u64 > self.remaining() {
            return Err(Error::short_read(len, self.remaining()));
        }
        let mut buf = vec![0u8; len];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Reads `len` signed bytes into a new `Vec`.
    pub fn read_chars(&mut self, len: usize) -> Result<Vec<i8>> {
        if !self.is_loaded() {
            return Err(Error::InvalidState);
        }
        if len as u64 > self.remaining() {
            return Err(Error::short_read(len, self.remaining()));
        }
        let mut chars = vec![0i8; len];
        self.fill(chars.as_mut_slice().as_mut_bytes())?;
        Ok(chars)
    }

    /// Reads a `bool`. Any nonzero byte is `true`.
    #[inline(always)]
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a single `u8` value.
    #[inline(always)]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(u8::from_le_bytes(self.read_cbytes()?))
    }

    /// Reads a single `i8` value.
    #[inline(always)]
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes(self.read_cbytes()?))
    }

    /// Reads a `u16` in little-endian byte order.
    #[inline(always)]
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_cbytes()?))
    }

    /// Reads a `u32` in little-endian byte order.
    #[inline(always)]
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_cbytes()?))
    }

    /// Reads a `u64` in little-endian byte order.
    #[inline(always)]
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_cbytes()?))
    }

    /// Reads a `u128` in little-endian byte order.
    #[inline(always)]
    pub fn read_u128(&mut self) -> Result<u128> {
        Ok(u128::from_le_bytes(self.read_cbytes()?))
    }

    /// Reads a `i16` in little-endian byte order.
    #[inline(always)]
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_cbytes()?))
    }

    /// Reads a `i32` in little-endian byte order.
    #[inline(always)]
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_cbytes()?))
    }

    /// Reads a `i64` in little-endian byte order.
    #[inline(always)]
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_cbytes()?))
    }

    /// Reads a `i128` in little-endian byte order.
    #[inline(always)]
    pub fn read_i128(&mut self) -> Result<i128> {
        Ok(i128::from_le_bytes(self.read_cbytes()?))
    }

    /// Reads an `f32` from its 4-byte IEEE-754 bit pattern.
    pub fn read_f32(&mut self) -> Result<f32> {
        check_width::<f32>("f32", 4)?;
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Reads an `f64` from its 8-byte IEEE-754 bit pattern.
    pub fn read_f64(&mut self) -> Result<f64> {
        check_width::<f64>("f64", 8)?;
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Reads a 16-byte float as an opaque bit pattern. See [`WideFloat`] for why the layout is
    /// not portable.
    #[cfg(feature = "wide-float")]
    pub fn read_wide_float(&mut self) -> Result<WideFloat> {
        check_width::<WideFloat>("WideFloat", WideFloat::WIDTH)?;
        Ok(WideFloat::from_le_bytes(self.read_cbytes()?))
    }

    /// Reads a variable-length unsigned integer.
    ///
    /// Each byte contributes its low 7 bits, least significant group first. A byte with the
    /// high bit set means another byte follows. At most 10 bytes are read; if the tenth still
    /// has the high bit set, this fails with `Error::MalformedVarInt`. The tenth byte only has
    /// room for bit 63, so it must be `0x00` or `0x01`; anything larger is also malformed.
    pub fn read_7bit_encoded_int(&mut self) -> Result<u64> {
        const MORE: u8 = 0x80;
        const LAST_SHIFT: u32 = (VARINT_MAX_GROUPS - 1) * 7;

        let mut shift: u32 = 0;
        let mut n: u64 = 0;

        loop {
            let b = self.read_u8()?;
            if shift == LAST_SHIFT && b > 0x01 {
                return Err(Error::MalformedVarInt {
                    max_groups: VARINT_MAX_GROUPS,
                });
            }
            n |= ((b & 0x7f) as u64) << shift;

            if (b & MORE) == 0 {
                return Ok(n);
            }

            shift += 7;
        }
    }

    /// Reads a variable-length integer and reinterprets its 64 bits as `i64`.
    pub fn read_7bit_encoded_i64(&mut self) -> Result<i64> {
        Ok(self.read_7bit_encoded_int()? as i64)
    }

    /// Reads exactly `len` bytes as a UTF-8 string. Embedded NUL bytes are kept.
    pub fn read_string(&mut self, len: usize) -> Result<String> {
        Ok(String::from_utf8(self.read_bytes(len)?)?)
    }

    /// Reads exactly `len` bytes as a string, replacing invalid UTF-8 sequences with the
    /// Unicode replacement character.
    pub fn read_string_lossy(&mut self, len: usize) -> Result<String> {
        let bytes = self.read_bytes(len)?;
        Ok(match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    /// Reads exactly `len` bytes as a byte string, without validating them.
    #[cfg(feature = "bstr")]
    pub fn read_bstring(&mut self, len: usize) -> Result<bstr::BString> {
        Ok(bstr::BString::from(self.read_bytes(len)?))
    }

    /// Reads a length-prefixed byte string: a variable-length byte count, then that many
    /// bytes.
    ///
    /// If the payload is truncated, the cursor is left just after the length prefix.
    pub fn read_bytes_ms(&mut self) -> Result<Vec<u8>> {
        let len = self.read_7bit_encoded_int()?;
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        self.read_bytes(len)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string_ms(&mut self) -> Result<String> {
        Ok(String::from_utf8(self.read_bytes_ms()?)?)
    }

    /// Reads a length-prefixed byte string as `bstr::BString`, without validating it.
    #[cfg(feature = "bstr")]
    pub fn read_bstring_ms(&mut self) -> Result<bstr::BString> {
        Ok(bstr::BString::from(self.read_bytes_ms()?))
    }
}
