use std::fs::File;
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use zerocopy::IntoBytes;

use crate::float::check_width;
use crate::{fs_util, Error, Result, VARINT_MAX_GROUPS};

#[cfg(feature = "wide-float")]
use crate::WideFloat;

/// Encodes binary values into a file or any other `Write` sink, using the same layout that
/// `BinaryReader` decodes.
///
/// Every `write_*` method returns `Err(Error::InvalidState)` once the writer has been closed.
/// [`total_bytes`](Self::total_bytes) counts every byte handed to the sink.
#[derive(Debug)]
pub struct BinaryWriter<W: Write = BufWriter<File>> {
    sink: Option<W>,
    path: Option<PathBuf>,
    total_bytes: u64,
}

impl BinaryWriter<BufWriter<File>> {
    /// Creates the file at `path` for writing.
    ///
    /// If a file already exists there, it is moved to `<path>.bak` when `backup` is `true`
    /// (replacing any older backup), and deleted otherwise.
    pub fn create(path: impl AsRef<Path>, backup: bool) -> Result<Self> {
        let path = path.as_ref();

        if fs_util::exists(path) {
            if backup {
                let bak = fs_util::backup_path(path);
                fs_util::move_file(path, &bak, true)?;
                log::debug!("backed up {} to {}", path.display(), bak.display());
            } else {
                fs_util::delete(path)?;
            }
        }

        let file = File::create(path)?;
        log::debug!("opened {} for writing", path.display());

        Ok(Self {
            sink: Some(BufWriter::new(file)),
            path: Some(path.to_path_buf()),
            total_bytes: 0,
        })
    }
}

impl<W: Write> BinaryWriter<W> {
    /// Wraps an existing sink.
    pub fn wrap(out: W) -> Self {
        Self {
            sink: Some(out),
            path: None,
            total_bytes: 0,
        }
    }

    /// Returns `true` until the writer is closed.
    pub fn is_loaded(&self) -> bool {
        self.sink.is_some()
    }

    /// Number of bytes written so far.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// The path of the output file, for writers made by [`create`](BinaryWriter::create).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Accesses the inner sink
    pub fn get_ref(&self) -> Option<&W> {
        self.sink.as_ref()
    }

    /// Accesses the inner sink
    pub fn inner_mut(&mut self) -> Option<&mut W> {
        self.sink.as_mut()
    }

    /// Extracts the inner sink, without flushing it. Returns `None` if the writer was closed.
    pub fn into_inner(mut self) -> Option<W> {
        self.sink.take()
    }

    /// Flushes the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.as_mut().ok_or(Error::InvalidState)?.flush()?;
        Ok(())
    }

    /// Flushes and releases the sink. Closing a writer that is already closed does nothing.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut sink) = self.sink.take() else {
            return Ok(());
        };
        sink.flush()?;
        if let Some(path) = &self.path {
            log::debug!("closed {} after {} bytes", path.display(), self.total_bytes);
        }
        Ok(())
    }

    /// Writes `bytes` to the output.
    ///
    /// If the sink fails partway, the bytes it did accept are still counted in
    /// [`total_bytes`](Self::total_bytes).
    pub fn write_bytes(&mut self, mut bytes: &[u8]) -> Result<()> {
        let sink = self.sink.as_mut().ok_or(Error::InvalidState)?;
        while !bytes.is_empty() {
            match sink.write(bytes) {
                Ok(0) => {
                    return Err(io::Error::new(
                        ErrorKind::WriteZero,
                        "failed to write whole buffer",
                    )
                    .into());
                }
                Ok(n) => {
                    self.total_bytes += n as u64;
                    bytes = &bytes[n..];
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Writes `length` bytes of `buf`, starting at `start`.
    ///
    /// Fails with `Error::Range` if `length` is larger than `buf`, or if the sub-range does
    /// not fit in `buf`.
    pub fn write_bytes_range(&mut self, buf: &[u8], length: usize, start: usize) -> Result<()> {
        let range = checked_range(buf.len(), length, start)?;
        self.write_bytes(&buf[range])
    }

    /// Writes signed bytes to the output.
    pub fn write_chars(&mut self, chars: &[i8]) -> Result<()> {
        self.write_bytes(chars.as_bytes())
    }

    /// Writes `length` signed bytes of `buf`, starting at `start`. Same checks as
    /// [`write_bytes_range`](Self::write_bytes_range).
    pub fn write_chars_range(&mut self, buf: &[i8], length: usize, start: usize) -> Result<()> {
        let range = checked_range(buf.len(), length, start)?;
        self.write_chars(&buf[range])
    }

    /// Writes a small, fixed-size array of bytes.
    pub fn write_cbytes<const N: usize>(&mut self, value: [u8; N]) -> Result<()> {
        self.write_bytes(&value)
    }

    /// Writes a `bool` value. True is encoded as 1. False is encoded as 0.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(value as u8)
    }

    /// Writes a single `u8` value
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    /// Writes a single `i8` value
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_bytes(&[value as u8])
    }

    /// Writes a single `u16` value
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_cbytes(value.to_le_bytes())
    }

    /// Writes a single `u32` value
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_cbytes(value.to_le_bytes())
    }

    /// Writes a single `u64` value
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_cbytes(value.to_le_bytes())
    }

    /// Writes a single `u128` value
    pub fn write_u128(&mut self, value: u128) -> Result<()> {
        self.write_cbytes(value.to_le_bytes())
    }

    /// Writes a single `i16` value
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_cbytes(value.to_le_bytes())
    }

    /// Writes a single `i32` value
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_cbytes(value.to_le_bytes())
    }

    /// Writes a single `i64` value
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_cbytes(value.to_le_bytes())
    }

    /// Writes a single `i128` value
    pub fn write_i128(&mut self, value: i128) -> Result<()> {
        self.write_cbytes(value.to_le_bytes())
    }

    /// Writes an `f32` value as its 4-byte IEEE-754 bit pattern, little-endian.
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        check_width::<f32>("f32", 4)?;
        self.write_u32(value.to_bits())
    }

    /// Writes an `f64` value as its 8-byte IEEE-754 bit pattern, little-endian.
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        check_width::<f64>("f64", 8)?;
        self.write_u64(value.to_bits())
    }

    /// Writes a 16-byte float bit pattern unchanged.
    #[cfg(feature = "wide-float")]
    pub fn write_wide_float(&mut self, value: WideFloat) -> Result<()> {
        check_width::<WideFloat>("WideFloat", WideFloat::WIDTH)?;
        self.write_u128(value.to_bits())
    }

    /// Writes the bytes of `s`, without a length prefix or terminator.
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        self.write_bytes(s.as_bytes())
    }

    /// Encodes a `u64` value using a variable-length encoding: 7 bits per byte, least
    /// significant group first, with the high bit set on every byte except the last.
    ///
    /// Values below 128 take one byte; `u64::MAX` takes ten.
    pub fn write_7bit_encoded_int(&mut self, value: u64) -> Result<()> {
        let mut buf = [0u8; VARINT_MAX_GROUPS as usize];
        let mut n = value;
        let mut len = 0;

        loop {
            if n < 0x80 {
                buf[len] = n as u8;
                len += 1;
                break;
            }
            buf[len] = (n & 0x7f) as u8 | 0x80;
            len += 1;
            n >>= 7;
        }

        self.write_bytes(&buf[..len])
    }

    /// Encodes an `i64` value using a variable-length encoding.
    ///
    /// Although this function takes `i64` values, applications should avoid using this for
    /// negative values. This function can correctly encode negative values, but every negative
    /// value is encoded with the maximum number of bytes, which wastes space.
    pub fn write_7bit_encoded_i64(&mut self, value: i64) -> Result<()> {
        self.write_7bit_encoded_int(value as u64)
    }

    /// Writes a byte string in length-prefixed form.
    pub fn write_bytes_ms(&mut self, s: &[u8]) -> Result<()> {
        self.write_7bit_encoded_int(s.len() as u64)?;
        self.write_bytes(s)
    }

    /// Writes a UTF-8 string in length-prefixed form. The prefix is the length in bytes.
    pub fn write_string_ms(&mut self, s: &str) -> Result<()> {
        self.write_bytes_ms(s.as_bytes())
    }
}

impl BinaryWriter<Vec<u8>> {
    /// Creates a new `BinaryWriter` over a `Vec<u8>`
    pub fn new() -> Self {
        Self::wrap(Vec::new())
    }

    /// Creates a new `BinaryWriter` over a `Vec<u8>` with the given capacity.
    pub fn with_capacity(len: usize) -> Self {
        Self::wrap(Vec::with_capacity(len))
    }

    /// The bytes written so far. Empty once the writer is closed.
    pub fn as_bytes(&self) -> &[u8] {
        self.sink.as_deref().unwrap_or(&[])
    }
}

impl Default for BinaryWriter<Vec<u8>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Drop for BinaryWriter<W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("failed to close binary writer: {e}");
        }
    }
}

fn checked_range(
    buffer_size: usize,
    length: usize,
    start: usize,
) -> Result<core::ops::Range<usize>> {
    let range_error = || Error::Range {
        length,
        buffer_size,
        start,
    };

    if length > buffer_size {
        return Err(range_error());
    }
    let end = start.checked_add(length).ok_or_else(range_error)?;
    if end > buffer_size {
        return Err(range_error());
    }
    Ok(start..end)
}
