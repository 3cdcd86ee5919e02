//! Width checks for floating-point types, and the optional 16-byte `WideFloat`.

use crate::{Error, Result};

/// Fails with `PlatformAssumption` unless `T` is exactly `expected` bytes wide. Floats are
/// encoded by reinterpreting their bits as a same-width integer, which is only meaningful
/// when the widths agree.
#[inline(always)]
pub(crate) fn check_width<T>(type_name: &'static str, expected: usize) -> Result<()> {
    let actual = core::mem::size_of::<T>();
    if actual == expected {
        Ok(())
    } else {
        Err(Error::PlatformAssumption {
            type_name,
            expected,
            actual,
        })
    }
}

/// A 16-byte extended or quad precision float, carried as its raw little-endian bit pattern.
///
/// Rust has no stable 128-bit float type, so this type does no arithmetic. It exists so that
/// files containing such values can be read and written back unchanged.
///
/// The bit layout is whatever the producer of the file used (x87 80-bit extended padded to 16
/// bytes, IEEE-754 binary128, or something else). It is not portable across toolchains or
/// platforms, and nothing here verifies it.
#[cfg(feature = "wide-float")]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct WideFloat([u8; 16]);

#[cfg(feature = "wide-float")]
impl WideFloat {
    /// Width of the encoded value, in bytes.
    pub const WIDTH: usize = 16;

    /// Constructs a value from its little-endian byte representation.
    pub const fn from_le_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Returns the little-endian byte representation.
    pub const fn to_le_bytes(self) -> [u8; 16] {
        self.0
    }

    /// Constructs a value from its raw bits.
    pub const fn from_bits(bits: u128) -> Self {
        Self(bits.to_le_bytes())
    }

    /// Returns the raw bits.
    pub const fn to_bits(self) -> u128 {
        u128::from_le_bytes(self.0)
    }
}
