use thiserror::Error;

/// Result type for every fallible operation in this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Error type shared by `BinaryReader`, `BinaryWriter` and the `fs_util` helpers.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying file or sink failed. A read that runs past the end of the source is
    /// reported here with `ErrorKind::UnexpectedEof`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The reader or writer has no source or sink open, either because it was closed or
    /// because it was never opened.
    #[error("no source or sink is open")]
    InvalidState,

    /// A variable-length integer did not terminate within the maximum number of groups.
    #[error("malformed 7-bit encoded integer: no terminating byte within {max_groups} groups")]
    MalformedVarInt {
        /// Number of groups read before giving up.
        max_groups: u32,
    },

    /// A caller-supplied length/offset pair does not fit the buffer it refers to.
    #[error("range error: length {length} at offset {start} does not fit in buffer of {buffer_size} bytes")]
    Range {
        /// Requested number of bytes.
        length: usize,
        /// Size of the buffer the range refers to.
        buffer_size: usize,
        /// Requested start offset.
        start: usize,
    },

    /// The native representation of a floating-point type does not have the width the wire
    /// format assumes.
    #[error("{type_name} is {actual} bytes wide (expected {expected})")]
    PlatformAssumption {
        /// Name of the native type.
        type_name: &'static str,
        /// Width assumed by the wire format.
        expected: usize,
        /// Width of the native type.
        actual: usize,
    },

    /// A string read as `String` was not well-formed UTF-8.
    #[error("string is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Backup rotation or deletion of an existing output file failed.
    #[error(transparent)]
    FileUtil(#[from] crate::fs_util::FileUtilError),
}

impl Error {
    /// Builds the error reported when a read needs more bytes than the source has left.
    pub(crate) fn short_read(needed: usize, available: u64) -> Self {
        Self::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("needed {needed} bytes but only {available} available"),
        ))
    }

    /// Returns `true` if this error is a read past the end of the source.
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}
