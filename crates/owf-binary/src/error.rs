//! Error types for the binary codec.
//!
//! Decode errors form a closed set: every way a packet can be malformed
//! maps to exactly one variant, and every variant carries enough context
//! (expected vs. actual lengths, the namespace id on coverage
//! violations) to diagnose a bad packet from the message alone. There is
//! no local recovery; the first error aborts the whole operation.
//!
//! We avoid storing `std::io::Error` in the variants to maintain type
//! safety: source and sink failures are captured as [`io::ErrorKind`],
//! which keeps both enums `Clone` and comparable in assertions.

use std::io;

use owf_types::{AllocError, ArithError, ArrayError};
use thiserror::Error;

/// Errors from decoding a binary OWF packet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The top-level magic word did not match "OWF1"
    #[error("invalid magic header: {found:#010x}")]
    BadMagic {
        /// The word actually read
        found: u32,
    },

    /// A frame length is not a multiple of 4 bytes
    #[error("length was not 4-byte aligned (got {length} bytes)")]
    Alignment {
        /// The misaligned length
        length: u32,
    },

    /// A read would exceed the current frame's remaining budget
    #[error("read of {needed} bytes exceeds segment budget of {remaining}")]
    OutOfBounds {
        /// Bytes the read requires
        needed: u32,
        /// Bytes left in the segment
        remaining: u32,
    },

    /// A frame's body callback finished with bytes still unconsumed
    #[error("trailing data when reading segment: {remaining} bytes")]
    TrailingBytes {
        /// Residual byte count
        remaining: u32,
    },

    /// A non-empty string frame's last byte is not NUL
    #[error("string was not NUL-terminated")]
    StringNotNulTerminated,

    /// An event or alarm timestamp falls outside its namespace interval
    #[error(
        "time interval for namespace `{namespace}` [{start}, {end}) did not cover timestamp {at}"
    )]
    Coverage {
        /// Id of the enclosing namespace
        namespace: String,
        /// Interval start
        start: i64,
        /// Interval end, widened so `t0 + dt` cannot wrap
        end: i128,
        /// The offending timestamp
        at: i64,
    },

    /// A samples frame length is not a multiple of 8 bytes
    #[error("length of sample array is not 8-byte aligned (got {length} bytes)")]
    BadSampleLength {
        /// The misaligned length
        length: u32,
    },

    /// Size or budget arithmetic failed
    #[error(transparent)]
    Arith(#[from] ArithError),

    /// The allocation policy rejected a variable-length load
    #[error(transparent)]
    Alloc(#[from] AllocError),

    /// The byte source failed
    #[error("read error: {0}")]
    Io(io::ErrorKind),
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.kind())
    }
}

impl From<ArrayError> for DecodeError {
    fn from(err: ArrayError) -> Self {
        match err {
            ArrayError::Arith(inner) => Self::Arith(inner),
            ArrayError::Alloc(inner) => Self::Alloc(inner),
            // The decoder only appends; an index failure is unreachable
            // but maps somewhere sensible rather than panicking.
            ArrayError::IndexOutOfBounds { index, len } => {
                Self::OutOfBounds { needed: index, remaining: len }
            },
        }
    }
}

/// Errors from encoding a tree to the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A computed frame size is not a multiple of 4 bytes.
    ///
    /// The size engine produces aligned sizes for every well-formed
    /// tree, so this indicates a data-model bug, not bad input.
    #[error("length {length} was not a multiple of 4 bytes")]
    MisalignedSize {
        /// The misaligned length
        length: u32,
    },

    /// An event or alarm timestamp falls outside its namespace interval
    #[error(
        "time interval for namespace `{namespace}` [{start}, {end}) did not cover timestamp {at}"
    )]
    Coverage {
        /// Id of the enclosing namespace
        namespace: String,
        /// Interval start
        start: i64,
        /// Interval end, widened so `t0 + dt` cannot wrap
        end: i128,
        /// The offending timestamp
        at: i64,
    },

    /// Size arithmetic failed
    #[error(transparent)]
    Arith(#[from] ArithError),

    /// The byte sink failed
    #[error("write error: {0}")]
    Io(io::ErrorKind),
}

impl From<io::Error> for EncodeError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_render_context() {
        let err = DecodeError::BadMagic { found: 0xDEAD_BEEF };
        assert_eq!(err.to_string(), "invalid magic header: 0xdeadbeef");

        let err = DecodeError::OutOfBounds { needed: 8, remaining: 4 };
        assert_eq!(err.to_string(), "read of 8 bytes exceeds segment budget of 4");

        let err = DecodeError::Coverage {
            namespace: "vitals".to_string(),
            start: 1000,
            end: 1500,
            at: 1500,
        };
        assert_eq!(
            err.to_string(),
            "time interval for namespace `vitals` [1000, 1500) did not cover timestamp 1500"
        );
    }

    #[test]
    fn encode_errors_render_context() {
        let err = EncodeError::MisalignedSize { length: 7 };
        assert_eq!(err.to_string(), "length 7 was not a multiple of 4 bytes");
    }

    #[test]
    fn arith_errors_pass_through() {
        let err = DecodeError::from(ArithError::SubUnderflow { a: 0, b: 4 });
        assert_eq!(err.to_string(), "unsigned 32-bit subtraction underflow (0 - 4)");
    }

    #[test]
    fn io_failures_keep_the_kind() {
        let source_err = io::Error::new(io::ErrorKind::UnexpectedEof, "ran dry");
        assert_eq!(
            DecodeError::from(source_err),
            DecodeError::Io(io::ErrorKind::UnexpectedEof)
        );

        let sink_err = io::Error::new(io::ErrorKind::WriteZero, "full");
        assert_eq!(EncodeError::from(sink_err), EncodeError::Io(io::ErrorKind::WriteZero));
    }

    #[test]
    fn errors_compare_by_value() {
        let a = DecodeError::Alignment { length: 6 };
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, DecodeError::Alignment { length: 10 });
    }
}
