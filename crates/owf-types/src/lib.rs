//! Data model for the Open Wire Format (OWF).
//!
//! OWF is a compact, length-prefixed binary container for time-series
//! telemetry. A [`Package`] owns [`Channel`]s; a channel owns
//! [`Namespace`]s; a namespace owns [`Signal`]s (sample arrays),
//! [`Event`]s (discrete points), and [`Alarm`]s (ongoing conditions).
//!
//! This crate holds everything both codec directions depend on: the entity
//! tree, the memoized wire-size engine, overflow-safe 32-bit arithmetic,
//! and the allocation policy that bounds variable-length ingest. The
//! binary encoder and decoder live in `owf-binary`.
//!
//! # Invariants
//!
//! - Every wire size is a multiple of 4 bytes. Strings reach alignment via
//!   a NUL terminator plus zero padding; sample arrays are 8-byte multiples.
//! - Size computation never wraps: all accumulation goes through
//!   [`arith`] and fails with an explicit error on overflow.
//! - An unmutated tree answers `wire_size()` idempotently; any mutation
//!   invalidates the affected memo before the next query.

pub mod alloc;
pub mod arith;
pub mod array;
pub mod memo;
pub mod model;
pub mod string;

pub use alloc::{AllocError, AllocPolicy, DEFAULT_MAX_ALLOC};
pub use arith::ArithError;
pub use array::{ArrayError, OwfArray};
pub use memo::SizeMemo;
pub use model::{Alarm, Channel, Duration, Event, MAGIC, Namespace, Package, Signal, Timestamp};
pub use string::OwfStr;

/// Packed numeric library version: the most significant nibble is the
/// major version, the next two nibbles the minor version, and the least
/// significant nibble the patch version.
pub const VERSION: u16 = 0x0090;

/// Major library version.
pub const VERSION_MAJOR: u8 = 0;

/// Minor library version.
pub const VERSION_MINOR: u8 = 9;

/// Patch library version.
pub const VERSION_PATCH: u8 = 0;

/// Library version string, mirrored from the crate manifest.
pub const VERSION_STRING: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_constants_agree() {
        let packed = (u16::from(VERSION_MAJOR) << 12)
            | (u16::from(VERSION_MINOR) << 4)
            | u16::from(VERSION_PATCH);
        assert_eq!(VERSION, packed);
        assert_eq!(
            VERSION_STRING,
            format!("{VERSION_MAJOR}.{VERSION_MINOR}.{VERSION_PATCH}")
        );
    }
}
