//! Allocation policy for variable-length ingest.
//!
//! The decoder allocates buffers whose sizes come straight off the wire, so
//! every variable-length allocation is charged against a policy before any
//! buffer grows. A hostile packet claiming a multi-gigabyte string fails
//! the charge without touching the heap.

use thiserror::Error;

/// Default cap on a single allocation: 1 MiB.
pub const DEFAULT_MAX_ALLOC: usize = 1024 * 1024;

/// Errors from the allocation policy.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// A zero-byte allocation was requested
    #[error("can't allocate zero bytes")]
    Zero,

    /// The request exceeds the single-allocation cap
    #[error("allocation of {requested} bytes exceeds max of {max}")]
    TooLarge {
        /// Bytes requested
        requested: usize,
        /// Configured cap
        max: usize,
    },

    /// The underlying allocator could not satisfy the request
    #[error("allocation of {requested} bytes failed")]
    Failed {
        /// Bytes requested
        requested: usize,
    },
}

/// Bounds on how much a single buffer may grow.
///
/// Cheap to copy; readers and writers hold one by value and thread it into
/// every collection operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocPolicy {
    max_alloc: usize,
}

impl AllocPolicy {
    /// Policy with an explicit single-allocation cap in bytes.
    #[must_use]
    pub fn new(max_alloc: usize) -> Self {
        Self { max_alloc }
    }

    /// The configured single-allocation cap in bytes.
    #[must_use]
    pub fn max_alloc(&self) -> usize {
        self.max_alloc
    }

    /// Validate a request of `bytes` against the policy.
    ///
    /// Fails before any memory is reserved: zero-byte requests are
    /// rejected outright, as is anything above the cap.
    pub fn charge(&self, bytes: usize) -> Result<(), AllocError> {
        if bytes == 0 {
            Err(AllocError::Zero)
        } else if bytes > self.max_alloc {
            Err(AllocError::TooLarge { requested: bytes, max: self.max_alloc })
        } else {
            Ok(())
        }
    }
}

impl Default for AllocPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ALLOC)
    }
}
