//! Blocking byte sources for the decoder.
//!
//! The decoder pulls bytes through [`ByteSource`]: fill the destination
//! exactly or fail. Any [`std::io::Read`] is a source (files, sockets,
//! `&[u8]`), and [`BytesSource`] adapts an in-memory [`Bytes`] buffer
//! with position tracking.

use std::io;

use bytes::{Buf, Bytes};

/// A blocking source of bytes.
///
/// `pull` must fill `dst` completely or return an error; there is no
/// partial-progress contract. A failed pull aborts the decode.
pub trait ByteSource {
    /// Fill `dst` exactly, blocking as needed.
    fn pull(&mut self, dst: &mut [u8]) -> io::Result<()>;
}

/// Every blocking reader is a byte source.
impl<R: io::Read> ByteSource for R {
    fn pull(&mut self, dst: &mut [u8]) -> io::Result<()> {
        self.read_exact(dst)
    }
}

/// Byte source over an in-memory [`Bytes`] buffer.
///
/// Decoding consumes the buffer front-to-back; [`BytesSource::remaining`]
/// reports what is left, which is useful for asserting that a packet was
/// consumed exactly. A short read fails without consuming anything.
#[derive(Debug, Clone)]
pub struct BytesSource {
    buf: Bytes,
}

impl BytesSource {
    /// Wrap a buffer.
    #[must_use]
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }
}

impl From<Vec<u8>> for BytesSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(Bytes::from(bytes))
    }
}

impl io::Read for BytesSource {
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        let n = self.buf.remaining().min(dst.len());
        self.buf.copy_to_slice(&mut dst[..n]);
        Ok(n)
    }

    /// All-or-nothing: the buffer is untouched when it cannot satisfy
    /// the whole read.
    fn read_exact(&mut self, dst: &mut [u8]) -> io::Result<()> {
        if self.buf.remaining() < dst.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "buffer exhausted: needed {} bytes, {} remaining",
                    dst.len(),
                    self.buf.remaining()
                ),
            ));
        }
        self.buf.copy_to_slice(dst);
        Ok(())
    }
}
