//! Blocking byte sinks for the encoder.
//!
//! The encoder pushes bytes through [`ByteSink`]: accept the whole slice
//! or fail. Any [`std::io::Write`] is a sink, and [`BufSink`] adapts a
//! [`BufMut`] buffer such as [`bytes::BytesMut`].

use std::io;

use bytes::BufMut;

/// A blocking sink for bytes.
///
/// `push` must accept all of `src` or return an error; there is no
/// partial-progress contract. A failed push aborts the encode and the
/// output is considered invalid.
pub trait ByteSink {
    /// Write all of `src`, blocking as needed.
    fn push(&mut self, src: &[u8]) -> io::Result<()>;
}

/// Every blocking writer is a byte sink.
impl<W: io::Write> ByteSink for W {
    fn push(&mut self, src: &[u8]) -> io::Result<()> {
        self.write_all(src)
    }
}

/// Byte sink over any [`BufMut`] buffer.
///
/// Writes stop at the buffer's capacity, so encoding into a bounded
/// buffer fails cleanly instead of growing it.
#[derive(Debug)]
pub struct BufSink<B> {
    buf: B,
}

impl<B: BufMut> BufSink<B> {
    /// Wrap a buffer.
    #[must_use]
    pub fn new(buf: B) -> Self {
        Self { buf }
    }

    /// Recover the buffer once encoding is done.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.buf
    }
}

impl<B: BufMut> io::Write for BufSink<B> {
    fn write(&mut self, src: &[u8]) -> io::Result<usize> {
        let n = self.buf.remaining_mut().min(src.len());
        self.buf.put_slice(&src[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;

    #[test]
    fn buf_sink_appends() {
        let mut sink = BufSink::new(BytesMut::new());
        sink.push(&[1, 2]).unwrap();
        sink.push(&[3]).unwrap();
        assert_eq!(sink.into_inner().as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn bounded_buf_sink_fails_when_full() {
        let mut backing = [0u8; 2];
        let mut sink = BufSink::new(&mut backing[..]);
        sink.push(&[1, 2]).unwrap();
        let err = sink.push(&[3]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }

    #[test]
    fn vecs_are_sinks_via_write() {
        let mut out: Vec<u8> = Vec::new();
        ByteSink::push(&mut out, &[5, 6, 7]).unwrap();
        assert_eq!(out, vec![5, 6, 7]);
    }
}
