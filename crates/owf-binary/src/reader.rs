//! The binary decoder: a length-prefixed segment walker.
//!
//! Decoding is a single pass over the byte stream with one mutable
//! budget, `segment_length`: the bytes remaining in the frame currently
//! entered. Entering a frame reads its 4-byte length word, checks
//! 4-alignment, and runs a body; after the body the budget must be
//! exactly zero, or the frame had trailing bytes. Leaving restores the
//! outer budget minus what the frame consumed. Every read decrements
//! the budget through checked, alignment-verified subtraction.
//!
//! A visitor may cancel recursion: returning [`Control::Skip`] records
//! the remaining budget as a skip debt, which the enclosing frame
//! drains through a fixed 256-byte scratch buffer before its
//! trailing-bytes check. Skipped regions produce no further visitor
//! calls.
//!
//! # State machine
//!
//! Per frame: `Fresh -> Reading -> (SkipRequested | Complete)`.
//! `SkipRequested` unwinds to the nearest enclosing frame, which drains
//! to `Complete`. Errors are terminal and abort the whole decode.

use owf_types::{
    Alarm, AllocPolicy, Channel, Event, MAGIC, Namespace, OwfStr, Package, Signal,
    arith,
};
use tracing::{debug, trace};

use crate::{error::DecodeError, source::ByteSource};

/// On-stack scratch for draining skipped regions.
const SKIP_BUF_LEN: usize = 256;

/// A node handed to the visitor during a streaming decode.
///
/// Borrowed from decoder scratch: the entity is fully read (its own
/// fields, not its children) but owned by the walker, and dies when the
/// visitor returns.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    /// A channel; id is loaded, namespaces have not been read yet.
    Channel(&'a Channel),
    /// A namespace; header is loaded, child groups have not been read.
    Namespace(&'a Namespace),
    /// A fully loaded signal.
    Signal(&'a Signal),
    /// A fully loaded event.
    Event(&'a Event),
    /// A fully loaded alarm.
    Alarm(&'a Alarm),
}

/// Visitor verdict: descend into the node's subtree, or drop the rest
/// of the current segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Continue into children (and siblings within this segment).
    Recurse,
    /// Discard the remainder of the current segment, then resume at the
    /// next sibling frame.
    Skip,
}

/// Streaming/materializing decoder over a [`ByteSource`].
///
/// A reader decodes one packet per call; it may be reused for a
/// subsequent packet from the same source. Decoding is strictly
/// sequential and synchronous; the only blocking points are the
/// source's own reads.
#[derive(Debug)]
pub struct BinaryReader<S> {
    source: S,
    policy: AllocPolicy,
    segment_length: u32,
    skip_length: u32,
    position: u64,
}

impl<S: ByteSource> BinaryReader<S> {
    /// A reader with the default allocation policy.
    pub fn new(source: S) -> Self {
        Self::with_policy(source, AllocPolicy::default())
    }

    /// A reader with an explicit allocation policy.
    pub fn with_policy(source: S, policy: AllocPolicy) -> Self {
        Self { source, policy, segment_length: 0, skip_length: 0, position: 0 }
    }

    /// Bytes consumed from the source so far; useful in diagnostics.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Recover the source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Decode one packet, invoking `visit` once per node in depth-first
    /// pre-order.
    ///
    /// The visitor sees each node before its children are read and may
    /// return [`Control::Skip`] to discard the remainder of the node's
    /// segment. A skipped channel produces no namespace visits; later
    /// channels are unaffected.
    pub fn decode_with<F>(&mut self, mut visit: F) -> Result<(), DecodeError>
    where
        F: FnMut(Node<'_>) -> Control,
    {
        self.read_packet_header()?;
        self.unwrap_top(|r| {
            while r.segment_length > 0 {
                r.unwrap_frame(|r| r.read_channel_streaming(&mut visit))?;
            }
            Ok(())
        })?;
        debug!(bytes = self.position, "decoded packet");
        Ok(())
    }

    /// Decode one packet into an owned [`Package`] tree.
    ///
    /// On any failure the partially built tree is dropped before the
    /// error is returned; the caller never observes a half-built value.
    pub fn materialize(&mut self) -> Result<Package, DecodeError> {
        self.read_packet_header()?;
        let policy = self.policy;
        let mut package = Package::new();
        self.unwrap_top(|r| {
            while r.segment_length > 0 {
                let channel = r.unwrap_frame(Self::read_channel_tree)?;
                package.push_channel(&policy, channel)?;
            }
            Ok(())
        })?;
        debug!(
            bytes = self.position,
            channels = package.channels().len(),
            "materialized packet"
        );
        Ok(package)
    }

    /// Read and verify the magic word, then stage the budget for the
    /// outer length word.
    fn read_packet_header(&mut self) -> Result<(), DecodeError> {
        self.segment_length = 4;
        let magic = self.read_u32()?;
        if magic != MAGIC {
            return Err(DecodeError::BadMagic { found: magic });
        }
        self.segment_length = 4;
        Ok(())
    }

    // Budgeted reads

    /// Fill `dst` from the source, charging the segment budget.
    fn pull(&mut self, dst: &mut [u8]) -> Result<(), DecodeError> {
        let needed = dst.len() as u32;
        if needed == 0 {
            return Ok(());
        }
        if needed > self.segment_length {
            return Err(DecodeError::OutOfBounds { needed, remaining: self.segment_length });
        }
        self.source.pull(dst)?;
        self.position += u64::from(needed);
        self.segment_length = arith::sub32_aligned(self.segment_length, needed)?;
        Ok(())
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let mut buf = [0u8; 4];
        self.pull(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let mut buf = [0u8; 8];
        self.pull(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    fn read_i64(&mut self) -> Result<i64, DecodeError> {
        let mut buf = [0u8; 8];
        self.pull(&mut buf)?;
        Ok(i64::from_be_bytes(buf))
    }

    // The unwrap primitive

    /// Enter the packet's outermost frame, which has no enclosing
    /// budget to restore.
    fn unwrap_top<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        let length = self.read_u32()?;
        if length % 4 != 0 {
            return Err(DecodeError::Alignment { length });
        }
        self.enter(length, body)
    }

    /// Enter a nested frame, run `body`, and restore the enclosing
    /// budget.
    ///
    /// The frame's claimed length is checked against the parent's
    /// remaining budget before a single body byte is read, so a hostile
    /// length cannot pull the source past the parent frame.
    fn unwrap_frame<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        let length = self.read_u32()?;
        if length % 4 != 0 {
            return Err(DecodeError::Alignment { length });
        }
        let outer = self.segment_length;
        if length > outer {
            return Err(DecodeError::OutOfBounds { needed: length, remaining: outer });
        }

        let out = self.enter(length, body)?;
        self.segment_length = arith::sub32_aligned(outer, length)?;
        Ok(out)
    }

    /// Run a frame body against a budget of exactly `length` bytes,
    /// drain any skip debt the body left behind, and require the budget
    /// to land on zero.
    fn enter<T>(
        &mut self,
        length: u32,
        body: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        trace!(length, position = self.position, "entering frame");
        self.segment_length = length;
        self.skip_length = 0;
        let out = body(self)?;

        self.drain_skip()?;
        if self.segment_length > 0 {
            return Err(DecodeError::TrailingBytes { remaining: self.segment_length });
        }
        Ok(out)
    }

    /// Record the rest of the current segment as skip debt.
    fn begin_skip(&mut self) {
        self.skip_length = self.segment_length;
    }

    /// Consume and discard pending skip debt through the scratch buffer.
    fn drain_skip(&mut self) -> Result<(), DecodeError> {
        if self.skip_length == 0 {
            return Ok(());
        }
        let total = self.skip_length;
        let mut scratch = [0u8; SKIP_BUF_LEN];
        while self.skip_length > 0 {
            let take = self.skip_length.min(SKIP_BUF_LEN as u32) as usize;
            self.pull(&mut scratch[..take])?;
            self.skip_length -= take as u32;
        }
        trace!(bytes = total, "drained skipped segment");
        Ok(())
    }

    // Leaf payloads

    /// Read a whole string frame (length word handled by the caller's
    /// unwrap): the current segment is the payload.
    fn read_str(&mut self) -> Result<OwfStr, DecodeError> {
        self.unwrap_frame(Self::read_str_body)
    }

    fn read_str_body(&mut self) -> Result<OwfStr, DecodeError> {
        let length = self.segment_length;
        if length == 0 {
            return Ok(OwfStr::new());
        }
        self.policy.charge(length as usize)?;

        let mut payload = Vec::new();
        payload
            .try_reserve_exact(length as usize)
            .map_err(|_| owf_types::AllocError::Failed { requested: length as usize })?;
        payload.resize(length as usize, 0);
        self.pull(&mut payload)?;

        if payload.last() != Some(&0) {
            return Err(DecodeError::StringNotNulTerminated);
        }
        Ok(OwfStr::from_wire_payload(payload))
    }

    /// Read a samples frame body into `signal`.
    ///
    /// The segment length must be a multiple of 8; each 8-byte group is
    /// a big-endian bit pattern reinterpreted as `f64`. One exact
    /// reservation covers the whole array; bytes stream through a
    /// fixed-size chunk to bound peak scratch space.
    fn read_samples_body(&mut self, signal: &mut Signal) -> Result<(), DecodeError> {
        let length = self.segment_length;
        if length % 8 != 0 {
            return Err(DecodeError::BadSampleLength { length });
        }
        if length == 0 {
            return Ok(());
        }

        let policy = self.policy;
        signal.reserve_samples(&policy, length / 8)?;

        let mut chunk = [0u8; SKIP_BUF_LEN];
        let mut remaining = length;
        while remaining > 0 {
            let take = remaining.min(SKIP_BUF_LEN as u32) as usize;
            self.pull(&mut chunk[..take])?;
            for group in chunk[..take].chunks_exact(8) {
                let mut bits = [0u8; 8];
                bits.copy_from_slice(group);
                let sample = f64::from_bits(u64::from_be_bytes(bits));
                signal.push_sample(&policy, sample)?;
            }
            remaining -= take as u32;
        }
        Ok(())
    }

    // Entity readers, shared by both modes

    fn read_signal(&mut self) -> Result<Signal, DecodeError> {
        let id = self.read_str()?;
        let unit = self.read_str()?;
        let mut signal = Signal::with_id_unit(id, unit);
        self.unwrap_frame(|r| r.read_samples_body(&mut signal))?;
        Ok(signal)
    }

    fn read_event(&mut self, ns: &Namespace) -> Result<Event, DecodeError> {
        let t0 = self.read_i64()?;
        self.check_coverage(ns, t0)?;
        let mut event = Event::with_message(self.read_str()?);
        event.set_t0(t0);
        Ok(event)
    }

    fn read_alarm(&mut self, ns: &Namespace) -> Result<Alarm, DecodeError> {
        let t0 = self.read_i64()?;
        self.check_coverage(ns, t0)?;
        let dt = self.read_u64()?;

        // Level, volume, and two reserved bytes in one 4-byte group.
        // Reserved bytes may hold anything; they are not surfaced.
        let mut details = [0u8; 4];
        self.pull(&mut details)?;

        let kind = self.read_str()?;
        let message = self.read_str()?;

        let mut alarm = Alarm::with_type_message(kind, message);
        alarm.set_t0(t0);
        alarm.set_dt(dt);
        alarm.set_level(details[0]);
        alarm.set_volume(details[1]);
        Ok(alarm)
    }

    fn read_namespace_header(&mut self) -> Result<Namespace, DecodeError> {
        let t0 = self.read_i64()?;
        let dt = self.read_u64()?;
        let mut ns = Namespace::with_id(self.read_str()?);
        ns.set_t0(t0);
        ns.set_dt(dt);
        Ok(ns)
    }

    fn check_coverage(&self, ns: &Namespace, at: i64) -> Result<(), DecodeError> {
        if ns.covers(at) {
            return Ok(());
        }
        Err(DecodeError::Coverage {
            namespace: ns.id().to_string(),
            start: ns.t0(),
            end: i128::from(ns.t0()) + i128::from(ns.dt()),
            at,
        })
    }

    // Streaming walk

    fn read_channel_streaming<F>(&mut self, visit: &mut F) -> Result<(), DecodeError>
    where
        F: FnMut(Node<'_>) -> Control,
    {
        let channel = Channel::with_id(self.read_str()?);
        if visit(Node::Channel(&channel)) == Control::Skip {
            self.begin_skip();
            return Ok(());
        }
        while self.segment_length > 0 {
            self.unwrap_frame(|r| r.read_namespace_streaming(visit))?;
        }
        Ok(())
    }

    fn read_namespace_streaming<F>(&mut self, visit: &mut F) -> Result<(), DecodeError>
    where
        F: FnMut(Node<'_>) -> Control,
    {
        let ns = self.read_namespace_header()?;
        if visit(Node::Namespace(&ns)) == Control::Skip {
            self.begin_skip();
            return Ok(());
        }

        self.unwrap_frame(|r| {
            while r.segment_length > 0 && r.skip_length == 0 {
                let signal = r.read_signal()?;
                if visit(Node::Signal(&signal)) == Control::Skip {
                    r.begin_skip();
                }
            }
            Ok(())
        })?;

        self.unwrap_frame(|r| {
            while r.segment_length > 0 && r.skip_length == 0 {
                let event = r.read_event(&ns)?;
                if visit(Node::Event(&event)) == Control::Skip {
                    r.begin_skip();
                }
            }
            Ok(())
        })?;

        self.unwrap_frame(|r| {
            while r.segment_length > 0 && r.skip_length == 0 {
                let alarm = r.read_alarm(&ns)?;
                if visit(Node::Alarm(&alarm)) == Control::Skip {
                    r.begin_skip();
                }
            }
            Ok(())
        })?;

        Ok(())
    }

    // Materializing walk

    fn read_channel_tree(&mut self) -> Result<Channel, DecodeError> {
        let mut channel = Channel::with_id(self.read_str()?);
        let policy = self.policy;
        while self.segment_length > 0 {
            let ns = self.unwrap_frame(Self::read_namespace_tree)?;
            channel.push_namespace(&policy, ns)?;
        }
        Ok(channel)
    }

    fn read_namespace_tree(&mut self) -> Result<Namespace, DecodeError> {
        let mut ns = self.read_namespace_header()?;
        let policy = self.policy;

        self.unwrap_frame(|r| {
            while r.segment_length > 0 {
                let signal = r.read_signal()?;
                ns.push_signal(&policy, signal)?;
            }
            Ok(())
        })?;

        self.unwrap_frame(|r| {
            while r.segment_length > 0 {
                let event = r.read_event(&ns)?;
                ns.push_event(&policy, event)?;
            }
            Ok(())
        })?;

        self.unwrap_frame(|r| {
            while r.segment_length > 0 {
                let alarm = r.read_alarm(&ns)?;
                ns.push_alarm(&policy, alarm)?;
            }
            Ok(())
        })?;

        Ok(ns)
    }
}

#[cfg(test)]
mod tests {
    use crate::source::BytesSource;

    use super::*;

    fn reader(bytes: Vec<u8>) -> BinaryReader<BytesSource> {
        BinaryReader::new(BytesSource::from(bytes))
    }

    #[test]
    fn empty_packet_materializes_to_empty_package() {
        let bytes = vec![0x4F, 0x57, 0x46, 0x31, 0, 0, 0, 0];
        let package = reader(bytes).materialize().unwrap();
        assert!(package.channels().is_empty());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let bytes = vec![0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 0];
        let err = reader(bytes).materialize().unwrap_err();
        assert_eq!(err, DecodeError::BadMagic { found: 0xDEAD_BEEF });
    }

    #[test]
    fn misaligned_body_length_is_rejected() {
        let mut bytes = vec![0x4F, 0x57, 0x46, 0x31];
        bytes.extend_from_slice(&6u32.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 6]);
        let err = reader(bytes).materialize().unwrap_err();
        assert_eq!(err, DecodeError::Alignment { length: 6 });
    }

    #[test]
    fn truncated_body_fails() {
        // Declares 16 body bytes but supplies 8.
        let mut bytes = vec![0x4F, 0x57, 0x46, 0x31];
        bytes.extend_from_slice(&16u32.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 8]);
        let err = reader(bytes).materialize().unwrap_err();
        assert!(matches!(err, DecodeError::Io(_) | DecodeError::OutOfBounds { .. }));
    }

    #[test]
    fn child_frame_larger_than_parent_budget_is_out_of_bounds() {
        // Body claims 8 bytes; the channel frame inside claims 64.
        let mut bytes = vec![0x4F, 0x57, 0x46, 0x31];
        bytes.extend_from_slice(&8u32.to_be_bytes());
        bytes.extend_from_slice(&64u32.to_be_bytes());
        bytes.extend_from_slice(&4u32.to_be_bytes());
        // Plenty of source bytes so the failure is budget, not EOF.
        bytes.extend_from_slice(&[0u8; 64]);
        let err = reader(bytes).materialize().unwrap_err();
        assert_eq!(err, DecodeError::OutOfBounds { needed: 64, remaining: 4 });
    }

    #[test]
    fn position_tracks_consumed_bytes() {
        let bytes = vec![0x4F, 0x57, 0x46, 0x31, 0, 0, 0, 0];
        let mut r = reader(bytes);
        r.materialize().unwrap();
        assert_eq!(r.position(), 8);
    }
}
