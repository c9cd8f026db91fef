//! The binary encoder: size-first frame writing.
//!
//! Encoding is the easy direction because every frame size is known
//! before its first byte is written: the memoized size engine computes
//! the whole tree's layout up front, and the writer emits length words
//! followed by bodies, top-down, in wire order.
//!
//! Two defensive checks run as bytes go out: every emitted length word
//! is audited for 4-alignment (a violation means a data-model bug, not
//! bad input), and event/alarm timestamps are re-validated against
//! their namespace interval so an ill-formed tree cannot produce a
//! packet the decoder would reject.

use owf_types::{
    Alarm, Channel, Event, MAGIC, Namespace, OwfStr, Package, Signal, arith,
};
use tracing::debug;

use crate::{error::EncodeError, sink::ByteSink};

/// Doubles held in the byteswap lookaside buffer between sink pushes.
const SWAP_BUF_DOUBLES: usize = 32;

/// Encoder over a [`ByteSink`].
#[derive(Debug)]
pub struct BinaryWriter<S> {
    sink: S,
    position: u64,
}

impl<S: ByteSink> BinaryWriter<S> {
    /// A writer pushing to `sink`.
    pub fn new(sink: S) -> Self {
        Self { sink, position: 0 }
    }

    /// Bytes pushed to the sink so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Recover the sink.
    pub fn into_inner(self) -> S {
        self.sink
    }

    /// Encode one packet: magic, outer body length, then every channel.
    ///
    /// The output is byte-for-byte determined by the tree; encoding the
    /// same tree twice produces identical packets.
    pub fn encode(&mut self, package: &Package) -> Result<(), EncodeError> {
        let size = package.wire_size()?;
        debug!(size, "encoding packet");

        self.write_u32(MAGIC)?;
        self.write_size(arith::sub32(size, 8)?)?;
        for channel in package.channels() {
            self.write_channel(channel)?;
        }
        Ok(())
    }

    // Scalar writes, big-endian

    fn push(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.sink.push(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    fn write_u8(&mut self, value: u8) -> Result<(), EncodeError> {
        self.push(&[value])
    }

    fn write_u16(&mut self, value: u16) -> Result<(), EncodeError> {
        self.push(&value.to_be_bytes())
    }

    fn write_u32(&mut self, value: u32) -> Result<(), EncodeError> {
        self.push(&value.to_be_bytes())
    }

    fn write_i64(&mut self, value: i64) -> Result<(), EncodeError> {
        self.push(&value.to_be_bytes())
    }

    fn write_u64(&mut self, value: u64) -> Result<(), EncodeError> {
        self.push(&value.to_be_bytes())
    }

    /// Emit a length word, auditing 4-alignment first.
    fn write_size(&mut self, length: u32) -> Result<(), EncodeError> {
        if length % 4 != 0 {
            return Err(EncodeError::MisalignedSize { length });
        }
        self.write_u32(length)
    }

    // Composite writes

    /// Emit a string frame: length word, bytes, NUL, zero padding.
    fn write_str(&mut self, value: &OwfStr) -> Result<(), EncodeError> {
        let body = arith::sub32(value.wire_size()?, 4)?;
        self.write_size(body)?;

        if body > 0 {
            self.push(value.as_bytes())?;
            self.write_u8(0)?;
            let padding = arith::sub32(body, arith::add32(value.len(), 1)?)?;
            for _ in 0..padding {
                self.write_u8(0)?;
            }
        }
        Ok(())
    }

    /// Emit a samples frame, byteswapping through a lookaside buffer.
    ///
    /// Samples convert to big-endian 32 doubles at a time so each sink
    /// push carries a full chunk rather than 8 bytes.
    fn write_samples(&mut self, samples: &[f64]) -> Result<(), EncodeError> {
        let length = arith::mul32(samples.len() as u32, 8)?;
        self.write_size(length)?;

        let mut buffer = [0u8; SWAP_BUF_DOUBLES * 8];
        for chunk in samples.chunks(SWAP_BUF_DOUBLES) {
            for (slot, sample) in buffer.chunks_exact_mut(8).zip(chunk) {
                slot.copy_from_slice(&sample.to_bits().to_be_bytes());
            }
            self.push(&buffer[..chunk.len() * 8])?;
        }
        Ok(())
    }

    fn write_signal(&mut self, signal: &Signal) -> Result<(), EncodeError> {
        self.write_str(signal.id())?;
        self.write_str(signal.unit())?;
        self.write_samples(signal.samples())
    }

    fn write_event(&mut self, ns: &Namespace, event: &Event) -> Result<(), EncodeError> {
        self.check_coverage(ns, event.t0())?;
        self.write_i64(event.t0())?;
        self.write_str(event.message())
    }

    fn write_alarm(&mut self, ns: &Namespace, alarm: &Alarm) -> Result<(), EncodeError> {
        self.check_coverage(ns, alarm.t0())?;
        self.write_i64(alarm.t0())?;
        self.write_u64(alarm.dt())?;

        // Level, volume, then two reserved bytes, always zero on write.
        self.write_u8(alarm.level())?;
        self.write_u8(alarm.volume())?;
        self.write_u16(0)?;

        self.write_str(alarm.kind())?;
        self.write_str(alarm.message())
    }

    fn write_namespace(&mut self, ns: &Namespace) -> Result<(), EncodeError> {
        let size = ns.wire_size()?;
        self.write_size(arith::sub32(size, 4)?)?;
        self.write_i64(ns.t0())?;
        self.write_u64(ns.dt())?;
        self.write_str(ns.id())?;

        let mut signals_size = 0u32;
        for signal in ns.signals() {
            signals_size = arith::add32(signals_size, signal.wire_size()?)?;
        }
        self.write_size(signals_size)?;
        for signal in ns.signals() {
            self.write_signal(signal)?;
        }

        let mut events_size = 0u32;
        for event in ns.events() {
            events_size = arith::add32(events_size, event.wire_size()?)?;
        }
        self.write_size(events_size)?;
        for event in ns.events() {
            self.write_event(ns, event)?;
        }

        let mut alarms_size = 0u32;
        for alarm in ns.alarms() {
            alarms_size = arith::add32(alarms_size, alarm.wire_size()?)?;
        }
        self.write_size(alarms_size)?;
        for alarm in ns.alarms() {
            self.write_alarm(ns, alarm)?;
        }

        Ok(())
    }

    fn write_channel(&mut self, channel: &Channel) -> Result<(), EncodeError> {
        let size = channel.wire_size()?;
        self.write_size(arith::sub32(size, 4)?)?;
        self.write_str(channel.id())?;
        for ns in channel.namespaces() {
            self.write_namespace(ns)?;
        }
        Ok(())
    }

    fn check_coverage(&self, ns: &Namespace, at: i64) -> Result<(), EncodeError> {
        if ns.covers(at) {
            return Ok(());
        }
        Err(EncodeError::Coverage {
            namespace: ns.id().to_string(),
            start: ns.t0(),
            end: i128::from(ns.t0()) + i128::from(ns.dt()),
            at,
        })
    }
}

/// Encode `package` into an exactly-sized buffer.
pub fn encode_to_vec(package: &Package) -> Result<Vec<u8>, EncodeError> {
    let size = package.wire_size()? as usize;
    let mut out = Vec::with_capacity(size);
    BinaryWriter::new(&mut out).encode(package)?;
    debug_assert_eq!(out.len(), size);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use owf_types::AllocPolicy;

    use super::*;

    fn policy() -> AllocPolicy {
        AllocPolicy::default()
    }

    #[test]
    fn empty_package_encodes_to_eight_bytes() {
        let bytes = encode_to_vec(&Package::new()).unwrap();
        assert_eq!(bytes, [0x4F, 0x57, 0x46, 0x31, 0, 0, 0, 0]);
    }

    #[test]
    fn single_channel_packet_layout() {
        let mut package = Package::new();
        package.push_channel(&policy(), Channel::with_id("BED_42")).unwrap();

        let bytes = encode_to_vec(&package).unwrap();
        assert_eq!(bytes.len(), 24);
        // Outer body length covers the channel frame.
        assert_eq!(&bytes[4..8], &16u32.to_be_bytes());
        // Channel frame length covers its id string frame.
        assert_eq!(&bytes[8..12], &12u32.to_be_bytes());
        // Id string: 8-byte payload = "BED_42" + NUL + one pad byte.
        assert_eq!(&bytes[12..16], &8u32.to_be_bytes());
        assert_eq!(&bytes[16..24], b"BED_42\0\0");
    }

    #[test]
    fn empty_string_is_a_bare_length_word() {
        let mut out = Vec::new();
        BinaryWriter::new(&mut out).write_str(&OwfStr::new()).unwrap();
        assert_eq!(out, 0u32.to_be_bytes());
    }

    #[test]
    fn samples_are_big_endian_bit_patterns() {
        let mut out = Vec::new();
        BinaryWriter::new(&mut out).write_samples(&[1.5]).unwrap();
        assert_eq!(&out[..4], &8u32.to_be_bytes());
        assert_eq!(&out[4..], &1.5f64.to_bits().to_be_bytes());
    }

    #[test]
    fn encoded_length_matches_wire_size() {
        let mut ns = Namespace::with_id("vitals");
        ns.set_t0(0);
        ns.set_dt(1000);
        let mut signal = Signal::with_id_unit("hr", "bpm");
        signal.push_samples(&policy(), &[60.0, 61.5, f64::NAN]).unwrap();
        ns.push_signal(&policy(), signal).unwrap();

        let mut channel = Channel::with_id("BED_42");
        channel.push_namespace(&policy(), ns).unwrap();
        let mut package = Package::new();
        package.push_channel(&policy(), channel).unwrap();

        let bytes = encode_to_vec(&package).unwrap();
        assert_eq!(bytes.len() as u32, package.wire_size().unwrap());
    }

    #[test]
    fn out_of_interval_event_fails_on_write() {
        let mut ns = Namespace::with_id("vitals");
        ns.set_t0(1000);
        ns.set_dt(500);
        let mut event = Event::with_message("late");
        event.set_t0(1500);
        ns.push_event(&policy(), event).unwrap();

        let mut channel = Channel::new();
        channel.push_namespace(&policy(), ns).unwrap();
        let mut package = Package::new();
        package.push_channel(&policy(), channel).unwrap();

        let err = encode_to_vec(&package).unwrap_err();
        assert_eq!(
            err,
            EncodeError::Coverage {
                namespace: "vitals".to_string(),
                start: 1000,
                end: 1500,
                at: 1500,
            }
        );
    }

    #[test]
    fn encoding_is_deterministic() {
        let mut package = Package::new();
        package.push_channel(&policy(), Channel::with_id("a")).unwrap();
        assert_eq!(encode_to_vec(&package).unwrap(), encode_to_vec(&package).unwrap());
    }
}
