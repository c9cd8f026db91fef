//! Fuzz target for encode/decode round-trips on arbitrary trees.
//!
//! # Invariants
//!
//! - Every well-formed tree encodes without error
//! - The encoded length equals the memoized wire size
//! - Decoding the encoding reproduces an equal tree

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use owf_binary::{BinaryReader, BytesSource, encode_to_vec};
use owf_types::{Alarm, AllocPolicy, Channel, Event, Namespace, Package, Signal};

#[derive(Debug, Arbitrary)]
struct TreeInput {
    channels: Vec<ChannelInput>,
}

#[derive(Debug, Arbitrary)]
struct ChannelInput {
    id: Vec<u8>,
    namespaces: Vec<NamespaceInput>,
}

#[derive(Debug, Arbitrary)]
struct NamespaceInput {
    id: Vec<u8>,
    t0: i32,
    dt_minus_one: u16,
    signals: Vec<(Vec<u8>, Vec<u8>, Vec<f64>)>,
    events: Vec<(u16, Vec<u8>)>,
    alarms: Vec<(u16, u64, u8, u8, Vec<u8>, Vec<u8>)>,
}

fn build(input: TreeInput) -> Option<Package> {
    let policy = AllocPolicy::default();
    let mut package = Package::new();
    for channel_input in input.channels.into_iter().take(4) {
        let mut channel = Channel::with_id(channel_input.id);
        for ns_input in channel_input.namespaces.into_iter().take(3) {
            // Keep every timestamp inside [t0, t0 + dt).
            let t0 = i64::from(ns_input.t0);
            let dt = u64::from(ns_input.dt_minus_one) + 1;

            let mut ns = Namespace::with_id(ns_input.id);
            ns.set_t0(t0);
            ns.set_dt(dt);

            for (id, unit, samples) in ns_input.signals.into_iter().take(3) {
                let mut signal = Signal::with_id_unit(id, unit);
                signal.push_samples(&policy, &samples).ok()?;
                ns.push_signal(&policy, signal).ok()?;
            }
            for (offset, message) in ns_input.events.into_iter().take(3) {
                let mut event = Event::with_message(message);
                event.set_t0(t0 + (u64::from(offset) % dt) as i64);
                ns.push_event(&policy, event).ok()?;
            }
            for (offset, adt, level, volume, kind, message) in
                ns_input.alarms.into_iter().take(3)
            {
                let mut alarm = Alarm::with_type_message(kind, message);
                alarm.set_t0(t0 + (u64::from(offset) % dt) as i64);
                alarm.set_dt(adt);
                alarm.set_level(level);
                alarm.set_volume(volume);
                ns.push_alarm(&policy, alarm).ok()?;
            }
            channel.push_namespace(&policy, ns).ok()?;
        }
        package.push_channel(&policy, channel).ok()?;
    }
    Some(package)
}

fuzz_target!(|input: TreeInput| {
    let Some(package) = build(input) else { return };

    let Ok(bytes) = encode_to_vec(&package) else { return };
    assert_eq!(bytes.len() as u32, package.wire_size().unwrap());

    let decoded = BinaryReader::new(BytesSource::from(bytes))
        .materialize()
        .expect("round-trip decode must succeed");
    assert_eq!(decoded, package);
});
