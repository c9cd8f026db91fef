//! Snapshot tests for the human-readable entity renderings.

use insta::assert_snapshot;
use owf_types::{Alarm, AllocPolicy, Channel, Event, Namespace, Package, Signal};

fn policy() -> AllocPolicy {
    AllocPolicy::default()
}

#[test]
fn package_rendering() {
    let mut package = Package::new();
    assert_snapshot!(package.to_string(), @"#<Package: [0 channels]>");

    package.push_channel(&policy(), Channel::with_id("BED_42")).unwrap();
    assert_snapshot!(package.to_string(), @"#<Package: [1 channel]>");
}

#[test]
fn channel_rendering() {
    let mut channel = Channel::with_id("BED_42");
    channel.push_namespace(&policy(), Namespace::with_id("vitals")).unwrap();
    assert_snapshot!(channel.to_string(), @"#<Channel: BED_42 [1 namespace]>");
}

#[test]
fn namespace_rendering() {
    let mut ns = Namespace::with_id("vitals");
    ns.set_t0(1000);
    ns.set_dt(500);
    let mut signal = Signal::with_id_unit("hr", "bpm");
    signal.push_samples(&policy(), &[60.0, 61.0]).unwrap();
    ns.push_signal(&policy(), signal).unwrap();

    let mut event = Event::with_message("admitted");
    event.set_t0(1200);
    ns.push_event(&policy(), event).unwrap();

    assert_snapshot!(
        ns.to_string(),
        @"#<Namespace: vitals [t0=1000, dt=500, 1 signal, 1 event, 0 alarms]>"
    );
    assert_snapshot!(
        ns.signals()[0].to_string(),
        @"#<Signal: [id=hr, unit=bpm, 2 samples]>"
    );
    assert_snapshot!(
        ns.events()[0].to_string(),
        @"#<Event: [message=admitted, t0=1200]>"
    );
}

#[test]
fn alarm_rendering() {
    let mut alarm = Alarm::with_type_message("spo2", "SpO2 low");
    alarm.set_t0(1100);
    alarm.set_dt(50);
    alarm.set_level(3);
    alarm.set_volume(200);
    assert_snapshot!(
        alarm.to_string(),
        @"#<Alarm: [type=spo2, message=SpO2 low, t0=1100, dt=50, level=3, volume=200]>"
    );
}
