//! The OWF entity tree and its wire-size engine.
//!
//! A [`Package`] owns [`Channel`]s, a channel owns [`Namespace`]s, and a
//! namespace owns [`Signal`]s, [`Event`]s, and [`Alarm`]s. Ownership is
//! strict and acyclic: dropping a package drops everything beneath it.
//!
//! Every entity knows its encoded size. `wire_size()` recursively sums
//! children through checked arithmetic and memoizes the result; any
//! mutation that can change the wire layout invalidates the affected
//! memo, so a cached size is always current.
//!
//! # Ordering
//!
//! Entities form a total order so trees can be compared and sorted.
//! Comparison chains follow field order: identity strings first (length
//! before content), then timestamps, then children. Sample arrays
//! compare bit-wise so NaN does not poison the order.

use std::{cmp::Ordering, fmt};

use crate::{
    alloc::AllocPolicy,
    arith::{self, ArithError},
    array::{ArrayError, OwfArray},
    memo::SizeMemo,
    string::OwfStr,
};

/// Packet magic: "OWF1" in ASCII.
pub const MAGIC: u32 = 0x4F57_4631;

/// A point in time, in 100-nanosecond ticks since a caller-chosen epoch.
pub type Timestamp = i64;

/// A span of time, in 100-nanosecond ticks.
pub type Duration = u64;

fn sum_sizes<T>(
    start: u32,
    items: &OwfArray<T>,
    size_of: impl Fn(&T) -> Result<u32, ArithError>,
) -> Result<u32, ArithError> {
    let mut total = start;
    for item in items {
        total = arith::add32(total, size_of(item)?)?;
    }
    Ok(total)
}

fn cmp_samples(lhs: &[f64], rhs: &[f64]) -> Ordering {
    lhs.len().cmp(&rhs.len()).then_with(|| {
        for (a, b) in lhs.iter().zip(rhs) {
            let order = a.to_bits().cmp(&b.to_bits());
            if order != Ordering::Equal {
                return order;
            }
        }
        Ordering::Equal
    })
}

fn plural<'a>(n: u32, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}

/// Top-level container: an ordered sequence of channels.
#[derive(Debug, Clone, Default)]
pub struct Package {
    channels: OwfArray<Channel>,
    memo: SizeMemo,
}

impl Package {
    /// An empty package.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The owned channels, in wire order.
    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Append a channel.
    pub fn push_channel(
        &mut self,
        policy: &AllocPolicy,
        channel: Channel,
    ) -> Result<(), ArrayError> {
        self.memo.invalidate();
        self.channels.push(policy, channel)
    }

    /// Mutable access to a channel; invalidates the cached size.
    pub fn channel_mut(&mut self, index: u32) -> Result<&mut Channel, ArrayError> {
        self.memo.invalidate();
        self.channels.get_mut(index)
    }

    /// Total encoded size: magic, body length, and every channel frame.
    pub fn wire_size(&self) -> Result<u32, ArithError> {
        if let Some(cached) = self.memo.get() {
            return Ok(cached);
        }
        let size = sum_sizes(8, &self.channels, Channel::wire_size)?;
        Ok(self.memo.store(size))
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Package {}

impl PartialOrd for Package {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Package {
    fn cmp(&self, other: &Self) -> Ordering {
        self.channels.cmp_by(&other.channels, Channel::cmp)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.channels.len();
        write!(f, "#<Package: [{n} {}]>", plural(n, "channel", "channels"))
    }
}

/// A named stream of namespaces, e.g. one device or bed.
#[derive(Debug, Clone, Default)]
pub struct Channel {
    id: OwfStr,
    namespaces: OwfArray<Namespace>,
    memo: SizeMemo,
}

impl Channel {
    /// An empty channel with an empty id.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel with the given id and no namespaces.
    #[must_use]
    pub fn with_id(id: impl Into<OwfStr>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    /// The channel id; may be empty.
    #[must_use]
    pub fn id(&self) -> &OwfStr {
        &self.id
    }

    /// Replace the channel id.
    pub fn set_id(&mut self, id: impl Into<OwfStr>) {
        self.memo.invalidate();
        self.id = id.into();
    }

    /// The owned namespaces, in wire order.
    #[must_use]
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// Append a namespace.
    pub fn push_namespace(
        &mut self,
        policy: &AllocPolicy,
        ns: Namespace,
    ) -> Result<(), ArrayError> {
        self.memo.invalidate();
        self.namespaces.push(policy, ns)
    }

    /// Mutable access to a namespace; invalidates the cached size.
    pub fn namespace_mut(&mut self, index: u32) -> Result<&mut Namespace, ArrayError> {
        self.memo.invalidate();
        self.namespaces.get_mut(index)
    }

    /// Encoded size of this channel's frame, including its length word.
    pub fn wire_size(&self) -> Result<u32, ArithError> {
        if let Some(cached) = self.memo.get() {
            return Ok(cached);
        }
        let size = arith::add32(4, self.id.wire_size()?)?;
        let size = sum_sizes(size, &self.namespaces, Namespace::wire_size)?;
        Ok(self.memo.store(size))
    }
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Channel {}

impl PartialOrd for Channel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Channel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id
            .cmp(&other.id)
            .then_with(|| self.namespaces.cmp_by(&other.namespaces, Namespace::cmp))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.namespaces.len();
        write!(f, "#<Channel: {} [{n} {}]>", self.id, plural(n, "namespace", "namespaces"))
    }
}

/// A time interval holding signals, events, and alarms.
///
/// The half-open interval `[t0, t0 + dt)` must cover the timestamp of
/// every contained event and alarm; both codec directions enforce this.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    id: OwfStr,
    t0: Timestamp,
    dt: Duration,
    signals: OwfArray<Signal>,
    events: OwfArray<Event>,
    alarms: OwfArray<Alarm>,
    memo: SizeMemo,
}

impl Namespace {
    /// An empty namespace covering the empty interval `[0, 0)`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A namespace with the given id.
    #[must_use]
    pub fn with_id(id: impl Into<OwfStr>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    /// The namespace id.
    #[must_use]
    pub fn id(&self) -> &OwfStr {
        &self.id
    }

    /// Replace the namespace id.
    pub fn set_id(&mut self, id: impl Into<OwfStr>) {
        self.memo.invalidate();
        self.id = id.into();
    }

    /// Interval start, in 100-ns ticks.
    #[must_use]
    pub fn t0(&self) -> Timestamp {
        self.t0
    }

    /// Set the interval start. Does not affect the wire size.
    pub fn set_t0(&mut self, t0: Timestamp) {
        self.t0 = t0;
    }

    /// Interval length, in 100-ns ticks.
    #[must_use]
    pub fn dt(&self) -> Duration {
        self.dt
    }

    /// Set the interval length. Does not affect the wire size.
    pub fn set_dt(&mut self, dt: Duration) {
        self.dt = dt;
    }

    /// True when `t` falls inside the half-open interval `[t0, t0 + dt)`.
    ///
    /// Widened to 128-bit so `t0 + dt` cannot overflow.
    #[must_use]
    pub fn covers(&self, t: Timestamp) -> bool {
        let start = i128::from(self.t0);
        let end = start + i128::from(self.dt);
        let t = i128::from(t);
        t >= start && t < end
    }

    /// The owned signals, in wire order.
    #[must_use]
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// The owned events, in wire order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The owned alarms, in wire order.
    #[must_use]
    pub fn alarms(&self) -> &[Alarm] {
        &self.alarms
    }

    /// Append a signal.
    pub fn push_signal(&mut self, policy: &AllocPolicy, signal: Signal) -> Result<(), ArrayError> {
        self.memo.invalidate();
        self.signals.push(policy, signal)
    }

    /// Append an event.
    pub fn push_event(&mut self, policy: &AllocPolicy, event: Event) -> Result<(), ArrayError> {
        self.memo.invalidate();
        self.events.push(policy, event)
    }

    /// Append an alarm.
    pub fn push_alarm(&mut self, policy: &AllocPolicy, alarm: Alarm) -> Result<(), ArrayError> {
        self.memo.invalidate();
        self.alarms.push(policy, alarm)
    }

    /// Mutable access to a signal; invalidates the cached size.
    pub fn signal_mut(&mut self, index: u32) -> Result<&mut Signal, ArrayError> {
        self.memo.invalidate();
        self.signals.get_mut(index)
    }

    /// Mutable access to an event; invalidates the cached size.
    pub fn event_mut(&mut self, index: u32) -> Result<&mut Event, ArrayError> {
        self.memo.invalidate();
        self.events.get_mut(index)
    }

    /// Mutable access to an alarm; invalidates the cached size.
    pub fn alarm_mut(&mut self, index: u32) -> Result<&mut Alarm, ArrayError> {
        self.memo.invalidate();
        self.alarms.get_mut(index)
    }

    /// Encoded size of this namespace's frame, including its length word
    /// and the length words of the three child groups.
    pub fn wire_size(&self) -> Result<u32, ArithError> {
        if let Some(cached) = self.memo.get() {
            return Ok(cached);
        }

        // Length word, t0, dt, then the id.
        let size = arith::add32(4 + 8 + 8, self.id.wire_size()?)?;

        // Each child group carries its own length word.
        let signals = sum_sizes(4, &self.signals, Signal::wire_size)?;
        let events = sum_sizes(4, &self.events, Event::wire_size)?;
        let alarms = sum_sizes(4, &self.alarms, Alarm::wire_size)?;

        let size = arith::add32(size, signals)?;
        let size = arith::add32(size, events)?;
        let size = arith::add32(size, alarms)?;
        Ok(self.memo.store(size))
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Namespace {}

impl PartialOrd for Namespace {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Namespace {
    fn cmp(&self, other: &Self) -> Ordering {
        self.t0
            .cmp(&other.t0)
            .then_with(|| self.dt.cmp(&other.dt))
            .then_with(|| self.id.cmp(&other.id))
            .then_with(|| self.signals.cmp_by(&other.signals, Signal::cmp))
            .then_with(|| self.events.cmp_by(&other.events, Event::cmp))
            .then_with(|| self.alarms.cmp_by(&other.alarms, Alarm::cmp))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (s, e, a) = (self.signals.len(), self.events.len(), self.alarms.len());
        write!(
            f,
            "#<Namespace: {} [t0={}, dt={}, {s} {}, {e} {}, {a} {}]>",
            self.id,
            self.t0,
            self.dt,
            plural(s, "signal", "signals"),
            plural(e, "event", "events"),
            plural(a, "alarm", "alarms"),
        )
    }
}

/// A sampled waveform: id, unit, and an array of f64 samples.
///
/// Samples carry no time of their own; cadence is implied by the
/// enclosing namespace's interval.
#[derive(Debug, Clone, Default)]
pub struct Signal {
    id: OwfStr,
    unit: OwfStr,
    samples: OwfArray<f64>,
    memo: SizeMemo,
}

impl Signal {
    /// An empty signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal with the given id and unit and no samples.
    #[must_use]
    pub fn with_id_unit(id: impl Into<OwfStr>, unit: impl Into<OwfStr>) -> Self {
        Self { id: id.into(), unit: unit.into(), ..Self::default() }
    }

    /// The signal id.
    #[must_use]
    pub fn id(&self) -> &OwfStr {
        &self.id
    }

    /// Replace the signal id.
    pub fn set_id(&mut self, id: impl Into<OwfStr>) {
        self.memo.invalidate();
        self.id = id.into();
    }

    /// The unit label.
    #[must_use]
    pub fn unit(&self) -> &OwfStr {
        &self.unit
    }

    /// Replace the unit label.
    pub fn set_unit(&mut self, unit: impl Into<OwfStr>) {
        self.memo.invalidate();
        self.unit = unit.into();
    }

    /// The samples, in wire order.
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Append one sample.
    pub fn push_sample(&mut self, policy: &AllocPolicy, sample: f64) -> Result<(), ArrayError> {
        self.memo.invalidate();
        self.samples.push(policy, sample)
    }

    /// Append a slice of samples.
    pub fn push_samples(&mut self, policy: &AllocPolicy, samples: &[f64]) -> Result<(), ArrayError> {
        self.memo.invalidate();
        for &sample in samples {
            self.samples.push(policy, sample)?;
        }
        Ok(())
    }

    /// Reserve exact capacity for a known sample count, with no slack.
    ///
    /// Loads that know their final size (the decoder does) reserve once
    /// and then push without regrowth.
    pub fn reserve_samples(&mut self, policy: &AllocPolicy, count: u32) -> Result<(), ArrayError> {
        self.samples.reserve_exactly(policy, count)
    }

    /// Encoded size: both strings, the samples length word, and 8 bytes
    /// per sample. No signal-level length word exists on the wire.
    pub fn wire_size(&self) -> Result<u32, ArithError> {
        if let Some(cached) = self.memo.get() {
            return Ok(cached);
        }
        let size = arith::add32(self.id.wire_size()?, self.unit.wire_size()?)?;
        let samples = arith::mul32(self.samples.len(), 8)?;
        let size = arith::add32(size, arith::add32(4, samples)?)?;
        Ok(self.memo.store(size))
    }
}

impl PartialEq for Signal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Signal {}

impl PartialOrd for Signal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Signal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id
            .cmp(&other.id)
            .then_with(|| self.unit.cmp(&other.unit))
            .then_with(|| cmp_samples(&self.samples, &other.samples))
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.samples.len();
        write!(
            f,
            "#<Signal: [id={}, unit={}, {n} {}]>",
            self.id,
            self.unit,
            plural(n, "sample", "samples")
        )
    }
}

/// A discrete occurrence at a single point in time.
#[derive(Debug, Clone, Default)]
pub struct Event {
    t0: Timestamp,
    message: OwfStr,
    memo: SizeMemo,
}

impl Event {
    /// An event at tick 0 with an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An event with the given message at tick 0.
    #[must_use]
    pub fn with_message(message: impl Into<OwfStr>) -> Self {
        Self { message: message.into(), ..Self::default() }
    }

    /// The event timestamp.
    #[must_use]
    pub fn t0(&self) -> Timestamp {
        self.t0
    }

    /// Set the event timestamp. Does not affect the wire size.
    pub fn set_t0(&mut self, t0: Timestamp) {
        self.t0 = t0;
    }

    /// The event message.
    #[must_use]
    pub fn message(&self) -> &OwfStr {
        &self.message
    }

    /// Replace the event message.
    pub fn set_message(&mut self, message: impl Into<OwfStr>) {
        self.memo.invalidate();
        self.message = message.into();
    }

    /// Encoded size: the timestamp plus the message string.
    pub fn wire_size(&self) -> Result<u32, ArithError> {
        if let Some(cached) = self.memo.get() {
            return Ok(cached);
        }
        let size = arith::add32(8, self.message.wire_size()?)?;
        Ok(self.memo.store(size))
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.t0.cmp(&other.t0).then_with(|| self.message.cmp(&other.message))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<Event: [message={}, t0={}]>", self.message, self.t0)
    }
}

/// An ongoing condition with a level, a volume, a type, and a message.
///
/// The wire packs `level`, `volume`, and two reserved bytes into one
/// 4-byte group. Reserved bytes are written as zero and ignored on read;
/// they are not part of the model.
#[derive(Debug, Clone, Default)]
pub struct Alarm {
    t0: Timestamp,
    dt: Duration,
    level: u8,
    volume: u8,
    kind: OwfStr,
    message: OwfStr,
    memo: SizeMemo,
}

impl Alarm {
    /// An alarm at tick 0 with zero duration, level, and volume.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An alarm with the given type and message.
    #[must_use]
    pub fn with_type_message(kind: impl Into<OwfStr>, message: impl Into<OwfStr>) -> Self {
        Self { kind: kind.into(), message: message.into(), ..Self::default() }
    }

    /// The alarm onset timestamp.
    #[must_use]
    pub fn t0(&self) -> Timestamp {
        self.t0
    }

    /// Set the onset timestamp. Does not affect the wire size.
    pub fn set_t0(&mut self, t0: Timestamp) {
        self.t0 = t0;
    }

    /// The alarm duration.
    #[must_use]
    pub fn dt(&self) -> Duration {
        self.dt
    }

    /// Set the alarm duration. Does not affect the wire size.
    pub fn set_dt(&mut self, dt: Duration) {
        self.dt = dt;
    }

    /// Severity level.
    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Set the severity level. Does not affect the wire size.
    pub fn set_level(&mut self, level: u8) {
        self.level = level;
    }

    /// Audible volume.
    #[must_use]
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Set the audible volume. Does not affect the wire size.
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume;
    }

    /// The alarm type string.
    #[must_use]
    pub fn kind(&self) -> &OwfStr {
        &self.kind
    }

    /// Replace the alarm type string.
    pub fn set_kind(&mut self, kind: impl Into<OwfStr>) {
        self.memo.invalidate();
        self.kind = kind.into();
    }

    /// The alarm message.
    #[must_use]
    pub fn message(&self) -> &OwfStr {
        &self.message
    }

    /// Replace the alarm message.
    pub fn set_message(&mut self, message: impl Into<OwfStr>) {
        self.memo.invalidate();
        self.message = message.into();
    }

    /// Encoded size: timestamp, duration, the 4-byte detail group, and
    /// both strings.
    pub fn wire_size(&self) -> Result<u32, ArithError> {
        if let Some(cached) = self.memo.get() {
            return Ok(cached);
        }
        let size = arith::add32(8 + 8 + 4, self.kind.wire_size()?)?;
        let size = arith::add32(size, self.message.wire_size()?)?;
        Ok(self.memo.store(size))
    }
}

impl PartialEq for Alarm {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Alarm {}

impl PartialOrd for Alarm {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Alarm {
    fn cmp(&self, other: &Self) -> Ordering {
        self.t0
            .cmp(&other.t0)
            .then_with(|| self.dt.cmp(&other.dt))
            .then_with(|| self.level.cmp(&other.level))
            .then_with(|| self.volume.cmp(&other.volume))
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.message.cmp(&other.message))
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#<Alarm: [type={}, message={}, t0={}, dt={}, level={}, volume={}]>",
            self.kind, self.message, self.t0, self.dt, self.level, self.volume
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AllocPolicy {
        AllocPolicy::default()
    }

    #[test]
    fn empty_package_is_eight_bytes() {
        assert_eq!(Package::new().wire_size(), Ok(8));
    }

    #[test]
    fn single_channel_package_size() {
        // 8 (magic + body length) + 4 (channel length word)
        // + 12 ("BED_42": 4 header + 7 bytes with NUL + 1 pad) = 24.
        let mut package = Package::new();
        package.push_channel(&policy(), Channel::with_id("BED_42")).unwrap();
        assert_eq!(package.wire_size(), Ok(24));
    }

    #[test]
    fn empty_namespace_size() {
        // 4 length + 16 timestamps + 4 empty id + 3 * 4 group headers.
        assert_eq!(Namespace::new().wire_size(), Ok(36));
    }

    #[test]
    fn signal_size_counts_samples() {
        let mut signal = Signal::with_id_unit("hr", "bpm");
        signal.push_samples(&policy(), &[1.0, 2.0, 3.0]).unwrap();
        // id "hr" = 8, unit "bpm" = 8, samples header 4 + 3 * 8 = 28.
        assert_eq!(signal.wire_size(), Ok(44));
    }

    #[test]
    fn event_size_is_timestamp_plus_message() {
        assert_eq!(Event::with_message("ok").wire_size(), Ok(16));
        assert_eq!(Event::new().wire_size(), Ok(12));
    }

    #[test]
    fn alarm_size_includes_detail_group() {
        // 20 fixed, "spo2" = 4 + 5 + 3 = 12, "SpO2 low" = 4 + 9 + 3 = 16.
        let alarm = Alarm::with_type_message("spo2", "SpO2 low");
        assert_eq!(alarm.wire_size(), Ok(20 + 12 + 16));
    }

    #[test]
    fn push_invalidates_cached_size() {
        let mut package = Package::new();
        assert_eq!(package.wire_size(), Ok(8));
        package.push_channel(&policy(), Channel::new()).unwrap();
        // 8 + 4 (length word) + 4 (empty id) = 16.
        assert_eq!(package.wire_size(), Ok(16));
    }

    #[test]
    fn nested_mutation_invalidates_parents() {
        let mut package = Package::new();
        package.push_channel(&policy(), Channel::with_id("c")).unwrap();
        let before = package.wire_size().unwrap();

        package.channel_mut(0).unwrap().set_id("longer-channel-id");
        assert!(package.wire_size().unwrap() > before);
    }

    #[test]
    fn coverage_interval_is_half_open() {
        let mut ns = Namespace::new();
        ns.set_t0(1000);
        ns.set_dt(500);
        assert!(ns.covers(1000));
        assert!(ns.covers(1499));
        assert!(!ns.covers(1500));
        assert!(!ns.covers(999));
    }

    #[test]
    fn coverage_widens_past_i64_overflow() {
        let mut ns = Namespace::new();
        ns.set_t0(i64::MAX - 10);
        ns.set_dt(u64::MAX);
        // t0 + dt overflows i64 but the interval still covers i64::MAX.
        assert!(ns.covers(i64::MAX));
        assert!(!ns.covers(i64::MAX - 11));
    }

    #[test]
    fn zero_duration_covers_nothing() {
        let mut ns = Namespace::new();
        ns.set_t0(100);
        assert!(!ns.covers(100));
    }

    #[test]
    fn channel_ordering_by_id_then_children() {
        let a = Channel::with_id("a");
        let b = Channel::with_id("b");
        assert!(a < b);

        let mut a2 = Channel::with_id("a");
        a2.push_namespace(&policy(), Namespace::new()).unwrap();
        assert!(a < a2);
    }

    #[test]
    fn signal_ordering_handles_nan() {
        let mut x = Signal::with_id_unit("s", "u");
        let mut y = Signal::with_id_unit("s", "u");
        x.push_sample(&policy(), f64::NAN).unwrap();
        y.push_sample(&policy(), f64::NAN).unwrap();
        // Bit-wise comparison keeps NaN == NaN, so the order stays total.
        assert_eq!(x.cmp(&y), Ordering::Equal);
    }

    #[test]
    fn equal_trees_compare_equal() {
        let build = || {
            let mut ns = Namespace::with_id("vitals");
            ns.set_t0(10);
            ns.set_dt(100);
            let mut event = Event::with_message("admitted");
            event.set_t0(50);
            ns.push_event(&policy(), event).unwrap();

            let mut channel = Channel::with_id("BED_42");
            channel.push_namespace(&policy(), ns).unwrap();

            let mut package = Package::new();
            package.push_channel(&policy(), channel).unwrap();
            package
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn display_renders_counts() {
        let mut package = Package::new();
        package.push_channel(&policy(), Channel::with_id("BED_42")).unwrap();
        assert_eq!(package.to_string(), "#<Package: [1 channel]>");
        assert_eq!(package.channels()[0].to_string(), "#<Channel: BED_42 [0 namespaces]>");
    }
}
