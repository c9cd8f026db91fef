//! Fuzz target for the binary decoder on arbitrary bytes.
//!
//! # Strategy
//!
//! - Raw bytes: completely arbitrary input (general malformation)
//! - Magic-prefixed: valid magic followed by arbitrary framing, so the
//!   walker itself gets exercised rather than the magic check
//! - Both decode modes: materialization and a skip-happy visitor
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - Hostile length words fail the allocation policy before allocating
//! - A visitor that skips everything still terminates

#![no_main]

use libfuzzer_sys::fuzz_target;
use owf_binary::{BinaryReader, BytesSource, Control};

fuzz_target!(|data: &[u8]| {
    // Materialization on the raw input.
    let source = BytesSource::from(data.to_vec());
    let _ = BinaryReader::new(source).materialize();

    // Same bytes behind a valid magic word, so deeper walker states are
    // reachable even when the corpus lacks the prefix.
    let mut prefixed = b"OWF1".to_vec();
    prefixed.extend_from_slice(data);
    let _ = BinaryReader::new(BytesSource::from(prefixed.clone())).materialize();

    // Streaming mode with a visitor that skips every other node.
    let mut toggle = false;
    let _ = BinaryReader::new(BytesSource::from(prefixed)).decode_with(|_| {
        toggle = !toggle;
        if toggle { Control::Recurse } else { Control::Skip }
    });
});
