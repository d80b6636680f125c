//! Fuzzes every accessor of the legacy F1 packet decoder.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_packet_decoder
#![no_main]
use f1_telemetry_packet::{PacketDecoder, ReadOptions, TelemetryField};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Short or garbage input must fall back, never panic.
    let packet = PacketDecoder::new(data);
    let _ = packet.summary();
    let _ = packet.kmh_speed(ReadOptions::raw(-1.0));
    let _ = packet.race_flag();
    let _ = packet.validate();
    for field in TelemetryField::ALL {
        let _ = packet.try_read(field);
    }
});
