//! Fuzzes the bounds-checked little-endian reader with arbitrary offsets.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_read_f32
#![no_main]
use f1_telemetry_packet::read_f32;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (usize, Vec<u8>)| {
    let (offset, data) = input;
    let _ = read_f32(&data, offset);
});
