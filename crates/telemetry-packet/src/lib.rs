//! Decoder for the Codemasters F1 legacy UDP telemetry packet.
//!
//! The legacy stream (F1 2017/2018 "UDP Format: legacy", port **20777**) is a
//! fixed-layout binary packet of at least [`MIN_PACKET_SIZE`] bytes where every
//! field is a little-endian `f32` at a known byte offset.
//!
//! | Field           | Offset | Transform                        |
//! |-----------------|--------|----------------------------------|
//! | lap time        | 4      | s → ms, floored                  |
//! | speed           | 28     | m/s, floored (km/h = ×3.6)       |
//! | throttle        | 116    | ×100                             |
//! | brake           | 124    | ×100                             |
//! | gear            | 132    | −1 (0 = reverse)                 |
//! | rpm             | 148    | rounded                          |
//! | position        | 156    | identity                         |
//! | drs             | 168    | `== 1.0`                         |
//! | fuel            | 180    | identity                         |
//! | in pits         | 188    | `== 1.0`                         |
//! | drs allowed     | 268    | `== 1.0`                         |
//! | flag            | 276    | identity                         |
//! | last lap time   | 349    | s → ms, **not** floored          |
//! | best lap time   | 357    | s → ms, floored                  |
//!
//! # Usage
//!
//! ```rust
//! use f1_telemetry_packet::{PacketDecoder, ReadOptions, field::OFF_SPEED};
//!
//! let mut raw = vec![0u8; f1_telemetry_packet::MIN_PACKET_SIZE];
//! raw[OFF_SPEED..OFF_SPEED + 4].copy_from_slice(&44.0f32.to_le_bytes());
//!
//! let packet = PacketDecoder::new(raw);
//! assert_eq!(packet.kmh_speed(ReadOptions::default()), 158.0);
//!
//! let idle = PacketDecoder::empty();
//! assert_eq!(idle.kmh_speed(ReadOptions::fallback(-1.0)), -1.0);
//! ```

#![deny(static_mut_refs)]

pub mod decoder;
pub mod error;
pub mod field;
pub mod options;
pub mod summary;

pub use decoder::{DEFAULT_PITS, DEFAULT_POSITION, MS_TO_KMH, PacketDecoder};
pub use error::DecodeError;
pub use field::{MIN_PACKET_SIZE, TelemetryField, read_f32};
pub use options::{ReadOptions, Rounding};
pub use summary::{RaceFlag, TelemetrySummary};
