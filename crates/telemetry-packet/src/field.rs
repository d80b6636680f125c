//! Legacy packet layout.
//!
//! The legacy stream is a fixed-layout binary packet where every field this
//! crate understands is a little-endian `f32` at a known byte offset. There is
//! no header, version byte or checksum.

use core::fmt;

use crate::DecodeError;

/// Width in bytes of every encoded field.
pub const FIELD_SIZE_BYTES: usize = 4;

/// Smallest packet that covers every known field (best lap time ends at 361).
pub const MIN_PACKET_SIZE: usize = OFF_BEST_LAP_TIME + FIELD_SIZE_BYTES;

// Byte offsets – all fields are little-endian `f32` (4 bytes each).
pub const OFF_LAP_TIME: usize = 4;
pub const OFF_SPEED: usize = 28;
pub const OFF_THROTTLE: usize = 116;
pub const OFF_BRAKE: usize = 124;
pub const OFF_GEAR: usize = 132;
pub const OFF_RPM: usize = 148;
pub const OFF_CAR_POSITION: usize = 156;
pub const OFF_DRS: usize = 168;
pub const OFF_FUEL_IN_TANK: usize = 180;
pub const OFF_IN_PITS: usize = 188;
pub const OFF_DRS_ALLOWED: usize = 268;
pub const OFF_VEHICLE_FLAG: usize = 276;
pub const OFF_LAST_LAP_TIME: usize = 349;
pub const OFF_BEST_LAP_TIME: usize = 357;

/// A named field of the legacy packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelemetryField {
    LapTime,
    Speed,
    Throttle,
    Brake,
    Gear,
    Rpm,
    Position,
    Drs,
    Fuel,
    Pits,
    DrsAllowed,
    Flag,
    LastLapTime,
    BestLapTime,
}

impl TelemetryField {
    /// Every field, ordered by ascending byte offset.
    pub const ALL: [TelemetryField; 14] = [
        TelemetryField::LapTime,
        TelemetryField::Speed,
        TelemetryField::Throttle,
        TelemetryField::Brake,
        TelemetryField::Gear,
        TelemetryField::Rpm,
        TelemetryField::Position,
        TelemetryField::Drs,
        TelemetryField::Fuel,
        TelemetryField::Pits,
        TelemetryField::DrsAllowed,
        TelemetryField::Flag,
        TelemetryField::LastLapTime,
        TelemetryField::BestLapTime,
    ];

    /// Byte offset of the field inside the packet.
    pub const fn offset(self) -> usize {
        match self {
            TelemetryField::LapTime => OFF_LAP_TIME,
            TelemetryField::Speed => OFF_SPEED,
            TelemetryField::Throttle => OFF_THROTTLE,
            TelemetryField::Brake => OFF_BRAKE,
            TelemetryField::Gear => OFF_GEAR,
            TelemetryField::Rpm => OFF_RPM,
            TelemetryField::Position => OFF_CAR_POSITION,
            TelemetryField::Drs => OFF_DRS,
            TelemetryField::Fuel => OFF_FUEL_IN_TANK,
            TelemetryField::Pits => OFF_IN_PITS,
            TelemetryField::DrsAllowed => OFF_DRS_ALLOWED,
            TelemetryField::Flag => OFF_VEHICLE_FLAG,
            TelemetryField::LastLapTime => OFF_LAST_LAP_TIME,
            TelemetryField::BestLapTime => OFF_BEST_LAP_TIME,
        }
    }

    /// One past the last byte of the field.
    pub const fn end(self) -> usize {
        self.offset() + FIELD_SIZE_BYTES
    }

    /// Stable snake_case name, used in logs and errors.
    pub const fn name(self) -> &'static str {
        match self {
            TelemetryField::LapTime => "lap_time",
            TelemetryField::Speed => "speed",
            TelemetryField::Throttle => "throttle",
            TelemetryField::Brake => "brake",
            TelemetryField::Gear => "gear",
            TelemetryField::Rpm => "rpm",
            TelemetryField::Position => "position",
            TelemetryField::Drs => "drs",
            TelemetryField::Fuel => "fuel",
            TelemetryField::Pits => "pits",
            TelemetryField::DrsAllowed => "drs_allowed",
            TelemetryField::Flag => "flag",
            TelemetryField::LastLapTime => "last_lap_time",
            TelemetryField::BestLapTime => "best_lap_time",
        }
    }

    /// Read this field from `data`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedPacket`] when `data` ends before the
    /// field does.
    pub fn read(self, data: &[u8]) -> Result<f32, DecodeError> {
        read_f32(data, self.offset()).ok_or(DecodeError::MalformedPacket {
            field: self,
            offset: self.offset(),
            end: self.end(),
            len: data.len(),
        })
    }
}

impl fmt::Display for TelemetryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read a little-endian `f32` from `data` at `offset`. Returns `None` if out of bounds.
pub fn read_f32(data: &[u8], offset: usize) -> Option<f32> {
    data.get(offset..offset.checked_add(FIELD_SIZE_BYTES)?)
        .and_then(|b| b.try_into().ok())
        .map(f32::from_le_bytes)
}
