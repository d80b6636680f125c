//! Immutable decoded view over one legacy packet.

use std::sync::Arc;

use tracing::debug;

use crate::summary::{RaceFlag, TelemetrySummary};
use crate::{DecodeError, ReadOptions, Rounding, TelemetryField};

/// Metres per second to kilometres per hour.
pub const MS_TO_KMH: f64 = 3.6;

/// Conventional car-position fallback for legacy stream consumers.
pub const DEFAULT_POSITION: f64 = 20.0;

/// Conventional pit-lane fallback for legacy stream consumers.
pub const DEFAULT_PITS: bool = true;

/// Snapshot of one packet, or of no packet at all.
///
/// A decoder is bound at construction and never changes afterwards. Clones
/// share the underlying bytes.
///
/// When nothing is bound every accessor returns the caller's fallback without
/// touching any buffer. When a packet is bound but ends before a field does,
/// the accessor also returns the fallback and emits a `debug` trace event;
/// use [`PacketDecoder::try_read`] or [`PacketDecoder::validate`] to observe
/// that condition as a [`DecodeError`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketDecoder {
    raw: Option<Arc<[u8]>>,
}

impl PacketDecoder {
    /// Bind a packet. An empty buffer binds nothing.
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        let raw: Arc<[u8]> = bytes.into();
        if raw.is_empty() {
            return Self::empty();
        }
        Self { raw: Some(raw) }
    }

    /// Bind nothing.
    pub const fn empty() -> Self {
        Self { raw: None }
    }

    pub fn from_option(bytes: Option<Arc<[u8]>>) -> Self {
        bytes.map(Self::new).unwrap_or_default()
    }

    pub fn has_data(&self) -> bool {
        self.raw.is_some()
    }

    /// Length of the bound packet, 0 when nothing is bound.
    pub fn len(&self) -> usize {
        self.raw.as_deref().map_or(0, <[u8]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }

    /// Bounds-checked raw read of one field.
    ///
    /// Returns `Ok(None)` when nothing is bound.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedPacket`] when the bound packet is
    /// shorter than the field's end offset.
    pub fn try_read(&self, field: TelemetryField) -> Result<Option<f32>, DecodeError> {
        self.raw
            .as_deref()
            .map(|data| field.read(data))
            .transpose()
    }

    /// Check that the bound packet covers every known field.
    ///
    /// # Errors
    ///
    /// Returns the error for the lowest-offset field that does not fit.
    pub fn validate(&self) -> Result<(), DecodeError> {
        TelemetryField::ALL
            .iter()
            .try_for_each(|field| self.try_read(*field).map(drop))
    }

    fn read(&self, field: TelemetryField) -> Option<f32> {
        let data = self.raw.as_deref()?;
        match field.read(data) {
            Ok(value) => Some(value),
            Err(error) => {
                debug!(
                    field = field.name(),
                    offset = field.offset(),
                    len = data.len(),
                    error = %error,
                    "packet too short for field; using fallback"
                );
                None
            }
        }
    }

    fn decode<T>(
        &self,
        field: TelemetryField,
        options: ReadOptions<T>,
        transform: impl FnOnce(f32, Rounding) -> T,
    ) -> T {
        match self.read(field) {
            Some(raw) => transform(raw, options.rounding),
            None => options.fallback,
        }
    }

    /// Speed in m/s, floored unless raw.
    pub fn speed(&self, options: ReadOptions<f64>) -> f64 {
        self.decode(TelemetryField::Speed, options, |raw, rounding| {
            floor_unless_raw(f64::from(raw), rounding)
        })
    }

    /// Speed in km/h, derived from the floored m/s speed.
    ///
    /// `floor(floor(m/s) * 3.6)`; raw skips only the outer floor, so 44.75 m/s
    /// reads as 158 (or 158.4 raw), not 161.
    pub fn kmh_speed(&self, options: ReadOptions<f64>) -> f64 {
        self.decode(TelemetryField::Speed, options, |raw, rounding| {
            floor_unless_raw(f64::from(raw).floor() * MS_TO_KMH, rounding)
        })
    }

    /// Engine rpm, rounded to nearest unless raw.
    ///
    /// Halves round toward positive infinity (`-2.5` reads as `-2`), unlike
    /// [`f64::round`].
    pub fn rpm(&self, options: ReadOptions<f64>) -> f64 {
        self.decode(TelemetryField::Rpm, options, |raw, rounding| {
            let rpm = f64::from(raw);
            match rounding {
                Rounding::Apply => (rpm + 0.5).floor(),
                Rounding::Raw => rpm,
            }
        })
    }

    /// Current lap time in milliseconds, floored unless raw.
    pub fn lap_time(&self, options: ReadOptions<f64>) -> f64 {
        self.decode(TelemetryField::LapTime, options, |raw, rounding| {
            floor_unless_raw(seconds_to_ms(raw), rounding)
        })
    }

    /// Previous lap time in milliseconds.
    ///
    /// Never rounded, whatever `options.rounding` says. This differs from
    /// [`PacketDecoder::best_lap_time`] on purpose: consumers of the legacy
    /// stream depend on the fractional milliseconds here.
    pub fn last_lap_time(&self, options: ReadOptions<f64>) -> f64 {
        self.decode(TelemetryField::LastLapTime, options, |raw, _| {
            seconds_to_ms(raw)
        })
    }

    /// Best lap time in milliseconds, floored unless raw.
    pub fn best_lap_time(&self, options: ReadOptions<f64>) -> f64 {
        self.decode(TelemetryField::BestLapTime, options, |raw, rounding| {
            floor_unless_raw(seconds_to_ms(raw), rounding)
        })
    }

    /// Race position. See [`DEFAULT_POSITION`] for the conventional fallback.
    pub fn position(&self, options: ReadOptions<f64>) -> f64 {
        self.decode(TelemetryField::Position, options, |raw, _| f64::from(raw))
    }

    /// Fuel left in the tank.
    pub fn fuel(&self, options: ReadOptions<f64>) -> f64 {
        self.decode(TelemetryField::Fuel, options, |raw, _| f64::from(raw))
    }

    /// Throttle pedal, percent.
    pub fn throttle(&self, options: ReadOptions<f64>) -> f64 {
        self.decode(TelemetryField::Throttle, options, |raw, _| {
            f64::from(raw) * 100.0
        })
    }

    /// Brake pedal, percent.
    pub fn brake(&self, options: ReadOptions<f64>) -> f64 {
        self.decode(TelemetryField::Brake, options, |raw, _| f64::from(raw) * 100.0)
    }

    /// Gear: -1 reverse, 0 neutral, 1.. forward gears.
    pub fn gear(&self, options: ReadOptions<f64>) -> f64 {
        self.decode(TelemetryField::Gear, options, |raw, _| f64::from(raw) - 1.0)
    }

    /// Whether DRS is open.
    pub fn drs(&self, options: ReadOptions<bool>) -> bool {
        self.decode(TelemetryField::Drs, options, |raw, _| is_exactly_one(raw))
    }

    /// Whether DRS may be used in the current session.
    pub fn drs_allowed(&self, options: ReadOptions<bool>) -> bool {
        self.decode(TelemetryField::DrsAllowed, options, |raw, _| {
            is_exactly_one(raw)
        })
    }

    /// Marshal flag at the car's position (0 none, 1 green, 2 blue, 3 yellow, 4 red).
    pub fn flag(&self, options: ReadOptions<f64>) -> f64 {
        self.decode(TelemetryField::Flag, options, |raw, _| f64::from(raw))
    }

    /// [`PacketDecoder::flag`] as an enum; `None` when unbound, short or unknown.
    pub fn race_flag(&self) -> Option<RaceFlag> {
        self.read(TelemetryField::Flag)
            .and_then(|raw| RaceFlag::from_raw(f64::from(raw)))
    }

    /// Whether the car is in the pit lane. See [`DEFAULT_PITS`].
    pub fn pits(&self, options: ReadOptions<bool>) -> bool {
        self.decode(TelemetryField::Pits, options, |raw, _| is_exactly_one(raw))
    }

    /// Every field with its conventional fallback and default rounding.
    pub fn summary(&self) -> TelemetrySummary {
        TelemetrySummary {
            speed: self.speed(ReadOptions::default()),
            kmh_speed: self.kmh_speed(ReadOptions::default()),
            rpm: self.rpm(ReadOptions::default()),
            lap_time_ms: self.lap_time(ReadOptions::default()),
            last_lap_time_ms: self.last_lap_time(ReadOptions::default()),
            best_lap_time_ms: self.best_lap_time(ReadOptions::default()),
            position: self.position(ReadOptions::fallback(DEFAULT_POSITION)),
            fuel: self.fuel(ReadOptions::default()),
            throttle: self.throttle(ReadOptions::default()),
            brake: self.brake(ReadOptions::default()),
            gear: self.gear(ReadOptions::default()),
            drs: self.drs(ReadOptions::default()),
            drs_allowed: self.drs_allowed(ReadOptions::default()),
            flag: self.flag(ReadOptions::default()),
            pits: self.pits(ReadOptions::fallback(DEFAULT_PITS)),
        }
    }
}

impl From<Vec<u8>> for PacketDecoder {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for PacketDecoder {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

fn floor_unless_raw(value: f64, rounding: Rounding) -> f64 {
    match rounding {
        Rounding::Apply => value.floor(),
        Rounding::Raw => value,
    }
}

fn seconds_to_ms(raw: f32) -> f64 {
    f64::from(raw) * 1000.0
}

// Exact bit match: 0.99999994 is not "on".
fn is_exactly_one(raw: f32) -> bool {
    raw.to_bits() == 1.0f32.to_bits()
}
