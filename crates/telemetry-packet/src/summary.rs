//! Flattened, serializable view of a decoded packet.

use serde::{Deserialize, Serialize};

use crate::PacketDecoder;

/// Marshal flag shown at the car's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceFlag {
    None,
    Green,
    Blue,
    Yellow,
    Red,
}

impl RaceFlag {
    /// Map the raw flag value; anything but an exact 0..=4 is unknown.
    pub fn from_raw(raw: f64) -> Option<Self> {
        const FLAGS: [(f64, RaceFlag); 5] = [
            (0.0, RaceFlag::None),
            (1.0, RaceFlag::Green),
            (2.0, RaceFlag::Blue),
            (3.0, RaceFlag::Yellow),
            (4.0, RaceFlag::Red),
        ];
        FLAGS
            .iter()
            .find(|(value, _)| value.to_bits() == raw.to_bits())
            .map(|(_, flag)| *flag)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RaceFlag::None => "none",
            RaceFlag::Green => "green",
            RaceFlag::Blue => "blue",
            RaceFlag::Yellow => "yellow",
            RaceFlag::Red => "red",
        }
    }
}

/// Every field of one packet, decoded with the conventional fallbacks.
///
/// Times are in milliseconds, throttle and brake in percent, speeds in m/s and
/// km/h. `last_lap_time_ms` keeps its fractional part; every other time is
/// floored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySummary {
    pub speed: f64,
    pub kmh_speed: f64,
    pub rpm: f64,
    pub lap_time_ms: f64,
    pub last_lap_time_ms: f64,
    pub best_lap_time_ms: f64,
    pub position: f64,
    pub fuel: f64,
    pub throttle: f64,
    pub brake: f64,
    pub gear: f64,
    pub drs: bool,
    pub drs_allowed: bool,
    pub flag: f64,
    pub pits: bool,
}

impl Default for TelemetrySummary {
    /// The summary of a decoder with nothing bound.
    fn default() -> Self {
        PacketDecoder::empty().summary()
    }
}

impl TelemetrySummary {
    pub fn race_flag(&self) -> Option<RaceFlag> {
        RaceFlag::from_raw(self.flag)
    }
}
