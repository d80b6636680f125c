//! Per-call accessor options.

/// Whether an accessor applies its rounding transform.
///
/// Only accessors with a rounding step look at this: speed, km/h speed and
/// the current/best lap times floor, rpm rounds to nearest. Every other
/// accessor returns the same value in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    #[default]
    Apply,
    Raw,
}

/// Options accepted by every [`PacketDecoder`](crate::PacketDecoder) accessor.
///
/// `fallback` is returned unmodified when no packet is bound, or when the
/// bound packet is too short to hold the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadOptions<T> {
    pub rounding: Rounding,
    pub fallback: T,
}

impl<T> ReadOptions<T> {
    pub const fn new(rounding: Rounding, fallback: T) -> Self {
        Self { rounding, fallback }
    }

    /// Rounding applied, with the given fallback.
    pub const fn fallback(fallback: T) -> Self {
        Self::new(Rounding::Apply, fallback)
    }

    /// Rounding skipped, with the given fallback.
    pub const fn raw(fallback: T) -> Self {
        Self::new(Rounding::Raw, fallback)
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn is_raw(&self) -> bool {
        self.rounding == Rounding::Raw
    }
}

impl<T: Default> Default for ReadOptions<T> {
    fn default() -> Self {
        Self::fallback(T::default())
    }
}
