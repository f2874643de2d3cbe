//! Acceleration samples, the three engine states, and the thresholds that
//! map one onto the other.

use std::fmt;

// ════════════════════════════════════════════════════════════════════════════
// Thresholds
// ════════════════════════════════════════════════════════════════════════════

/// Magnitudes strictly below this are [`EngineState::Idle`].
pub const IDLE_CEILING: f64 = 0.1;

/// Magnitudes in `[IDLE_CEILING, ACCELERATING_CEILING)` are
/// [`EngineState::Accelerating`]; everything at or above is
/// [`EngineState::Decelerating`].
pub const ACCELERATING_CEILING: f64 = 0.5;

/// File extension of every bundled engine sound.
pub const SOUND_EXTENSION: &str = "mp3";

// ════════════════════════════════════════════════════════════════════════════
// AccelerationSample
// ════════════════════════════════════════════════════════════════════════════

/// One three-axis accelerometer reading.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AccelerationSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AccelerationSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        AccelerationSample { x, y, z }
    }

    /// Euclidean norm of the acceleration vector.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SoundId
// ════════════════════════════════════════════════════════════════════════════

/// Identifier of one of the bundled looping sounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SoundId(&'static str);

impl SoundId {
    pub const IDLE:         SoundId = SoundId("engine_idle");
    pub const ACCELERATING: SoundId = SoundId("engine_accelerating");
    pub const DECELERATING: SoundId = SoundId("engine_decelerating");

    pub fn as_str(&self) -> &'static str { self.0 }

    /// Bundled file name, e.g. `engine_idle.mp3`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, SOUND_EXTENSION)
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// EngineState
// ════════════════════════════════════════════════════════════════════════════

/// The discrete state driving sound selection.
///
/// The largest magnitudes map to `Decelerating`. That naming is inherited
/// as-is and is deliberately not swapped with `Accelerating`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EngineState {
    #[default]
    Idle,
    Accelerating,
    Decelerating,
}

impl EngineState {
    pub const ALL: [EngineState; 3] = [
        EngineState::Idle,
        EngineState::Accelerating,
        EngineState::Decelerating,
    ];

    /// Bucket a magnitude using half-open intervals.
    ///
    /// NaN fails both comparisons and lands in `Decelerating`.
    pub fn from_magnitude(magnitude: f64) -> Self {
        if magnitude < IDLE_CEILING {
            EngineState::Idle
        } else if magnitude < ACCELERATING_CEILING {
            EngineState::Accelerating
        } else {
            EngineState::Decelerating
        }
    }

    /// Display label consumed by the view.
    pub fn label(&self) -> &'static str {
        match self {
            EngineState::Idle         => "Idle",
            EngineState::Accelerating => "Accelerating",
            EngineState::Decelerating => "Decelerating",
        }
    }

    /// The sound looped while this state is current.
    pub fn sound(&self) -> SoundId {
        match self {
            EngineState::Idle         => SoundId::IDLE,
            EngineState::Accelerating => SoundId::ACCELERATING,
            EngineState::Decelerating => SoundId::DECELERATING,
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a sample by its magnitude.
pub fn classify(sample: &AccelerationSample) -> EngineState {
    EngineState::from_magnitude(sample.magnitude())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_is_euclidean_norm() {
        assert_eq!(AccelerationSample::new(3.0, 4.0, 0.0).magnitude(), 5.0);
        assert_eq!(AccelerationSample::new(0.0, 0.0, 0.0).magnitude(), 0.0);
        assert_eq!(AccelerationSample::new(-1.0, 0.0, 0.0).magnitude(), 1.0);
    }

    #[test]
    fn below_idle_ceiling_is_idle() {
        for m in [0.0, 0.01, 0.05, 0.0999] {
            assert_eq!(EngineState::from_magnitude(m), EngineState::Idle, "m={}", m);
        }
    }

    #[test]
    fn middle_bucket_is_accelerating() {
        for m in [0.1, 0.2, 0.3, 0.4999] {
            assert_eq!(EngineState::from_magnitude(m), EngineState::Accelerating, "m={}", m);
        }
    }

    #[test]
    fn top_bucket_is_decelerating() {
        for m in [0.5, 0.75, 1.0, 9.81, f64::INFINITY] {
            assert_eq!(EngineState::from_magnitude(m), EngineState::Decelerating, "m={}", m);
        }
    }

    #[test]
    fn boundaries_are_inclusive_lower_bounds() {
        assert_eq!(EngineState::from_magnitude(0.1), EngineState::Accelerating);
        assert_eq!(EngineState::from_magnitude(0.5), EngineState::Decelerating);
    }

    #[test]
    fn nan_falls_through_to_decelerating() {
        assert_eq!(EngineState::from_magnitude(f64::NAN), EngineState::Decelerating);
    }

    #[test]
    fn classify_uses_all_three_axes() {
        // Each axis alone is idle, together they cross 0.1.
        let s = AccelerationSample::new(0.06, 0.06, 0.06);
        assert_eq!(classify(&s), EngineState::Accelerating);
        assert_eq!(classify(&AccelerationSample::new(0.0, 0.0, -1.0)), EngineState::Decelerating);
    }

    #[test]
    fn labels_and_sounds() {
        assert_eq!(EngineState::Idle.label(), "Idle");
        assert_eq!(EngineState::Accelerating.label(), "Accelerating");
        assert_eq!(EngineState::Decelerating.to_string(), "Decelerating");
        assert_eq!(EngineState::Idle.sound().as_str(), "engine_idle");
        assert_eq!(EngineState::Accelerating.sound().as_str(), "engine_accelerating");
        assert_eq!(EngineState::Decelerating.sound().file_name(), "engine_decelerating.mp3");
    }

    #[test]
    fn default_state_is_idle() {
        assert_eq!(EngineState::default(), EngineState::Idle);
    }
}
