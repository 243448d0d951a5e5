//! Frame clock.
//!
//! Turns the driver's monotonic timestamps into a clamped integration step
//! and accumulates simulated time as the running sum of those steps.

/// Step bound used when the configured one is not a positive number.
pub const DEFAULT_MAX_DT: f64 = 0.05;

/// Timing of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Zero-based frame index of this tick.
    pub frame: u64,
    /// Clamped integration step, in seconds.
    pub dt: f64,
    /// Simulated time after this tick, in seconds.
    pub time: f64,
}

/// Converts wall timestamps into bounded simulation steps.
#[derive(Debug, Clone)]
pub struct FrameClock {
    max_dt: f64,
    last_timestamp: f64,
    frame: u64,
    time: f64,
}

impl FrameClock {
    /// Creates a clock whose steps never exceed `max_dt` seconds.
    ///
    /// The first timestamp is measured from zero, so a driver that starts
    /// late gets a single `max_dt` step rather than a jump. A `max_dt` that
    /// is not a positive finite number falls back to [`DEFAULT_MAX_DT`].
    #[must_use]
    pub fn new(max_dt: f64) -> Self {
        let max_dt = if max_dt.is_finite() && max_dt > 0.0 {
            max_dt
        } else {
            DEFAULT_MAX_DT
        };
        Self {
            max_dt,
            last_timestamp: 0.0,
            frame: 0,
            time: 0.0,
        }
    }

    /// Advances to `timestamp` (seconds, monotonic).
    ///
    /// A timestamp that goes backwards or is not finite yields a zero step.
    pub fn advance(&mut self, timestamp: f64) -> Tick {
        let dt = if timestamp.is_finite() {
            let raw = timestamp - self.last_timestamp;
            self.last_timestamp = timestamp;
            raw.clamp(0.0, self.max_dt)
        } else {
            0.0
        };
        self.time += dt;
        let tick = Tick {
            frame: self.frame,
            dt,
            time: self.time,
        };
        self.frame = self.frame.wrapping_add(1);
        tick
    }

    /// Ticks completed so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frame
    }

    /// Simulated seconds elapsed.
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }
}
