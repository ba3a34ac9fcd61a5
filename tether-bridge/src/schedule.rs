//! Decision cadence.

/// Separates the decision rate from the physics tick rate.
///
/// The schedule accumulates simulated time and fires once the configured
/// interval has elapsed. On firing, the interval is subtracted rather than
/// the accumulator zeroed, so the cadence does not drift when the interval
/// is not an exact multiple of the tick duration.
#[derive(Clone, Debug)]
pub struct DecisionSchedule {
    interval: f64,
    elapsed: f64,
}

impl DecisionSchedule {
    // Tolerance for accumulated floating point error in `elapsed`.
    const EPS: f64 = 1e-9;

    /// Creates a schedule firing every `interval` simulated seconds.
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            elapsed: 0.0,
        }
    }

    /// Advances the schedule by `dt`; returns `true` when an exchange is due.
    pub fn advance(&mut self, dt: f64) -> bool {
        self.elapsed += dt;
        if self.elapsed + Self::EPS >= self.interval {
            self.elapsed = (self.elapsed - self.interval).max(0.0);
            true
        } else {
            false
        }
    }

    /// The configured decision interval in simulated seconds.
    pub fn interval(&self) -> f64 {
        self.interval
    }
}
