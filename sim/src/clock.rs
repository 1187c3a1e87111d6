use std::time::Duration;

/// Simulated time, advanced only by tick deltas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimClock {
    elapsed: Duration,
}

impl SimClock {
    /// Advances by `dt` seconds. Negative and non-finite deltas are treated as zero.
    pub fn advance(&mut self, dt: f32) -> Duration {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += Duration::from_secs_f32(dt);
        }
        self.elapsed
    }

    #[inline]
    pub fn now(&self) -> Duration {
        self.elapsed
    }
}
