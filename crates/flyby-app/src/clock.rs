//! Frame delta clock.

use std::time::Instant;

/// Measures seconds between successive [`delta`](Self::delta) calls.
///
/// The clock starts on the first call, which returns zero. Deltas are never
/// negative.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last: Option<Instant>,
    elapsed: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call.
    pub fn delta(&mut self) -> f32 {
        self.delta_at(Instant::now())
    }

    /// [`delta`](Self::delta) against an explicit timestamp.
    pub fn delta_at(&mut self, now: Instant) -> f32 {
        let Some(last) = self.last.replace(now) else {
            return 0.0;
        };
        let seconds = now.saturating_duration_since(last).as_secs_f64();
        self.elapsed += seconds;
        seconds as f32
    }

    /// Total seconds accumulated by all deltas.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.last.is_some()
    }
}
