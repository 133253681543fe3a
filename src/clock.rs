// Clock - abstracts "what time is it" over file-derived sample time (a WAV
// decode runs as fast as the CPU allows, but every window still has a
// well-defined timestamp) vs. live wallclock time, so the pipeline never
// branches on "is this a file or a device".

use std::time::Instant;

pub trait Clock {
    /// Seconds elapsed since the stream began.
    fn now(&self) -> f64;

    /// Notify the clock that `samples` more PCM samples have been consumed.
    /// Only meaningful for sample-derived clocks; wallclock-based clocks
    /// ignore it.
    fn advance(&mut self, _samples: usize) {}
}

/// Derives time from samples consumed: `total_samples / sample_rate`.
/// Used when reading from a file, where nothing else defines "real time".
pub struct SampleClock {
    sample_rate: u32,
    total_samples: u64,
}

impl SampleClock {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            total_samples: 0,
        }
    }
}

impl Clock for SampleClock {
    fn now(&self) -> f64 {
        self.total_samples as f64 / self.sample_rate as f64
    }

    fn advance(&mut self, samples: usize) {
        self.total_samples += samples as u64;
    }
}

/// Derives time from the wall clock. Used for live capture, where the
/// capture device defines real time and sample-counting would drift.
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_clock_starts_at_zero() {
        let clock = SampleClock::new(16000);
        assert_eq!(clock.now(), 0.0);
    }

    #[test]
    fn sample_clock_advances_proportionally_to_sample_rate() {
        let mut clock = SampleClock::new(16000);
        clock.advance(16000);
        assert_eq!(clock.now(), 1.0);
        clock.advance(8000);
        assert_eq!(clock.now(), 1.5);
    }

    #[test]
    fn wall_clock_is_monotonic_and_starts_near_zero() {
        let clock = WallClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(first >= 0.0);
        assert!(second >= first);
    }
}
