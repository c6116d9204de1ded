//! Beat/time conversion shared by tempo maps and the reference clock.

/// Anything that maps beats to absolute time and back.
///
/// Conversions take `&mut self` because tempo maps extend their breakpoint
/// cache while converting.
pub trait Clock {
    fn beat_at_time(&mut self, time: f64) -> f64;
    fn time_at_beat(&mut self, beat: f64) -> f64;
}

/// The root clock of an engine: a constant rate from an origin time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceClock {
    origin: f64,
    rate: f64,
}

impl Default for ReferenceClock {
    /// One beat per second from time 0.
    fn default() -> Self {
        Self { origin: 0.0, rate: 1.0 }
    }
}

impl ReferenceClock {
    /// Clock running at `rate` beats per second. Non-positive or non-finite
    /// rates fall back to 1.
    pub fn new(rate: f64) -> Self {
        let rate = if rate.is_finite() && rate > 0.0 { rate } else { 1.0 };
        Self { origin: 0.0, rate }
    }

    /// Anchor beat 0 at `origin`.
    pub fn start(&mut self, origin: f64) {
        self.origin = origin;
    }

    pub fn origin(&self) -> f64 {
        self.origin
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Clock for ReferenceClock {
    fn beat_at_time(&mut self, time: f64) -> f64 {
        (time - self.origin) * self.rate
    }

    fn time_at_beat(&mut self, beat: f64) -> f64 {
        self.origin + beat / self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        let mut clock = ReferenceClock::default();
        assert_eq!(clock.beat_at_time(3.5), 3.5);
        assert_eq!(clock.time_at_beat(2.0), 2.0);
    }

    #[test]
    fn origin_and_rate() {
        let mut clock = ReferenceClock::new(2.0);
        clock.start(10.0);
        assert_eq!(clock.beat_at_time(11.0), 2.0);
        assert_eq!(clock.time_at_beat(4.0), 12.0);
        assert_eq!(clock.origin(), 10.0);
    }

    #[test]
    fn invalid_rate_falls_back() {
        assert_eq!(ReferenceClock::new(0.0).rate(), 1.0);
        assert_eq!(ReferenceClock::new(f64::NAN).rate(), 1.0);
    }
}
