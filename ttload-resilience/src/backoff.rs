//! Delays between retries and randomized pauses

use rand::Rng;
use std::time::Duration;

/// How the wait grows from one failed attempt to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Always `step`
    Fixed,

    /// `step * attempt`
    Linear,
}

impl Backoff {
    /// Wait after failed `attempt` (1-indexed)
    pub fn delay(self, step: Duration, attempt: u32) -> Duration {
        match self {
            Backoff::Fixed => step,
            Backoff::Linear => step.saturating_mul(attempt.max(1)),
        }
    }
}

/// A pause of `base` plus a random extra in `0..spread`.
///
/// With whole-second inputs the result stays on whole seconds, so a 20 s base
/// with a 10 s spread yields 20..=29 s.
pub fn spread_delay<R: Rng + ?Sized>(rng: &mut R, base: Duration, spread: Duration) -> Duration {
    if spread.is_zero() {
        return base;
    }

    if spread.subsec_nanos() == 0 && base.subsec_nanos() == 0 {
        base + Duration::from_secs(rng.gen_range(0..spread.as_secs()))
    } else {
        base + Duration::from_nanos(rng.gen_range(0..spread.as_nanos() as u64))
    }
}
