use std::time::Duration;

use rand::Rng;

/// Reconnect delays: `base * 2^(attempt - 1)`, capped at `max`, with +/-25 % jitter.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    const FLOOR_MS: u64 = 100;

    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            attempt: 0,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Counts one more failed attempt and returns how long to wait before the next.
    pub fn next_delay(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        self.delay_for(self.attempt)
    }

    /// Called once the broker accepted a connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// The un-jittered delay for `attempt`.
    pub fn ceiling_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let base_ms = self.base.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        let shift = attempt.min(20) - 1;
        let exp = base_ms.saturating_mul(1u64.checked_shl(shift).unwrap_or(u64::MAX));
        Duration::from_millis(exp.min(max_ms))
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let capped = self.ceiling_for(attempt).as_millis() as i64;
        let jitter = capped / 4;
        let offset = if jitter > 0 {
            rand::thread_rng().gen_range(-jitter..=jitter)
        } else {
            0
        };
        let final_ms = (capped + offset).max(Self::FLOOR_MS as i64) as u64;
        Duration::from_millis(final_ms)
    }
}
