use embedded_hal::delay::DelayNs;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Monotonic millisecond time source for the control loop.
pub trait Monotonic {
    fn now_ms(&self) -> u64;
}

/// Host clock: milliseconds since construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Monotonic for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Host delay backed by `thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDelay;

impl DelayNs for SystemDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TimerStats {
    pub fired: u32,
    /// Fires that came later than one full period past due.
    pub late: u32,
}

/// Elapsed-time gate for one periodic activity.
///
/// Checked once per loop iteration. A missed period does not queue up: the
/// next poll after the deadline fires once and restarts the period from
/// that moment.
#[derive(Debug, Clone)]
pub struct PeriodicTimer {
    period_ms: u64,
    last_fired_ms: u64,
    stats: TimerStats,
}

impl PeriodicTimer {
    pub fn new(period_ms: u64, now_ms: u64) -> Self {
        debug_assert!(period_ms > 0, "periodic timer needs a non-zero period");
        Self {
            period_ms,
            last_fired_ms: now_ms,
            stats: TimerStats::default(),
        }
    }

    /// Returns `true` and restarts the period if it has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let elapsed = self.elapsed_ms(now_ms);
        if elapsed < self.period_ms {
            return false;
        }

        if elapsed >= self.period_ms.saturating_mul(2) {
            self.stats.late = self.stats.late.saturating_add(1);
        }
        self.stats.fired = self.stats.fired.saturating_add(1);
        self.last_fired_ms = now_ms;
        true
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_fired_ms)
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    pub fn last_fired_ms(&self) -> u64 {
        self.last_fired_ms
    }

    pub fn get_stats(&self) -> &TimerStats {
        &self.stats
    }
}
