// src/utils/clock.rs
//! Monotonic microsecond clock
//!
//! All timestamps in the engine are microseconds since a process-wide anchor
//! taken the first time the clock is read. Only differences between
//! timestamps are meaningful.

use once_cell::sync::Lazy;
use std::time::{Duration, Instant};

static ANCHOR: Lazy<Instant> = Lazy::new(Instant::now);

/// Microseconds elapsed since the process-wide anchor
pub fn now_us() -> u64 {
    ANCHOR.elapsed().as_micros() as u64
}

/// Convert a duration to whole microseconds, saturating at `u64::MAX`
pub fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic() {
        let a = now_us();
        std::thread::sleep(Duration::from_millis(2));
        let b = now_us();
        assert!(b >= a + 2_000);
    }

    #[test]
    fn test_micros() {
        assert_eq!(micros(Duration::from_millis(3)), 3_000);
        assert_eq!(micros(Duration::from_micros(7)), 7);
        assert_eq!(micros(Duration::MAX), u64::MAX);
    }
}
