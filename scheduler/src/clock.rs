//! Wall-clock sources for the engine.

use chrono::{Local, NaiveDateTime};

/// Supplies the current local wall-clock time.
pub trait Clock: Send + Sync + 'static {
    /// The current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// The operating system's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that starts at a fixed instant and advances with tokio's timer.
///
/// Under a paused tokio runtime this makes week-long schedules run instantly
/// while still observing consistent wall-clock values.
#[derive(Debug, Clone, Copy)]
pub struct TimerClock {
    base: NaiveDateTime,
    origin: tokio::time::Instant,
}

impl TimerClock {
    /// Start the clock at `base`.
    pub fn starting_at(base: NaiveDateTime) -> Self {
        Self {
            base,
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TimerClock {
    fn now(&self) -> NaiveDateTime {
        let elapsed = tokio::time::Instant::now().duration_since(self.origin);
        chrono::Duration::from_std(elapsed)
            .ok()
            .and_then(|elapsed| self.base.checked_add_signed(elapsed))
            .unwrap_or(NaiveDateTime::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_timer_clock_follows_tokio_time() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 8)
            .unwrap()
            .and_hms_opt(10, 32, 0)
            .unwrap();
        let clock = TimerClock::starting_at(base);
        assert_eq!(clock.now(), base);

        tokio::time::advance(Duration::from_secs(90)).await;
        assert_eq!(clock.now(), base + chrono::Duration::seconds(90));
    }
}
