use std::time::Duration;
use tokio::time::{interval, Instant, Interval, MissedTickBehavior};

/// Fixed-period ticker measuring time since the ramp began.
pub(crate) struct Timer {
    interval: Interval,
    started: Instant,
    period: Duration,
}

impl Timer {
    pub async fn new(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // NOTE: First tick completes instantly
        let started = interval.tick().await;
        Self {
            interval,
            started,
            period,
        }
    }

    /// Wait for the next tick and return the time elapsed since `new`.
    pub async fn tick(&mut self) -> Duration {
        self.interval.tick().await;
        self.started.elapsed()
    }
}

impl std::fmt::Display for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", humantime::format_duration(self.period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn elapsed_grows_per_tick() {
        let mut timer = Timer::new(Duration::from_millis(20)).await;
        let first = timer.tick().await;
        let second = timer.tick().await;
        assert!(first >= Duration::from_millis(15), "{first:?}");
        assert!(second >= first + Duration::from_millis(15), "{second:?}");
        assert_eq!(timer.to_string(), "20ms");
    }
}
