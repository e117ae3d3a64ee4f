// Clock port used to stamp execution reports

/// Wall clock read by the runner when an event starts and finishes.
///
/// Reports carry plain epoch milliseconds; swapping the clock lets tests
/// pin `started_at_ms` / `finished_at_ms`.
pub trait TimeProvider: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// UTC wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock frozen at one instant; every report gets a zero duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTimeProvider(pub i64);

impl TimeProvider for FixedTimeProvider {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_never_moves() {
        let clock = FixedTimeProvider(1_700_000_000_000);
        assert_eq!(clock.now_millis(), clock.now_millis());
        assert_eq!(clock.now_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_system_clock_reads_epoch_millis() {
        let clock: &dyn TimeProvider = &SystemTimeProvider;
        // 2020-01-01T00:00:00Z
        assert!(clock.now_millis() > 1_577_836_800_000);
    }
}
