use time::{OffsetDateTime, macros::format_description};

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    /// Milliseconds since the Unix epoch, as stored in `lastStatus`.
    fn epoch_millis(&self) -> i64 {
        i64::try_from(self.now().unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
    }

    /// `HH:MM:SS`, as stamped on messages.
    fn clock_time(&self) -> String {
        let now = self.now();
        now.format(format_description!("[hour]:[minute]:[second]"))
            .unwrap_or_else(|_| format!("{:02}:{:02}:{:02}", now.hour(), now.minute(), now.second()))
    }
}

/// Local wall-clock time, falling back to UTC where the local offset
/// cannot be determined.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}
