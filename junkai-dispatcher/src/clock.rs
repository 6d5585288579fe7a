//! Clock abstraction
//!
//! Date resolution is injected so that "today" can be pinned in tests.
//! The platform's reference time zone is JST: devices report in Japan and
//! the pending-work tables are keyed by JST calendar dates.

use chrono::{FixedOffset, NaiveDate, Utc};

/// Source of the current JST calendar date
pub trait Clock: Send + Sync {
    fn today_jst(&self) -> NaiveDate;
}

/// Seconds east of UTC for JST (+09:00).
const JST_OFFSET_SECS: i32 = 9 * 3600;

/// JST offset. +09:00 is always within chrono's valid offset range.
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).unwrap()
}

/// Wall-clock implementation
pub struct SystemClock;

impl Clock for SystemClock {
    fn today_jst(&self) -> NaiveDate {
        Utc::now().with_timezone(&jst()).date_naive()
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    /// Clock pinned to a fixed date, for selector tests.
    pub struct FixedClock(pub NaiveDate);

    impl Clock for FixedClock {
        fn today_jst(&self) -> NaiveDate {
            self.0
        }
    }
}
