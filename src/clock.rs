//! Wall clock in the rotation's timezone
//!
//! "Today" always means the calendar day at a fixed UTC offset (KST by
//! default), regardless of the host timezone.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// Seconds east of UTC for Korea Standard Time
pub const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Fixed-offset clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    offset: FixedOffset,
}

impl Clock {
    /// Clock at a whole-hour offset from UTC, `None` if out of range
    pub fn from_offset_hours(hours: i32) -> Option<Self> {
        FixedOffset::east_opt(hours.checked_mul(3600)?).map(|offset| Self { offset })
    }

    /// Korea Standard Time (UTC+9)
    pub fn kst() -> Self {
        Self {
            offset: FixedOffset::east_opt(KST_OFFSET_SECS).unwrap_or_else(|| Utc.fix()),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current instant in this clock's offset
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// Current calendar day in this clock's offset
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Convert an instant into this clock's offset
    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::kst()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_kst_offset() {
        assert_eq!(Clock::kst().offset().local_minus_utc(), KST_OFFSET_SECS);
        assert_eq!(Clock::default(), Clock::kst());
    }

    #[test]
    fn test_out_of_range_offset() {
        assert!(Clock::from_offset_hours(30).is_none());
        assert!(Clock::from_offset_hours(-5).is_some());
    }

    #[test]
    fn test_localize_crosses_date_line() {
        // 16:00 UTC on the 6th is already the 7th in KST
        let instant = Utc.with_ymd_and_hms(2025, 6, 6, 16, 0, 0).unwrap();
        let local = Clock::kst().localize(instant);
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2025, 6, 7).unwrap());
    }
}
