//! Calendar policy: which days need an on-call responder
//!
//! A day qualifies when it falls on a weekend or appears in the holiday
//! set. The holiday set is plain configuration data (a list of ISO dates
//! per supported year); dates outside the configured years simply never
//! match.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Korean public holidays falling on weekdays, 2025-2026
const KOREAN_HOLIDAYS_2025_2026: &[&str] = &[
    // 2025
    "2025-01-01", // 신정
    "2025-01-28", // 설날
    "2025-01-29",
    "2025-01-30",
    "2025-05-05", // 어린이날
    "2025-06-06", // 현충일
    "2025-08-15", // 광복절
    "2025-10-03", // 개천절
    "2025-10-06", // 추석
    "2025-10-07",
    "2025-10-08",
    "2025-10-09", // 한글날
    "2025-12-25", // 성탄절
    // 2026
    "2026-01-01",
    "2026-02-16",
    "2026-02-17",
    "2026-02-18",
    "2026-03-02",
    "2026-05-05",
    "2026-05-25",
    "2026-08-17",
    "2026-09-24",
    "2026-09-25",
    "2026-10-05",
    "2026-10-09",
    "2026-12-25",
];

/// Set of holiday dates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<NaiveDate>", into = "Vec<NaiveDate>")]
pub struct HolidaySet {
    dates: BTreeSet<NaiveDate>,
}

impl HolidaySet {
    /// Create a holiday set from dates
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    /// Parse ISO `YYYY-MM-DD` strings
    pub fn parse<S: AsRef<str>>(dates: &[S]) -> Result<Self, chrono::ParseError> {
        let parsed = dates
            .iter()
            .map(|d| NaiveDate::parse_from_str(d.as_ref(), "%Y-%m-%d"))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { dates: parsed })
    }

    /// The 2025-2026 Korean holiday table the rotation was first run with
    pub fn korean_2025_2026() -> Self {
        Self::new(KOREAN_HOLIDAYS_2025_2026.iter().filter_map(|d| {
            NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()
        }))
    }

    /// Check membership
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    /// Number of configured holidays
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether no holidays are configured
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Iterate holidays in ascending order
    pub fn iter(&self) -> impl Iterator<Item = &NaiveDate> {
        self.dates.iter()
    }
}

impl From<Vec<NaiveDate>> for HolidaySet {
    fn from(dates: Vec<NaiveDate>) -> Self {
        Self::new(dates)
    }
}

impl From<HolidaySet> for Vec<NaiveDate> {
    fn from(set: HolidaySet) -> Self {
        set.dates.into_iter().collect()
    }
}

/// Classification of a calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayKind {
    /// Ordinary working day, no on-call
    Weekday,
    /// Saturday or Sunday
    Weekend,
    /// Listed holiday on a weekday
    Holiday,
    /// Listed holiday that is also a weekend day
    WeekendHoliday,
}

impl DayKind {
    /// Whether this kind of day needs an on-call assignment
    pub fn is_qualifying(&self) -> bool {
        !matches!(self, Self::Weekday)
    }

    /// Korean label used in reminders
    pub fn korean_label(&self) -> &'static str {
        match self {
            Self::Weekday => "평일",
            Self::Weekend => "주말",
            Self::Holiday => "공휴일",
            Self::WeekendHoliday => "주말이자 공휴일",
        }
    }
}

impl fmt::Display for DayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.korean_label())
    }
}

/// Decides which dates require an on-call assignment
#[derive(Debug, Clone, Default)]
pub struct CalendarPolicy {
    holidays: HolidaySet,
}

impl CalendarPolicy {
    /// Create a policy with the given holiday set
    pub fn new(holidays: HolidaySet) -> Self {
        Self { holidays }
    }

    /// Holidays known to this policy
    pub fn holidays(&self) -> &HolidaySet {
        &self.holidays
    }

    /// Classify a date
    pub fn day_kind(&self, date: NaiveDate) -> DayKind {
        match (is_weekend(date), self.holidays.contains(date)) {
            (true, true) => DayKind::WeekendHoliday,
            (true, false) => DayKind::Weekend,
            (false, true) => DayKind::Holiday,
            (false, false) => DayKind::Weekday,
        }
    }

    /// True for weekends and listed holidays
    pub fn is_qualifying_day(&self, date: NaiveDate) -> bool {
        self.day_kind(date).is_qualifying()
    }

    /// All qualifying days of a month, ascending
    pub fn qualifying_days(&self, year: i32, month: u32) -> Option<Vec<NaiveDate>> {
        let (first, last) = month_bounds(year, month)?;
        Some(
            first
                .iter_days()
                .take_while(|d| *d <= last)
                .filter(|d| self.is_qualifying_day(*d))
                .collect(),
        )
    }
}

/// Saturday or Sunday
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// `(year, month)` following the given month
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// First and last day of a month
///
/// The last day is computed as the first day of the following month minus
/// one day, so month lengths and leap years come out right. Returns `None`
/// for an out-of-range month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (ny, nm) = next_month(year, month);
    let last = NaiveDate::from_ymd_opt(ny, nm, 1)? - Duration::days(1);
    Some((first, last))
}

/// Korean single-character weekday label
pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "월",
        Weekday::Tue => "화",
        Weekday::Wed => "수",
        Weekday::Thu => "목",
        Weekday::Fri => "금",
        Weekday::Sat => "토",
        Weekday::Sun => "일",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_month_bounds_lengths() {
        assert_eq!(month_bounds(2025, 6), Some((d(2025, 6, 1), d(2025, 6, 30))));
        assert_eq!(month_bounds(2025, 12), Some((d(2025, 12, 1), d(2025, 12, 31))));
        assert_eq!(month_bounds(2024, 2), Some((d(2024, 2, 1), d(2024, 2, 29))));
        assert_eq!(month_bounds(2025, 2), Some((d(2025, 2, 1), d(2025, 2, 28))));
        assert_eq!(month_bounds(2025, 13), None);
    }

    #[test]
    fn test_next_month_rolls_year() {
        assert_eq!(next_month(2025, 12), (2026, 1));
        assert_eq!(next_month(2025, 5), (2025, 6));
    }

    #[test]
    fn test_weekend_qualifies() {
        let policy = CalendarPolicy::default();
        assert!(policy.is_qualifying_day(d(2025, 6, 7))); // Sat
        assert!(policy.is_qualifying_day(d(2025, 6, 8))); // Sun
        assert!(!policy.is_qualifying_day(d(2025, 6, 9))); // Mon
    }

    #[test]
    fn test_holiday_qualifies() {
        let policy = CalendarPolicy::new(HolidaySet::korean_2025_2026());
        assert_eq!(policy.day_kind(d(2025, 6, 6)), DayKind::Holiday);
        assert_eq!(policy.day_kind(d(2025, 6, 5)), DayKind::Weekday);
    }

    #[test]
    fn test_weekend_holiday_kind() {
        let policy = CalendarPolicy::new(HolidaySet::new([d(2025, 6, 7)]));
        assert_eq!(policy.day_kind(d(2025, 6, 7)), DayKind::WeekendHoliday);
        assert_eq!(DayKind::WeekendHoliday.korean_label(), "주말이자 공휴일");
    }

    #[test]
    fn test_holiday_outside_configured_years_is_plain_weekday() {
        let policy = CalendarPolicy::new(HolidaySet::korean_2025_2026());
        // New Year's Day 2027 is a Friday and is not in the table
        assert!(!policy.is_qualifying_day(d(2027, 1, 1)));
    }

    #[test]
    fn test_qualifying_days_june_2025() {
        let policy = CalendarPolicy::default();
        let days = policy.qualifying_days(2025, 6).unwrap();
        assert_eq!(days.len(), 9);
        assert_eq!(days[0], d(2025, 6, 1));
        assert_eq!(days[1], d(2025, 6, 7));
        assert_eq!(*days.last().unwrap(), d(2025, 6, 29));
    }

    #[test]
    fn test_holiday_set_parse() {
        let set = HolidaySet::parse(&["2025-01-01", "2025-12-25"]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(d(2025, 12, 25)));
        assert!(HolidaySet::parse(&["2025-13-01"]).is_err());
    }

    #[test]
    fn test_korean_table_loaded() {
        assert_eq!(HolidaySet::korean_2025_2026().len(), KOREAN_HOLIDAYS_2025_2026.len());
    }

    #[test]
    fn test_weekday_label() {
        assert_eq!(weekday_label(d(2025, 6, 7).weekday()), "토");
        assert_eq!(weekday_label(d(2025, 6, 9).weekday()), "월");
    }
}
