//! Common test utilities

use chrono::NaiveDate;
use dangbeon::calendar::{CalendarPolicy, HolidaySet};
use dangbeon::roster::{Responder, Roster};

/// Shorthand for a calendar date
pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Roster of the given names, with generated Slack ids and phones
pub fn roster(names: &[&str]) -> Roster {
    let responders = names
        .iter()
        .enumerate()
        .map(|(i, name)| Responder::new(*name, format!("U{i:03}"), format!("010-0000-{i:04}")))
        .collect();
    Roster::new(responders).unwrap()
}

/// Calendar with no holidays
#[allow(dead_code)]
pub fn weekends_only() -> CalendarPolicy {
    CalendarPolicy::new(HolidaySet::default())
}
