//! US federal holiday calendar and trading-day helpers.
//!
//! The holiday table is built once for 1970 through 2100 and shared process-wide.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeSet;
use std::sync::OnceLock;

const FIRST_YEAR: i32 = 1970;
const LAST_YEAR: i32 = 2100;

static US_FEDERAL: OnceLock<HolidayCalendar> = OnceLock::new();

#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn us_federal() -> &'static HolidayCalendar {
        US_FEDERAL.get_or_init(|| HolidayCalendar::us_federal_between(FIRST_YEAR, LAST_YEAR))
    }

    /// Observed federal holidays for every year in `first..=last`.
    pub fn us_federal_between(first: i32, last: i32) -> Self {
        let mut holidays = BTreeSet::new();
        for year in first..=last {
            holidays.extend(federal_holidays(year));
        }
        Self { holidays }
    }

    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: dates.into_iter().collect(),
        }
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// Monday through Friday and not an observed holiday.
    pub fn is_weekday(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && !self.is_holiday(date)
    }

    pub fn holidays_in(&self, year: i32) -> impl Iterator<Item = NaiveDate> + '_ {
        let start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN);
        let end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX);
        self.holidays.range(start..=end).copied()
    }

    /// Trading days strictly between `after` and `before`.
    pub fn trading_days_between(&self, after: NaiveDate, before: NaiveDate) -> usize {
        let mut count = 0;
        let mut day = after;
        while let Some(next) = tomorrow(day) {
            if next >= before {
                break;
            }
            if self.is_weekday(next) {
                count += 1;
            }
            day = next;
        }
        count
    }

    pub fn next_trading_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        let mut day = tomorrow(date)?;
        while !self.is_weekday(day) {
            day = tomorrow(day)?;
        }
        Some(day)
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_weekday(date: NaiveDate) -> bool {
    HolidayCalendar::us_federal().is_weekday(date)
}

pub fn tomorrow(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::days(1))
}

fn federal_holidays(year: i32) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(11);
    let fixed = |month: u32, day: u32| NaiveDate::from_ymd_opt(year, month, day).map(observed);

    days.extend(fixed(1, 1));
    if year >= 1986 {
        days.extend(nth_weekday(year, 1, Weekday::Mon, 3));
    }
    days.extend(nth_weekday(year, 2, Weekday::Mon, 3));
    days.extend(last_weekday(year, 5, Weekday::Mon));
    if year >= 2021 {
        days.extend(fixed(6, 19));
    }
    days.extend(fixed(7, 4));
    days.extend(nth_weekday(year, 9, Weekday::Mon, 1));
    days.extend(nth_weekday(year, 10, Weekday::Mon, 2));
    days.extend(fixed(11, 11));
    days.extend(nth_weekday(year, 11, Weekday::Thu, 4));
    days.extend(fixed(12, 25));
    days
}

/// Saturday holidays are observed on Friday, Sunday holidays on Monday.
fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    nth_weekday(year, month, weekday, 5).or_else(|| nth_weekday(year, month, weekday, 4))
}
