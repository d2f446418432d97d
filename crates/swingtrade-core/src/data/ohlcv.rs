use crate::calendar::HolidayCalendar;
use crate::error::{Result, SimError};
use crate::types::{Frequency, Tick};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub dropped_null: usize,
    pub dropped_zero_price: usize,
    pub dropped_bad_date: usize,
    pub duplicates: usize,
    pub out_of_order: usize,
    pub missing_trading_days: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub first_duplicate: Option<NaiveDate>,
    pub first_out_of_order: Option<NaiveDate>,
    pub first_gap: Option<NaiveDate>,
}

impl DataQualityReport {
    pub fn dropped(&self) -> usize {
        self.dropped_null + self.dropped_zero_price + self.dropped_bad_date + self.duplicates
    }
}

#[derive(Debug, Deserialize)]
struct OhlcvRecord {
    #[serde(rename = "Date", default)]
    date: Option<String>,
    #[serde(rename = "Open", default, deserialize_with = "csv::invalid_option")]
    open: Option<f64>,
    #[serde(rename = "High", default, deserialize_with = "csv::invalid_option")]
    high: Option<f64>,
    #[serde(rename = "Low", default, deserialize_with = "csv::invalid_option")]
    low: Option<f64>,
    #[serde(rename = "Close", default, deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
    #[serde(rename = "Volume", default, deserialize_with = "csv::invalid_option")]
    volume: Option<f64>,
}

/// Loads and cleans one `<TICKER>-<freq>.csv` file.
pub fn load_csv(path: &Path, frequency: Frequency) -> Result<(Vec<Tick>, DataQualityReport)> {
    let file = File::open(path).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let (ticks, report) = read_csv(file, frequency).map_err(|source| SimError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    if report.dropped() > 0 || report.out_of_order > 0 {
        warn!(
            path = %path.display(),
            %frequency,
            rows_read = report.rows_read,
            dropped_null = report.dropped_null,
            dropped_zero_price = report.dropped_zero_price,
            dropped_bad_date = report.dropped_bad_date,
            duplicates = report.duplicates,
            out_of_order = report.out_of_order,
            "cleaned OHLCV rows"
        );
    }
    Ok((ticks, report))
}

/// Parses CSV rows with a `Date,Open,High,Low,Close,Volume` header. Extra columns are ignored.
pub fn read_csv<R: Read>(
    reader: R,
    frequency: Frequency,
) -> std::result::Result<(Vec<Tick>, DataQualityReport), csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut report = DataQualityReport::default();
    let mut raw = Vec::new();

    for result in reader.deserialize::<OhlcvRecord>() {
        let record = result?;
        report.rows_read += 1;

        let (Some(date), Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            record.date.as_deref().filter(|value| !value.is_empty()),
            finite(record.open),
            finite(record.high),
            finite(record.low),
            finite(record.close),
            finite(record.volume),
        ) else {
            report.dropped_null += 1;
            continue;
        };

        if open == 0.0 || close == 0.0 {
            report.dropped_zero_price += 1;
            continue;
        }

        let Some(date) = parse_date(date) else {
            report.dropped_bad_date += 1;
            continue;
        };

        raw.push(Tick {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    let ticks = clean_ticks(raw, frequency, &mut report);
    Ok((ticks, report))
}

/// Sorts by date, keeps the last row for a repeated date, and fills the date-level
/// fields of `report`.
pub fn clean_ticks(
    mut ticks: Vec<Tick>,
    frequency: Frequency,
    report: &mut DataQualityReport,
) -> Vec<Tick> {
    let mut prev: Option<NaiveDate> = None;
    for tick in &ticks {
        if let Some(prev) = prev {
            if tick.date < prev {
                report.out_of_order += 1;
                report.first_out_of_order.get_or_insert(tick.date);
            }
        }
        prev = Some(tick.date);
    }

    ticks.sort_by_key(|tick| tick.date);

    let mut cleaned: Vec<Tick> = Vec::with_capacity(ticks.len());
    for tick in ticks {
        match cleaned.last_mut() {
            Some(last) if last.date == tick.date => {
                report.duplicates += 1;
                report.first_duplicate.get_or_insert(tick.date);
                *last = tick;
            }
            _ => cleaned.push(tick),
        }
    }

    report.rows_kept = cleaned.len();
    report.first_date = cleaned.first().map(|tick| tick.date);
    report.last_date = cleaned.last().map(|tick| tick.date);
    if frequency == Frequency::Daily {
        count_missing_trading_days(&cleaned, HolidayCalendar::us_federal(), report);
    }
    cleaned
}

fn count_missing_trading_days(
    ticks: &[Tick],
    calendar: &HolidayCalendar,
    report: &mut DataQualityReport,
) {
    for pair in ticks.windows(2) {
        let missing = calendar.trading_days_between(pair[0].date, pair[1].date);
        if missing > 0 {
            report.missing_trading_days += missing;
            if report.first_gap.is_none() {
                report.first_gap = calendar.next_trading_day(pair[0].date);
            }
        }
    }
}

/// Only the first whitespace-separated token is read, so `2020-01-02 00:00:00` keys as
/// `2020-01-02`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let token = value.split_whitespace().next()?;
    NaiveDate::parse_from_str(token, DATE_FORMAT).ok()
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
