//! Point-in-time reads over a [`TimeSeriesStore`].
//!
//! Every read takes an `as_of` date and never returns a row dated after it. The only
//! forward-looking operation is [`TimeSeriesStore::n_ticks_after`], which yields a date
//! and no prices; the simulator uses it to advance its clock.

use crate::data::store::TimeSeriesStore;
use crate::error::{Result, SimError};
use crate::types::{Column, Frequency, Tick};
use chrono::NaiveDate;

/// Columnar view of the last `n` ticks at or before a date.
#[derive(Debug, Clone, PartialEq)]
pub struct TickWindow {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
    values: Vec<Vec<f64>>,
}

impl TickWindow {
    fn from_ticks(ticks: &[Tick], columns: &[Column]) -> Self {
        let values = columns
            .iter()
            .map(|&column| ticks.iter().map(|tick| tick.value(column)).collect())
            .collect();
        Self {
            dates: ticks.iter().map(|tick| tick.date).collect(),
            columns: columns.to_vec(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn column(&self, column: Column) -> Option<&[f64]> {
        let idx = self.columns.iter().position(|&c| c == column)?;
        Some(&self.values[idx])
    }

    pub fn last(&self, column: Column) -> Option<f64> {
        self.column(column).and_then(|values| values.last().copied())
    }
}

impl TimeSeriesStore {
    /// Up to `length` most recent ticks dated on or before `as_of`, oldest first.
    /// Fewer rows come back when history is shorter; zero rows is [`SimError::NotFound`].
    pub fn latest_ticks(
        &self,
        frequency: Frequency,
        as_of: NaiveDate,
        length: usize,
    ) -> Result<&[Tick]> {
        let upto = self.series(frequency)?.upto(as_of);
        if upto.is_empty() || length == 0 {
            return Err(SimError::NotFound {
                frequency,
                date: as_of,
            });
        }
        let start = upto.len().saturating_sub(length);
        Ok(&upto[start..])
    }

    /// Same rows as [`latest_ticks`](Self::latest_ticks), restricted to `columns`
    /// (all five when `None`).
    pub fn latest(
        &self,
        frequency: Frequency,
        as_of: NaiveDate,
        columns: Option<&[Column]>,
        length: usize,
    ) -> Result<TickWindow> {
        let ticks = self.latest_ticks(frequency, as_of, length)?;
        Ok(TickWindow::from_ticks(ticks, columns.unwrap_or(&Column::ALL)))
    }

    pub fn next_tick(&self, frequency: Frequency, as_of: NaiveDate) -> Result<NaiveDate> {
        self.n_ticks_after(frequency, as_of, 1)
    }

    /// Date of the tick `n` positions after the tick dated exactly `as_of`.
    pub fn n_ticks_after(&self, frequency: Frequency, as_of: NaiveDate, n: usize) -> Result<NaiveDate> {
        let series = self.series(frequency)?;
        let idx = series.position(as_of).ok_or(SimError::NotFound {
            frequency,
            date: as_of,
        })?;
        idx.checked_add(n)
            .and_then(|target| series.ticks().get(target))
            .map(|tick| tick.date)
            .ok_or(SimError::EndOfData {
                frequency,
                date: as_of,
                n,
            })
    }

    /// Overlap of the loaded date ranges: latest first date and earliest last date.
    /// Spans every loaded frequency when `frequency` is `None`.
    pub fn date_bounds(&self, frequency: Option<Frequency>) -> Result<(NaiveDate, NaiveDate)> {
        let frequencies: Vec<Frequency> = match frequency {
            Some(frequency) => vec![frequency],
            None => self.frequencies().collect(),
        };

        let mut bounds: Option<(NaiveDate, NaiveDate)> = None;
        for frequency in frequencies {
            let series = self.series(frequency)?;
            let (Some(first), Some(last)) = (series.first_date(), series.last_date()) else {
                return Err(SimError::NoData(format!("{frequency} series is empty")));
            };
            bounds = Some(match bounds {
                Some((start, end)) => (start.max(first), end.min(last)),
                None => (first, last),
            });
        }

        match bounds {
            Some((start, end)) if start <= end => Ok((start, end)),
            Some((start, end)) => Err(SimError::NoData(format!(
                "loaded frequencies do not overlap (latest start {start}, earliest end {end})"
            ))),
            None => Err(SimError::NoData("no series loaded".to_string())),
        }
    }

    pub fn price_on_open(&self, frequency: Frequency, date: NaiveDate) -> Result<f64> {
        self.last_value(frequency, date, Column::Open)
    }

    pub fn price_on_close(&self, frequency: Frequency, date: NaiveDate) -> Result<f64> {
        self.last_value(frequency, date, Column::Close)
    }

    /// Last date shared by every loaded frequency.
    pub fn end_date(&self) -> Result<NaiveDate> {
        self.date_bounds(None).map(|(_, end)| end)
    }

    /// Ratio of the close at `end` to the open at `start`.
    pub fn buy_and_hold(&self, frequency: Frequency, start: NaiveDate, end: NaiveDate) -> Result<f64> {
        let open = self.price_on_open(frequency, start)?;
        let close = self.price_on_close(frequency, end)?;
        Ok(close / open)
    }

    fn last_value(&self, frequency: Frequency, date: NaiveDate, column: Column) -> Result<f64> {
        let ticks = self.latest_ticks(frequency, date, 1)?;
        ticks
            .last()
            .map(|tick| tick.value(column))
            .ok_or(SimError::NotFound { frequency, date })
    }
}
