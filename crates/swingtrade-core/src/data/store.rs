use crate::data::ohlcv::{self, DataQualityReport};
use crate::error::{Result, SimError};
use crate::types::{Frequency, Tick};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A cleaned, strictly date-ascending tick series for one frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    frequency: Frequency,
    ticks: Vec<Tick>,
}

impl Series {
    /// Builds a series from arbitrary rows. Rows are sorted and de-duplicated the same
    /// way a loaded CSV is.
    pub fn from_ticks(frequency: Frequency, ticks: Vec<Tick>) -> Result<Self> {
        let mut report = DataQualityReport::default();
        let ticks = ohlcv::clean_ticks(ticks, frequency, &mut report);
        if ticks.is_empty() {
            return Err(SimError::NoData(format!("{frequency} series has no rows")));
        }
        Ok(Self { frequency, ticks })
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.ticks.first().map(|tick| tick.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.ticks.last().map(|tick| tick.date)
    }

    /// Index of the tick dated exactly `date`.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.ticks.binary_search_by_key(&date, |tick| tick.date).ok()
    }

    /// All ticks dated on or before `as_of`.
    pub fn upto(&self, as_of: NaiveDate) -> &[Tick] {
        let end = self.ticks.partition_point(|tick| tick.date <= as_of);
        &self.ticks[..end]
    }

    /// Ticks with `start <= date <= end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> &[Tick] {
        let lo = self.ticks.partition_point(|tick| tick.date < start);
        let hi = self.ticks.partition_point(|tick| tick.date <= end);
        if lo >= hi {
            return &[];
        }
        &self.ticks[lo..hi]
    }
}

/// All loaded series for one ticker, keyed by frequency. Read-only after construction.
#[derive(Debug, Clone)]
pub struct TimeSeriesStore {
    ticker: String,
    series: BTreeMap<Frequency, Series>,
    quality: BTreeMap<Frequency, DataQualityReport>,
}

impl TimeSeriesStore {
    /// Loads `<data_root>/<freq>/<TICKER>-<freq>.csv` for every requested frequency.
    pub fn load(data_root: &Path, ticker: &str, frequencies: &[Frequency]) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(SimError::InvalidConfig(
                "at least one frequency must be loaded".to_string(),
            ));
        }

        let mut series = BTreeMap::new();
        let mut quality = BTreeMap::new();
        for &frequency in frequencies {
            let path = Self::csv_path(data_root, ticker, frequency);
            if !path.is_file() {
                return Err(SimError::NoData(format!(
                    "missing {frequency} data file {}",
                    path.display()
                )));
            }
            let (ticks, report) = ohlcv::load_csv(&path, frequency)?;
            if ticks.is_empty() {
                return Err(SimError::NoData(format!(
                    "{} has no usable rows after cleaning",
                    path.display()
                )));
            }
            info!(
                ticker,
                %frequency,
                rows = ticks.len(),
                first = ?report.first_date,
                last = ?report.last_date,
                "loaded series"
            );
            series.insert(frequency, Series { frequency, ticks });
            quality.insert(frequency, report);
        }

        Ok(Self {
            ticker: ticker.to_string(),
            series,
            quality,
        })
    }

    pub fn csv_path(data_root: &Path, ticker: &str, frequency: Frequency) -> PathBuf {
        data_root
            .join(frequency.as_str())
            .join(format!("{ticker}-{frequency}.csv"))
    }

    pub fn from_series(ticker: impl Into<String>, series: Vec<Series>) -> Result<Self> {
        if series.is_empty() {
            return Err(SimError::NoData("no series supplied".to_string()));
        }
        let series: BTreeMap<_, _> = series.into_iter().map(|s| (s.frequency, s)).collect();
        Ok(Self {
            ticker: ticker.into(),
            series,
            quality: BTreeMap::new(),
        })
    }

    /// Keeps only ticks inside `start..=end`. Applies to one frequency or, when
    /// `frequency` is `None`, to every loaded frequency.
    pub fn with_date_bounds(
        mut self,
        start: NaiveDate,
        end: NaiveDate,
        frequency: Option<Frequency>,
    ) -> Result<Self> {
        if start > end {
            return Err(SimError::InvalidConfig(format!(
                "date bounds start {start} is after end {end}"
            )));
        }
        let targets: Vec<Frequency> = match frequency {
            Some(frequency) => {
                self.series(frequency)?;
                vec![frequency]
            }
            None => self.series.keys().copied().collect(),
        };
        for frequency in targets {
            if let Some(series) = self.series.get_mut(&frequency) {
                series
                    .ticks
                    .retain(|tick| tick.date >= start && tick.date <= end);
                debug!(%frequency, %start, %end, rows = series.ticks.len(), "applied date bounds");
                if series.ticks.is_empty() {
                    return Err(SimError::NoData(format!(
                        "{frequency} series is empty within {start}..={end}"
                    )));
                }
            }
        }
        Ok(self)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn frequencies(&self) -> impl Iterator<Item = Frequency> + '_ {
        self.series.keys().copied()
    }

    pub fn series(&self, frequency: Frequency) -> Result<&Series> {
        self.series
            .get(&frequency)
            .ok_or_else(|| SimError::NoData(format!("{frequency} series is not loaded")))
    }

    pub fn quality(&self, frequency: Frequency) -> Option<&DataQualityReport> {
        self.quality.get(&frequency)
    }
}
