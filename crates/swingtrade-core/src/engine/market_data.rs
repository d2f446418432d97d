use crate::data::{TickWindow, TimeSeriesStore};
use crate::error::Result;
use crate::types::{Column, Frequency, Tick};
use chrono::NaiveDate;

/// Read-only market access pinned to the simulator's current date. Strategies see the
/// market only through this view, so they cannot read past `as_of`.
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    store: &'a TimeSeriesStore,
    frequency: Frequency,
    as_of: NaiveDate,
}

impl<'a> MarketView<'a> {
    pub fn new(store: &'a TimeSeriesStore, frequency: Frequency, as_of: NaiveDate) -> Self {
        Self {
            store,
            frequency,
            as_of,
        }
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn ticker(&self) -> &'a str {
        self.store.ticker()
    }

    pub fn latest(&self, columns: Option<&[Column]>, length: usize) -> Result<TickWindow> {
        self.store.latest(self.frequency, self.as_of, columns, length)
    }

    pub fn latest_ticks(&self, length: usize) -> Result<&'a [Tick]> {
        self.store.latest_ticks(self.frequency, self.as_of, length)
    }

    /// Same read on another loaded frequency, still bounded by `as_of`.
    pub fn latest_on(&self, frequency: Frequency, length: usize) -> Result<&'a [Tick]> {
        self.store.latest_ticks(frequency, self.as_of, length)
    }

    pub fn closes(&self, length: usize) -> Result<Vec<f64>> {
        Ok(self
            .latest_ticks(length)?
            .iter()
            .map(|tick| tick.close)
            .collect())
    }

    pub fn last_close(&self) -> Result<f64> {
        self.store.price_on_close(self.frequency, self.as_of)
    }
}
