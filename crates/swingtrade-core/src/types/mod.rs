use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod frequency;

pub use frequency::Frequency;

/// One cleaned OHLCV row. The date is the series key and carries no time of day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Tick {
    pub fn value(&self, column: Column) -> f64 {
        match column {
            Column::Open => self.open,
            Column::High => self.high,
            Column::Low => self.low,
            Column::Close => self.close,
            Column::Volume => self.volume,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
        Column::Volume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Open => "Open",
            Column::High => "High",
            Column::Low => "Low",
            Column::Close => "Close",
            Column::Volume => "Volume",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// A request to trade. `date_entered` is stamped by the simulator when the order is
/// accepted and is `None` until then.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub side: Side,
    pub ticker: String,
    pub shares: f64,
    pub date_entered: Option<NaiveDate>,
}

impl Order {
    pub fn buy(ticker: impl Into<String>, shares: f64) -> Self {
        Self {
            side: Side::Buy,
            ticker: ticker.into(),
            shares,
            date_entered: None,
        }
    }

    pub fn sell(ticker: impl Into<String>, shares: f64) -> Self {
        Self {
            side: Side::Sell,
            ticker: ticker.into(),
            shares,
            date_entered: None,
        }
    }

    pub(crate) fn entered_on(self, date: NaiveDate) -> Self {
        Self {
            date_entered: Some(date),
            ..self
        }
    }
}

/// An executed trade. Always priced at the open of the tick after the order was entered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fill {
    pub date: NaiveDate,
    pub side: Side,
    pub ticker: String,
    pub shares: f64,
    pub price: f64,
}

impl Fill {
    pub fn notional(&self) -> f64 {
        self.shares * self.price
    }
}

/// Account state after a completed step, or at reset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSnapshot {
    pub date: NaiveDate,
    pub cash: f64,
    pub shares_held: f64,
    pub cur_price: Option<f64>,
    pub net_worth: f64,
    pub performance: f64,
}
