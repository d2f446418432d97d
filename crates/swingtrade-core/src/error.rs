use crate::types::Frequency;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = SimError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("no data: {0}")]
    NoData(String),

    #[error("no {frequency} tick at or before {date}")]
    NotFound { frequency: Frequency, date: NaiveDate },

    #[error("end of {frequency} data: cannot advance {n} tick(s) past {date}")]
    EndOfData {
        frequency: Frequency,
        date: NaiveDate,
        n: usize,
    },

    #[error("insufficient funds: order needs {required:.4}, cash is {available:.4}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("insufficient shares: sell of {requested} with {held} held (short selling is not permitted)")]
    InsufficientShares { requested: f64, held: f64 },

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("ledger replay produced {produced} values for {expected} ticks")]
    ReplayLength { produced: usize, expected: usize },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error on {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    /// True for the conditions that end a run rather than indicate a bad request.
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, SimError::EndOfData { .. })
    }
}
