pub mod access;
pub mod ohlcv;
pub mod store;

pub use access::TickWindow;
pub use ohlcv::DataQualityReport;
pub use store::{Series, TimeSeriesStore};
