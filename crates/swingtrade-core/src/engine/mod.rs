pub mod ledger;
pub mod market_data;
pub mod simulator;

pub use ledger::{EventLedger, OrderRecord, OrderStatus};
pub use market_data::MarketView;
pub use simulator::{RunReport, SimulationConfig, Simulator, StepOutcome};
