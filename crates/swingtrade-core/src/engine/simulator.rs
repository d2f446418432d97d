//! Tick-by-tick trading simulator for one ticker at one frequency.
//!
//! Each call to [`Simulator::step`] walks the same cycle:
//!
//! 1. pre-trade: an order may be entered and is stamped with the current date;
//! 2. advance: the clock moves to the next tick date of the series;
//! 3. open: the pending order fills at that tick's open;
//! 4. close: the account is valued at that tick's close and a snapshot is recorded.
//!
//! A step that fails commits nothing. The account, clock and history are exactly as
//! they were before the call; only the ledger gains a record of the failed order.

use crate::data::TimeSeriesStore;
use crate::engine::ledger::{EventLedger, OrderStatus};
use crate::engine::market_data::MarketView;
use crate::error::{Result, SimError};
use crate::pnl::{self, RevenuePoint};
use crate::portfolio::Account;
use crate::strategy::Strategy;
use crate::types::{AccountSnapshot, Fill, Frequency, Order};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub ticker: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub principal: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub date: NaiveDate,
    pub fill: Option<Fill>,
    pub snapshot: AccountSnapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub strategy: String,
    pub steps: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// True when the run stopped because the series had no further tick.
    pub exhausted: bool,
}

#[derive(Debug)]
pub struct Simulator<'a> {
    store: &'a TimeSeriesStore,
    config: SimulationConfig,
    account: Account,
    cur_date: NaiveDate,
    cur_price: Option<f64>,
    net_worth: f64,
    performance: f64,
    pending: Option<Order>,
    ledger: EventLedger,
    history: Vec<AccountSnapshot>,
}

impl<'a> Simulator<'a> {
    /// Creates a simulator positioned on the last tick at or before `start_date`, which
    /// must fall inside the series' date range.
    pub fn new(store: &'a TimeSeriesStore, mut config: SimulationConfig) -> Result<Self> {
        if !config.principal.is_finite() || config.principal <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "principal must be a positive amount, got {}",
                config.principal
            )));
        }
        if config.ticker != store.ticker() {
            return Err(SimError::InvalidConfig(format!(
                "simulator ticker {} does not match loaded data for {}",
                config.ticker,
                store.ticker()
            )));
        }
        let (first, last) = store.date_bounds(Some(config.frequency))?;
        if config.start_date < first || config.start_date > last {
            return Err(SimError::InvalidConfig(format!(
                "start date {} is outside the {} data range {first}..={last}",
                config.start_date, config.frequency
            )));
        }
        let series = store.series(config.frequency)?;
        let start = series
            .upto(config.start_date)
            .last()
            .map(|tick| tick.date)
            .ok_or(SimError::NotFound {
                frequency: config.frequency,
                date: config.start_date,
            })?;
        if start != config.start_date {
            debug!(
                requested = %config.start_date,
                %start,
                "start date moved back to the nearest tick"
            );
        }
        config.start_date = start;

        let mut sim = Self {
            store,
            account: Account::new_with_cash(config.principal),
            cur_date: start,
            cur_price: None,
            net_worth: config.principal,
            performance: 1.0,
            pending: None,
            ledger: EventLedger::new(),
            history: Vec::new(),
            config,
        };
        let initial = sim.snapshot();
        sim.history.push(initial);
        Ok(sim)
    }

    /// Restores the initial account, clock and empty ledger.
    pub fn reset(&mut self) {
        self.account = Account::new_with_cash(self.config.principal);
        self.cur_date = self.config.start_date;
        self.cur_price = None;
        self.net_worth = self.config.principal;
        self.performance = 1.0;
        self.pending = None;
        self.ledger.clear();
        self.history.clear();
        let initial = self.snapshot();
        self.history.push(initial);
    }

    /// Enters an order for the next step. At most one order may be pending.
    pub fn submit(&mut self, order: Order) -> Result<()> {
        if let Some(pending) = &self.pending {
            return Err(SimError::InvalidOrder(format!(
                "an order entered on {} is already pending",
                pending.date_entered.unwrap_or(self.cur_date)
            )));
        }
        if !order.shares.is_finite() || order.shares <= 0.0 {
            return Err(SimError::InvalidOrder(format!(
                "share count must be positive, got {}",
                order.shares
            )));
        }
        if order.ticker != self.config.ticker {
            return Err(SimError::InvalidOrder(format!(
                "order ticker {} does not match simulated ticker {}",
                order.ticker, self.config.ticker
            )));
        }
        self.pending = Some(order.entered_on(self.cur_date));
        Ok(())
    }

    /// Runs one pre-trade, advance, open, close cycle.
    pub fn step(&mut self, order: Option<Order>) -> Result<StepOutcome> {
        if let Some(order) = order {
            self.submit(order)?;
        }
        let pending = self.pending.take();
        let store = self.store;
        let frequency = self.config.frequency;

        let next = match store.next_tick(frequency, self.cur_date) {
            Ok(next) => next,
            Err(err) => return Err(self.drop_pending(pending, err)),
        };

        let open = match store.price_on_open(frequency, next) {
            Ok(open) => open,
            Err(err) => return Err(self.drop_pending(pending, err)),
        };

        let mut account = self.account;
        let mut fill = None;
        if let Some(order) = &pending {
            if let Err(err) = account.apply_fill(order.side, order.shares, open) {
                warn!(
                    date = %next,
                    side = order.side.as_str(),
                    shares = order.shares,
                    price = open,
                    error = %err,
                    "order rejected at open"
                );
                let status = match err {
                    SimError::InsufficientShares { .. } => OrderStatus::RejectedShares,
                    _ => OrderStatus::RejectedFunds,
                };
                self.ledger.record_order(order.clone(), status);
                return Err(err);
            }
            fill = Some(Fill {
                date: next,
                side: order.side,
                ticker: order.ticker.clone(),
                shares: order.shares,
                price: open,
            });
        }

        let close = match store.price_on_close(frequency, next) {
            Ok(close) => close,
            Err(err) => return Err(self.drop_pending(pending, err)),
        };

        self.account = account;
        self.cur_date = next;
        self.cur_price = Some(close);
        self.net_worth = account.net_worth(close);
        self.performance = self.net_worth / self.config.principal;
        if let Some(order) = pending {
            self.ledger.record_order(order, OrderStatus::Filled);
        }
        if let Some(fill) = &fill {
            debug!(
                date = %fill.date,
                side = fill.side.as_str(),
                shares = fill.shares,
                price = fill.price,
                "order filled"
            );
            self.ledger.record_fill(fill.clone());
        }
        let snapshot = self.snapshot();
        self.history.push(snapshot.clone());

        Ok(StepOutcome {
            date: next,
            fill,
            snapshot,
        })
    }

    /// Steps until the series ends or `max_steps` steps have completed. Any error other
    /// than running out of data stops the run and is returned.
    pub fn run<S: Strategy + ?Sized>(
        &mut self,
        strategy: &mut S,
        max_steps: Option<usize>,
    ) -> Result<RunReport> {
        let start_date = self.cur_date;
        let mut steps = 0usize;
        let mut exhausted = false;
        info!(
            strategy = strategy.name(),
            ticker = %self.config.ticker,
            frequency = %self.config.frequency,
            start = %start_date,
            "simulation started"
        );

        while max_steps.map_or(true, |max| steps < max) {
            let order = strategy.decide(&self.view(), &self.snapshot());
            match self.step(order) {
                Ok(_) => steps += 1,
                Err(err) if err.is_end_of_data() => {
                    exhausted = true;
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            steps,
            end = %self.cur_date,
            net_worth = self.net_worth,
            fills = self.ledger.fill_count(),
            "simulation finished"
        );
        Ok(RunReport {
            strategy: strategy.name().to_string(),
            steps,
            start_date,
            end_date: self.cur_date,
            exhausted,
        })
    }

    /// Realized revenue per tick over `start..=end`, replayed from this run's fills.
    pub fn realized_revenue(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RevenuePoint>> {
        let series = self.store.series(self.config.frequency)?;
        pnl::realized_revenue(series.ticks(), self.ledger.fills(), start, end)
    }

    pub fn view(&self) -> MarketView<'a> {
        MarketView::new(self.store, self.config.frequency, self.cur_date)
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            date: self.cur_date,
            cash: self.account.cash(),
            shares_held: self.account.shares_held(),
            cur_price: self.cur_price,
            net_worth: self.net_worth,
            performance: self.performance,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn store(&self) -> &'a TimeSeriesStore {
        self.store
    }

    pub fn cur_date(&self) -> NaiveDate {
        self.cur_date
    }

    pub fn cur_price(&self) -> Option<f64> {
        self.cur_price
    }

    pub fn cash(&self) -> f64 {
        self.account.cash()
    }

    pub fn shares_held(&self) -> f64 {
        self.account.shares_held()
    }

    pub fn net_worth(&self) -> f64 {
        self.net_worth
    }

    pub fn performance(&self) -> f64 {
        self.performance
    }

    pub fn pending_order(&self) -> Option<&Order> {
        self.pending.as_ref()
    }

    pub fn ledger(&self) -> &EventLedger {
        &self.ledger
    }

    /// Snapshot at reset followed by one snapshot per completed step.
    pub fn history(&self) -> &[AccountSnapshot] {
        &self.history
    }

    fn drop_pending(&mut self, pending: Option<Order>, err: SimError) -> SimError {
        if let Some(order) = pending {
            debug!(error = %err, "pending order dropped without a fill");
            self.ledger.record_order(order, OrderStatus::Unfilled);
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Series;
    use crate::types::{Side, Tick};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, day).unwrap()
    }

    fn store() -> TimeSeriesStore {
        let ticks = vec![
            (d(1), 100.0, 101.0),
            (d(2), 100.0, 102.0),
            (d(3), 103.0, 104.0),
            (d(4), 110.0, 108.0),
        ]
        .into_iter()
        .map(|(date, open, close)| Tick {
            date,
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: 1_000.0,
        })
        .collect();
        let series = Series::from_ticks(Frequency::Daily, ticks).unwrap();
        TimeSeriesStore::from_series("AAPL", vec![series]).unwrap()
    }

    fn config(principal: f64) -> SimulationConfig {
        SimulationConfig {
            ticker: "AAPL".to_string(),
            frequency: Frequency::Daily,
            start_date: d(1),
            principal,
        }
    }

    #[test]
    fn new_rejects_bad_principal_and_ticker() {
        let store = store();
        assert!(matches!(
            Simulator::new(&store, config(0.0)).unwrap_err(),
            SimError::InvalidConfig(_)
        ));
        let mut cfg = config(100.0);
        cfg.ticker = "MSFT".to_string();
        assert!(Simulator::new(&store, cfg).is_err());
    }

    #[test]
    fn new_rejects_start_outside_data() {
        let store = store();
        for start in [d(6), NaiveDate::from_ymd_opt(2021, 2, 1).unwrap()] {
            let mut cfg = config(100.0);
            cfg.start_date = start;
            assert!(matches!(
                Simulator::new(&store, cfg).unwrap_err(),
                SimError::InvalidConfig(_)
            ));
        }
    }

    #[test]
    fn buy_fills_at_next_open_and_values_at_close() {
        let store = store();
        let mut sim = Simulator::new(&store, config(10_000.0)).unwrap();
        let outcome = sim.step(Some(Order::buy("AAPL", 1.0))).unwrap();

        assert_eq!(outcome.date, d(2));
        let fill = outcome.fill.unwrap();
        assert_eq!(fill.price, 100.0);
        assert_eq!(fill.side, Side::Buy);
        assert!((sim.cash() - 9_900.0).abs() < 1e-9);
        assert!((sim.net_worth() - 10_002.0).abs() < 1e-9);
        assert!((sim.performance() - 1.0002).abs() < 1e-12);
        assert_eq!(sim.ledger().orders()[0].order.date_entered, Some(d(1)));
        assert_eq!(sim.history().len(), 2);
    }

    #[test]
    fn rejected_step_changes_nothing() {
        let store = store();
        let mut sim = Simulator::new(&store, config(10_000.0)).unwrap();
        let before = sim.snapshot();

        let err = sim.step(Some(Order::sell("AAPL", 5.0))).unwrap_err();
        assert!(matches!(err, SimError::InsufficientShares { .. }));
        assert_eq!(sim.snapshot(), before);
        assert_eq!(sim.history().len(), 1);
        assert!(sim.pending_order().is_none());
        assert_eq!(sim.ledger().orders()[0].status, OrderStatus::RejectedShares);
        assert!(sim.ledger().fills().is_empty());
    }

    #[test]
    fn only_one_order_may_be_pending() {
        let store = store();
        let mut sim = Simulator::new(&store, config(10_000.0)).unwrap();
        sim.submit(Order::buy("AAPL", 1.0)).unwrap();
        let err = sim.submit(Order::buy("AAPL", 1.0)).unwrap_err();
        assert!(matches!(err, SimError::InvalidOrder(_)));
        assert!(sim.submit(Order::buy("AAPL", -1.0)).is_err());
        assert!(sim.step(Some(Order::buy("AAPL", 1.0))).is_err());
        // The first order is still pending and fills on the next plain step.
        assert!(sim.step(None).unwrap().fill.is_some());
    }

    #[test]
    fn orders_for_other_tickers_are_invalid() {
        let store = store();
        let mut sim = Simulator::new(&store, config(10_000.0)).unwrap();
        assert!(matches!(
            sim.submit(Order::buy("MSFT", 1.0)).unwrap_err(),
            SimError::InvalidOrder(_)
        ));
    }

    #[test]
    fn stepping_past_the_end_is_end_of_data() {
        let store = store();
        let mut sim = Simulator::new(&store, config(1_000.0)).unwrap();
        for _ in 0..3 {
            sim.step(None).unwrap();
        }
        let err = sim.step(Some(Order::buy("AAPL", 1.0))).unwrap_err();
        assert!(err.is_end_of_data());
        assert_eq!(sim.cur_date(), d(4));
        assert_eq!(sim.ledger().orders()[0].status, OrderStatus::Unfilled);
    }

    #[test]
    fn reset_restores_initial_state() {
        let store = store();
        let mut sim = Simulator::new(&store, config(1_000.0)).unwrap();
        let initial = sim.snapshot();
        sim.step(Some(Order::buy("AAPL", 2.0))).unwrap();
        sim.step(None).unwrap();
        sim.reset();
        assert_eq!(sim.snapshot(), initial);
        assert!(sim.ledger().orders().is_empty());
        assert_eq!(sim.history().len(), 1);
    }

    #[test]
    fn run_stops_at_end_of_data() {
        let store = store();
        let mut sim = Simulator::new(&store, config(1_000.0)).unwrap();
        let mut strategy = crate::strategy::HoldStrategy;
        let report = sim.run(&mut strategy, None).unwrap();
        assert_eq!(report.steps, 3);
        assert!(report.exhausted);
        assert_eq!(report.end_date, d(4));

        sim.reset();
        let report = sim.run(&mut strategy, Some(2)).unwrap();
        assert_eq!(report.steps, 2);
        assert!(!report.exhausted);
    }
}
