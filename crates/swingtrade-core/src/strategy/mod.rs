//! Decision makers driven by [`Simulator::run`](crate::engine::Simulator::run).
//!
//! A strategy sees the market only through a [`MarketView`] pinned to the current date
//! and the account snapshot taken at the previous close.

use crate::engine::MarketView;
use crate::types::{AccountSnapshot, Order};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Buys need cash for the notional at the last close plus this margin, since the fill
/// happens at the next open.
const GAP_HEADROOM: f64 = 1.25;

pub trait Strategy {
    fn name(&self) -> &str;

    fn decide(&mut self, _view: &MarketView<'_>, _account: &AccountSnapshot) -> Option<Order> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Hold,
    BuyAndHold,
    Periodic,
    SimpleSma,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyParams {
    pub shares: f64,
    pub every: usize,
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            shares: 1.0,
            every: 10,
            short_window: 10,
            long_window: 30,
        }
    }
}

pub fn build_strategy(kind: StrategyKind, params: StrategyParams) -> Box<dyn Strategy> {
    match kind {
        StrategyKind::Hold => Box::new(HoldStrategy),
        StrategyKind::BuyAndHold => Box::new(BuyAndHold::new(params.shares)),
        StrategyKind::Periodic => Box::new(Periodic::new(params.every, params.shares)),
        StrategyKind::SimpleSma => Box::new(SimpleSma::new(
            params.short_window,
            params.long_window,
            params.shares,
        )),
    }
}

fn affordable(view: &MarketView<'_>, account: &AccountSnapshot, shares: f64) -> bool {
    match view.last_close() {
        Ok(price) => account.cash >= shares * price * GAP_HEADROOM,
        Err(_) => false,
    }
}

pub struct HoldStrategy;

impl Strategy for HoldStrategy {
    fn name(&self) -> &str {
        "hold"
    }
}

pub struct BuyAndHold {
    has_bought: bool,
    shares: f64,
}

impl BuyAndHold {
    pub fn new(shares: f64) -> Self {
        Self {
            has_bought: false,
            shares,
        }
    }
}

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn decide(&mut self, view: &MarketView<'_>, account: &AccountSnapshot) -> Option<Order> {
        if self.has_bought || !affordable(view, account, self.shares) {
            return None;
        }
        self.has_bought = true;
        Some(Order::buy(view.ticker(), self.shares))
    }
}

/// Acts on every `every`-th tick, alternating a buy and a sell of `shares`.
pub struct Periodic {
    every: usize,
    shares: f64,
    tick: usize,
}

impl Periodic {
    pub fn new(every: usize, shares: f64) -> Self {
        Self {
            every: every.max(1),
            shares,
            tick: 0,
        }
    }
}

impl Strategy for Periodic {
    fn name(&self) -> &str {
        "periodic"
    }

    fn decide(&mut self, view: &MarketView<'_>, account: &AccountSnapshot) -> Option<Order> {
        let tick = self.tick;
        self.tick += 1;
        if tick % self.every != 0 {
            return None;
        }

        if tick % (2 * self.every) == 0 {
            if !affordable(view, account, self.shares) {
                debug!(date = %view.as_of(), "periodic buy skipped, cash too low");
                return None;
            }
            Some(Order::buy(view.ticker(), self.shares))
        } else {
            let shares = self.shares.min(account.shares_held);
            (shares > 0.0).then(|| Order::sell(view.ticker(), shares))
        }
    }
}

/// Goes long `shares` when the short average is above the long one, and flattens
/// when it falls below.
pub struct SimpleSma {
    short_window: usize,
    long_window: usize,
    shares: f64,
}

impl SimpleSma {
    pub fn new(short_window: usize, long_window: usize, shares: f64) -> Self {
        Self {
            short_window: short_window.max(1),
            long_window: long_window.max(1),
            shares,
        }
    }
}

impl Strategy for SimpleSma {
    fn name(&self) -> &str {
        "simple_sma"
    }

    fn decide(&mut self, view: &MarketView<'_>, account: &AccountSnapshot) -> Option<Order> {
        let closes = view.closes(self.long_window).ok()?;
        if closes.len() < self.long_window {
            return None;
        }
        let mean = |window: usize| closes[closes.len() - window..].iter().sum::<f64>() / window as f64;
        let short = mean(self.short_window.min(self.long_window));
        let long = mean(self.long_window);

        if short > long && account.shares_held <= 0.0 && affordable(view, account, self.shares) {
            return Some(Order::buy(view.ticker(), self.shares));
        }
        if short < long && account.shares_held > 0.0 {
            return Some(Order::sell(view.ticker(), account.shares_held));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Series, TimeSeriesStore};
    use crate::types::{Frequency, Side, Tick};
    use chrono::NaiveDate;

    fn store(closes: &[f64]) -> TimeSeriesStore {
        let start = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        let ticks = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Tick {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
            })
            .collect();
        let series = Series::from_ticks(Frequency::Daily, ticks).unwrap();
        TimeSeriesStore::from_series("AAPL", vec![series]).unwrap()
    }

    fn account(cash: f64, shares_held: f64) -> AccountSnapshot {
        AccountSnapshot {
            date: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
            cash,
            shares_held,
            cur_price: None,
            net_worth: cash,
            performance: 1.0,
        }
    }

    fn view(store: &TimeSeriesStore, day: u32) -> MarketView<'_> {
        MarketView::new(store, Frequency::Daily, NaiveDate::from_ymd_opt(2021, 6, day).unwrap())
    }

    #[test]
    fn periodic_alternates_buy_and_sell() {
        let store = store(&[10.0; 8]);
        let mut strategy = Periodic::new(2, 1.0);
        let sides: Vec<Option<Side>> = (1..=5)
            .map(|day| {
                strategy
                    .decide(&view(&store, day), &account(1000.0, 1.0))
                    .map(|order| order.side)
            })
            .collect();
        assert_eq!(
            sides,
            vec![Some(Side::Buy), None, Some(Side::Sell), None, Some(Side::Buy)]
        );
    }

    #[test]
    fn periodic_never_sells_more_than_held() {
        let store = store(&[10.0; 4]);
        let mut strategy = Periodic::new(1, 5.0);
        strategy.decide(&view(&store, 1), &account(1000.0, 0.0));
        let order = strategy.decide(&view(&store, 2), &account(1000.0, 2.0)).unwrap();
        assert_eq!(order.shares, 2.0);
        strategy.decide(&view(&store, 3), &account(1000.0, 0.0));
        assert!(strategy.decide(&view(&store, 4), &account(1000.0, 0.0)).is_none());
    }

    #[test]
    fn buy_and_hold_buys_once_when_affordable() {
        let store = store(&[100.0; 3]);
        let mut strategy = BuyAndHold::new(1.0);
        assert!(strategy.decide(&view(&store, 1), &account(100.0, 0.0)).is_none());
        assert!(strategy.decide(&view(&store, 1), &account(1000.0, 0.0)).is_some());
        assert!(strategy.decide(&view(&store, 2), &account(1000.0, 0.0)).is_none());
    }

    #[test]
    fn simple_sma_follows_trend() {
        let store = store(&[1.0, 2.0, 3.0, 4.0, 3.0, 1.0]);
        let mut strategy = SimpleSma::new(2, 4, 1.0);
        assert!(strategy.decide(&view(&store, 2), &account(100.0, 0.0)).is_none());
        let buy = strategy.decide(&view(&store, 4), &account(100.0, 0.0)).unwrap();
        assert_eq!(buy.side, Side::Buy);
        let sell = strategy.decide(&view(&store, 6), &account(100.0, 3.0)).unwrap();
        assert_eq!(sell.side, Side::Sell);
        assert_eq!(sell.shares, 3.0);
    }

    #[test]
    fn builds_each_kind() {
        for (kind, name) in [
            (StrategyKind::Hold, "hold"),
            (StrategyKind::BuyAndHold, "buy_and_hold"),
            (StrategyKind::Periodic, "periodic"),
            (StrategyKind::SimpleSma, "simple_sma"),
        ] {
            assert_eq!(build_strategy(kind, StrategyParams::default()).name(), name);
        }
    }
}
