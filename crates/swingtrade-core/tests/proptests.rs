use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use swingtrade_core::data::{Series, TimeSeriesStore};
use swingtrade_core::engine::{SimulationConfig, Simulator};
use swingtrade_core::pnl::realized_revenue;
use swingtrade_core::types::{Fill, Frequency, Order, Side, Tick};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

fn ticks(prices: &[(f64, f64)]) -> Vec<Tick> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &(open, close))| Tick {
            date: start() + Duration::days(i as i64),
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: 1.0,
        })
        .collect()
}

fn store(prices: &[(f64, f64)]) -> TimeSeriesStore {
    let series = Series::from_ticks(Frequency::Daily, ticks(prices)).unwrap();
    TimeSeriesStore::from_series("TEST", vec![series]).unwrap()
}

fn actions() -> impl Strategy<Value = Vec<(u8, f64)>> {
    prop::collection::vec((0u8..3, 0.5f64..20.0), 1..60)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn account_stays_solvent_and_balanced(
        prices in prop::collection::vec((1.0f64..500.0, 1.0f64..500.0), 2..80),
        actions in actions(),
        principal in 100.0f64..50_000.0,
    ) {
        let store = store(&prices);
        let mut sim = Simulator::new(&store, SimulationConfig {
            ticker: "TEST".to_string(),
            frequency: Frequency::Daily,
            start_date: start(),
            principal,
        }).unwrap();

        for (kind, shares) in actions {
            let order = match kind {
                0 => None,
                1 => Some(Order::buy("TEST", shares)),
                _ => Some(Order::sell("TEST", shares)),
            };
            let before = sim.snapshot();
            match sim.step(order) {
                Ok(outcome) => {
                    let close = sim.cur_price().unwrap();
                    let identity = sim.cash() + sim.shares_held() * close;
                    prop_assert!((outcome.snapshot.net_worth - identity).abs() < 1e-6);
                    if let Some(fill) = outcome.fill {
                        prop_assert!(fill.date > before.date);
                        prop_assert_eq!(fill.date, outcome.date);
                    }
                }
                Err(err) if err.is_end_of_data() => break,
                Err(_) => {
                    prop_assert_eq!(sim.snapshot(), before);
                }
            }
            prop_assert!(sim.cash() >= -1e-9);
            prop_assert!(sim.shares_held() >= 0.0);
        }
    }

    #[test]
    fn revenue_series_matches_ticks_and_forward_fills(
        prices in prop::collection::vec((1.0f64..500.0, 1.0f64..500.0), 2..60),
        fill_days in prop::collection::btree_set(0usize..60, 0..20),
    ) {
        let ticks = ticks(&prices);
        let fill_days: Vec<usize> = fill_days.into_iter().filter(|&i| i < ticks.len()).collect();
        let fills: Vec<Fill> = fill_days
            .iter()
            .enumerate()
            .map(|(n, &i)| Fill {
                date: ticks[i].date,
                side: if n % 2 == 0 { Side::Buy } else { Side::Sell },
                ticker: "TEST".to_string(),
                shares: 1.0,
                price: ticks[i].open,
            })
            .collect();

        let first = ticks[0].date;
        let last = ticks[ticks.len() - 1].date;
        let series = realized_revenue(&ticks, &fills, first, last).unwrap();
        prop_assert_eq!(series.len(), ticks.len());

        for pair in series.windows(2) {
            let changed = pair[0].realized_revenue != pair[1].realized_revenue;
            if changed {
                prop_assert!(fills.iter().any(|f| f.date == pair[1].date && f.side == Side::Sell));
            }
        }
    }

    #[test]
    fn latest_never_looks_ahead(
        prices in prop::collection::vec((1.0f64..500.0, 1.0f64..500.0), 1..60),
        offset in 0i64..80,
        length in 1usize..10,
    ) {
        let store = store(&prices);
        let as_of = start() + Duration::days(offset);
        if let Ok(window) = store.latest(Frequency::Daily, as_of, None, length) {
            prop_assert!(window.len() <= length);
            prop_assert!(window.dates().iter().all(|date| *date <= as_of));
        }
    }
}
