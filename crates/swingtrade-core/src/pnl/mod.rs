//! Realized revenue reconstructed from a fill history.
//!
//! Proceeds are counted per share: each sell realizes `sell.price - buy.price` against
//! the most recent unmatched buy, regardless of share counts. The running total is
//! carried forward on ticks without a sell. Fills dated before the window only establish
//! which buy is still open when the window starts.

use crate::error::{Result, SimError};
use crate::types::{Fill, Side, Tick};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenuePoint {
    pub date: NaiveDate,
    pub realized_revenue: f64,
}

/// One point per tick dated within `start..=end`. The input fill slice is not consumed.
pub fn realized_revenue(
    ticks: &[Tick],
    fills: &[Fill],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<RevenuePoint>> {
    if start > end {
        return Err(SimError::InvalidConfig(format!(
            "revenue range start {start} is after end {end}"
        )));
    }
    if let Some(pair) = fills.windows(2).find(|pair| pair[1].date < pair[0].date) {
        return Err(SimError::InvalidOrder(format!(
            "fill history out of order: {} follows {}",
            pair[1].date, pair[0].date
        )));
    }

    let window: Vec<&Tick> = ticks
        .iter()
        .filter(|tick| tick.date >= start && tick.date <= end)
        .collect();

    let mut open_buy: Option<&Fill> = None;
    for fill in fills.iter().take_while(|fill| fill.date < start) {
        match fill.side {
            Side::Buy => open_buy = Some(fill),
            Side::Sell => {
                open_buy.take().ok_or_else(|| unmatched_sell(fill))?;
            }
        }
    }

    let mut pending = fills
        .iter()
        .filter(|fill| fill.date >= start && fill.date <= end)
        .peekable();
    let mut total = 0.0;
    let mut points = Vec::with_capacity(window.len());

    for tick in &window {
        while let Some(fill) = pending.next_if(|fill| fill.date <= tick.date) {
            match fill.side {
                Side::Buy => open_buy = Some(fill),
                Side::Sell => {
                    let buy = open_buy.take().ok_or_else(|| unmatched_sell(fill))?;
                    total += fill.price - buy.price;
                }
            }
        }
        points.push(RevenuePoint {
            date: tick.date,
            realized_revenue: total,
        });
    }

    if points.len() != window.len() {
        return Err(SimError::ReplayLength {
            produced: points.len(),
            expected: window.len(),
        });
    }
    Ok(points)
}

fn unmatched_sell(fill: &Fill) -> SimError {
    SimError::InvalidOrder(format!("sell on {} has no preceding buy", fill.date))
}
