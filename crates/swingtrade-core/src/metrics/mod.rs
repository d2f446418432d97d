use crate::types::{AccountSnapshot, Fill, Frequency, Side};
use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub ticks: usize,
    pub orders: usize,
    pub fills: usize,
    pub rejected_orders: usize,
    pub final_net_worth: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub sharpe: f64,
    pub win_rate: f64,
    pub realized_revenue: f64,
    pub buy_and_hold: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsConfig {
    pub risk_free_rate: f64,
    pub annualization_factor: Option<f64>,
}

impl MetricsConfig {
    /// Annualizes per-tick returns by the number of ticks in a trading year.
    pub fn for_frequency(frequency: Frequency) -> Self {
        let periods = match frequency {
            Frequency::Daily => 252.0,
            Frequency::Weekly => 52.0,
            Frequency::Monthly => 12.0,
        };
        Self {
            risk_free_rate: 0.0,
            annualization_factor: Some(periods),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            annualization_factor: None,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct MetricsState {
    net_worth: Vec<f64>,
    fills: Vec<Fill>,
    orders: usize,
    rejected_orders: usize,
    principal: f64,
    peak: f64,
    max_drawdown: f64,
    config: MetricsConfig,
}

impl MetricsState {
    pub fn new(principal: f64, config: MetricsConfig) -> Self {
        Self {
            principal,
            config,
            ..Self::default()
        }
    }

    pub fn record_snapshot(&mut self, snapshot: &AccountSnapshot) {
        let value = snapshot.net_worth;
        if self.peak == 0.0 || value > self.peak {
            self.peak = value;
        } else if self.peak > 0.0 {
            let drawdown = (self.peak - value) / self.peak;
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }
        self.net_worth.push(value);
    }

    pub fn record_fill(&mut self, fill: &Fill) {
        self.fills.push(fill.clone());
    }

    pub fn record_orders(&mut self, orders: usize, rejected: usize) {
        self.orders += orders;
        self.rejected_orders += rejected;
    }

    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    pub fn summary(&self, realized_revenue: f64, buy_and_hold: Option<f64>) -> PerformanceSummary {
        let final_net_worth = self.net_worth.last().copied().unwrap_or(self.principal);
        let total_return = if self.principal > 0.0 {
            final_net_worth / self.principal - 1.0
        } else {
            0.0
        };
        PerformanceSummary {
            ticks: self.net_worth.len().saturating_sub(1),
            orders: self.orders,
            fills: self.fills.len(),
            rejected_orders: self.rejected_orders,
            final_net_worth,
            total_return,
            max_drawdown: self.max_drawdown,
            sharpe: self.sharpe_ratio(),
            win_rate: self.win_rate(),
            realized_revenue,
            buy_and_hold,
        }
    }

    fn sharpe_ratio(&self) -> f64 {
        if self.net_worth.len() < 3 {
            return 0.0;
        }

        let returns: Vec<f64> = self
            .net_worth
            .windows(2)
            .filter(|pair| pair[0] > 0.0)
            .map(|pair| pair[1] / pair[0] - 1.0 - self.config.risk_free_rate)
            .collect();
        if returns.len() < 2 {
            return 0.0;
        }

        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let var = returns
            .iter()
            .map(|ret| {
                let diff = ret - mean;
                diff * diff
            })
            .sum::<f64>()
            / (returns.len() as f64 - 1.0);

        let std = var.sqrt();
        if std == 0.0 {
            0.0
        } else {
            let scale = self
                .config
                .annualization_factor
                .unwrap_or(returns.len() as f64);
            mean / std * scale.sqrt()
        }
    }

    /// Share of sells priced above the buy they close.
    fn win_rate(&self) -> f64 {
        let mut last_buy: Option<f64> = None;
        let mut wins = 0usize;
        let mut closed = 0usize;
        for fill in &self.fills {
            match fill.side {
                Side::Buy => last_buy = Some(fill.price),
                Side::Sell => {
                    if let Some(buy) = last_buy.take() {
                        closed += 1;
                        if fill.price > buy {
                            wins += 1;
                        }
                    }
                }
            }
        }
        if closed == 0 {
            0.0
        } else {
            wins as f64 / closed as f64
        }
    }
}
