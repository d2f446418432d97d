use crate::error::{Result, SimError};
use crate::types::Side;

/// Cash and share count for the single simulated ticker. Long-only.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Account {
    cash: f64,
    shares_held: f64,
}

impl Account {
    pub fn new_with_cash(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            shares_held: 0.0,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn shares_held(&self) -> f64 {
        self.shares_held
    }

    /// Checks that a fill of `shares` at `price` keeps cash and shares non-negative.
    pub fn check_fill(&self, side: Side, shares: f64, price: f64) -> Result<()> {
        match side {
            Side::Buy => {
                let required = shares * price;
                if required > self.cash {
                    return Err(SimError::InsufficientFunds {
                        required,
                        available: self.cash,
                    });
                }
            }
            Side::Sell => {
                if shares > self.shares_held {
                    return Err(SimError::InsufficientShares {
                        requested: shares,
                        held: self.shares_held,
                    });
                }
            }
        }
        Ok(())
    }

    /// Applies a fill, or leaves the account untouched and returns the violation.
    pub fn apply_fill(&mut self, side: Side, shares: f64, price: f64) -> Result<()> {
        self.check_fill(side, shares, price)?;
        match side {
            Side::Buy => {
                self.cash -= shares * price;
                self.shares_held += shares;
            }
            Side::Sell => {
                self.cash += shares * price;
                self.shares_held -= shares;
            }
        }
        Ok(())
    }

    pub fn net_worth(&self, price: f64) -> f64 {
        self.shares_held * price + self.cash
    }
}
