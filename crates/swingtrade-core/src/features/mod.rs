//! Technical indicators computed over a tick slice.
//!
//! Every indicator yields one value per input tick, `None` where the window is not yet
//! full. Names follow `{kind}-{arg}_{arg}` and round-trip through [`Indicator::parse`].

pub mod rolling;

use crate::error::{Result, SimError};
use crate::types::Tick;
use rolling::{Ewm, RollingExtreme, RollingRsi, RollingSma, RollingStd};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Indicator {
    Sma { period: usize },
    Ema { period: usize },
    Macd { fast: usize, slow: usize },
    MacdHist { fast: usize, slow: usize, signal: usize },
    BollingerUpper { period: usize, k: f64 },
    BollingerLower { period: usize, k: f64 },
    Rsi { period: usize },
    StochasticOscillator { period: usize },
    Atr { period: usize },
    Obv,
    Vwap,
    TenkanSen { period: usize },
    KijunSen { period: usize },
    SenkouSpanA { conversion: usize, base: usize },
    SenkouSpanB { period: usize, shift: usize },
    ChikouSpan { shift: usize },
}

impl Indicator {
    pub fn kind(&self) -> &'static str {
        match self {
            Indicator::Sma { .. } => "sma",
            Indicator::Ema { .. } => "ema",
            Indicator::Macd { .. } => "macd",
            Indicator::MacdHist { .. } => "macd_hist",
            Indicator::BollingerUpper { .. } => "bollinger_upper",
            Indicator::BollingerLower { .. } => "bollinger_lower",
            Indicator::Rsi { .. } => "rsi",
            Indicator::StochasticOscillator { .. } => "stochastic_oscillator",
            Indicator::Atr { .. } => "atr",
            Indicator::Obv => "obv",
            Indicator::Vwap => "vwap",
            Indicator::TenkanSen { .. } => "tenkan_sen",
            Indicator::KijunSen { .. } => "kijun_sen",
            Indicator::SenkouSpanA { .. } => "senkou_span_a",
            Indicator::SenkouSpanB { .. } => "senkou_span_b",
            Indicator::ChikouSpan { .. } => "chikou_span",
        }
    }

    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Parses `kind` or `kind-a_b_c`. A bare kind takes the conventional defaults.
    pub fn parse(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        let (kind, args) = match trimmed.split_once('-') {
            Some((kind, args)) => (kind, args.split('_').collect::<Vec<_>>()),
            None => (trimmed, Vec::new()),
        };
        let args = Args { name, args };

        let indicator = match kind {
            "sma" => Indicator::Sma {
                period: args.usize_at(0, 20)?,
            },
            "ema" => Indicator::Ema {
                period: args.usize_at(0, 20)?,
            },
            "macd" => Indicator::Macd {
                fast: args.usize_at(0, 12)?,
                slow: args.usize_at(1, 26)?,
            },
            "macd_hist" => Indicator::MacdHist {
                fast: args.usize_at(0, 12)?,
                slow: args.usize_at(1, 26)?,
                signal: args.usize_at(2, 9)?,
            },
            "bollinger_upper" => Indicator::BollingerUpper {
                period: args.usize_at(0, 20)?,
                k: args.f64_at(1, 2.0)?,
            },
            "bollinger_lower" => Indicator::BollingerLower {
                period: args.usize_at(0, 20)?,
                k: args.f64_at(1, 2.0)?,
            },
            "rsi" => Indicator::Rsi {
                period: args.usize_at(0, 14)?,
            },
            "stochastic_oscillator" => Indicator::StochasticOscillator {
                period: args.usize_at(0, 14)?,
            },
            "atr" => Indicator::Atr {
                period: args.usize_at(0, 14)?,
            },
            "obv" => Indicator::Obv,
            "vwap" => Indicator::Vwap,
            "tenkan_sen" => Indicator::TenkanSen {
                period: args.usize_at(0, 9)?,
            },
            "kijun_sen" => Indicator::KijunSen {
                period: args.usize_at(0, 26)?,
            },
            "senkou_span_a" => Indicator::SenkouSpanA {
                conversion: args.usize_at(0, 9)?,
                base: args.usize_at(1, 26)?,
            },
            "senkou_span_b" => Indicator::SenkouSpanB {
                period: args.usize_at(0, 52)?,
                shift: args.usize_at(1, 26)?,
            },
            "chikou_span" => Indicator::ChikouSpan {
                shift: args.usize_at(0, 26)?,
            },
            _ => {
                return Err(SimError::InvalidConfig(format!(
                    "unknown indicator: {name}"
                )))
            }
        };
        indicator.validate()?;
        Ok(indicator)
    }

    fn validate(&self) -> Result<()> {
        let periods = match *self {
            Indicator::Sma { period }
            | Indicator::Ema { period }
            | Indicator::Rsi { period }
            | Indicator::StochasticOscillator { period }
            | Indicator::Atr { period }
            | Indicator::TenkanSen { period }
            | Indicator::KijunSen { period }
            | Indicator::SenkouSpanB { period, .. } => vec![period],
            Indicator::BollingerUpper { period, .. } | Indicator::BollingerLower { period, .. } => {
                if period < 2 {
                    return Err(SimError::InvalidConfig(format!(
                        "{self}: bollinger period must be at least 2"
                    )));
                }
                vec![period]
            }
            Indicator::Macd { fast, slow } => vec![fast, slow],
            Indicator::MacdHist { fast, slow, signal } => vec![fast, slow, signal],
            Indicator::SenkouSpanA { conversion, base } => vec![conversion, base],
            Indicator::Obv | Indicator::Vwap | Indicator::ChikouSpan { .. } => Vec::new(),
        };
        if periods.contains(&0) {
            return Err(SimError::InvalidConfig(format!(
                "{self}: periods must be positive"
            )));
        }
        let offset = match *self {
            Indicator::SenkouSpanA { base, .. } => Some(base),
            Indicator::SenkouSpanB { shift, .. } | Indicator::ChikouSpan { shift } => Some(shift),
            _ => None,
        };
        if offset.is_some_and(|offset| isize::try_from(offset).is_err()) {
            return Err(SimError::InvalidConfig(format!("{self}: shift is out of range")));
        }
        Ok(())
    }

    pub fn compute(&self, ticks: &[Tick]) -> Vec<Option<f64>> {
        let closes: Vec<f64> = ticks.iter().map(|tick| tick.close).collect();
        match *self {
            Indicator::Sma { period } => sma(&closes, period),
            Indicator::Ema { period } => ema(&closes, period).into_iter().map(Some).collect(),
            Indicator::Macd { fast, slow } => macd(&closes, fast, slow).into_iter().map(Some).collect(),
            Indicator::MacdHist { fast, slow, signal } => {
                let line = macd(&closes, fast, slow);
                let signal_line = ema(&line, signal);
                line.iter()
                    .zip(signal_line)
                    .map(|(m, s)| Some(m - s))
                    .collect()
            }
            Indicator::BollingerUpper { period, k } => bollinger(&closes, period, k),
            Indicator::BollingerLower { period, k } => bollinger(&closes, period, -k),
            Indicator::Rsi { period } => {
                let mut rsi = RollingRsi::new(period);
                closes.iter().map(|&c| rsi.update(c)).collect()
            }
            Indicator::StochasticOscillator { period } => stochastic(ticks, period),
            Indicator::Atr { period } => atr(ticks, period),
            Indicator::Obv => obv(ticks),
            Indicator::Vwap => vwap(ticks),
            Indicator::TenkanSen { period } | Indicator::KijunSen { period } => {
                midpoint(ticks, period)
            }
            Indicator::SenkouSpanA { conversion, base } => {
                let tenkan = midpoint(ticks, conversion);
                let kijun = midpoint(ticks, base);
                let span: Vec<Option<f64>> = tenkan
                    .iter()
                    .zip(&kijun)
                    .map(|(t, k)| Some((t.as_ref()? + k.as_ref()?) / 2.0))
                    .collect();
                shift(&span, to_offset(base))
            }
            Indicator::SenkouSpanB { period, shift: lag } => {
                shift(&midpoint(ticks, period), to_offset(lag))
            }
            Indicator::ChikouSpan { shift: lead } => {
                let closes: Vec<Option<f64>> = closes.into_iter().map(Some).collect();
                shift(&closes, -to_offset(lead))
            }
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind();
        match *self {
            Indicator::Sma { period }
            | Indicator::Ema { period }
            | Indicator::Rsi { period }
            | Indicator::StochasticOscillator { period }
            | Indicator::Atr { period }
            | Indicator::TenkanSen { period }
            | Indicator::KijunSen { period } => write!(f, "{kind}-{period}"),
            Indicator::Macd { fast, slow } => write!(f, "{kind}-{fast}_{slow}"),
            Indicator::MacdHist { fast, slow, signal } => {
                write!(f, "{kind}-{fast}_{slow}_{signal}")
            }
            Indicator::BollingerUpper { period, k } | Indicator::BollingerLower { period, k } => {
                write!(f, "{kind}-{period}_{k}")
            }
            Indicator::Obv | Indicator::Vwap => f.write_str(kind),
            Indicator::SenkouSpanA { conversion, base } => write!(f, "{kind}-{conversion}_{base}"),
            Indicator::SenkouSpanB { period, shift } => write!(f, "{kind}-{period}_{shift}"),
            Indicator::ChikouSpan { shift } => write!(f, "{kind}-{shift}"),
        }
    }
}

impl FromStr for Indicator {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        Indicator::parse(s)
    }
}

pub fn parse_indicator(name: &str) -> Result<Indicator> {
    Indicator::parse(name)
}

/// Computes each indicator over `ticks`, keyed by indicator name.
pub fn compute_all(ticks: &[Tick], indicators: &[Indicator]) -> Vec<(String, Vec<Option<f64>>)> {
    indicators
        .iter()
        .map(|indicator| (indicator.name(), indicator.compute(ticks)))
        .collect()
}

/// Moves values `k` positions later in time (`k > 0`) or earlier (`k < 0`), padding
/// with `None`.
pub fn shift(values: &[Option<f64>], k: isize) -> Vec<Option<f64>> {
    let len = values.len() as isize;
    (0..len)
        .map(|i| match i.checked_sub(k) {
            Some(src) if (0..len).contains(&src) => values[src as usize],
            _ => None,
        })
        .collect()
}

fn to_offset(value: usize) -> isize {
    isize::try_from(value).unwrap_or(isize::MAX)
}

struct Args<'a> {
    name: &'a str,
    args: Vec<&'a str>,
}

impl Args<'_> {
    fn usize_at(&self, idx: usize, default: usize) -> Result<usize> {
        match self.args.get(idx) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| self.invalid(raw)),
        }
    }

    fn f64_at(&self, idx: usize, default: f64) -> Result<f64> {
        match self.args.get(idx) {
            None => Ok(default),
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| self.invalid(raw)),
        }
    }

    fn invalid(&self, raw: &str) -> SimError {
        SimError::InvalidConfig(format!("indicator {}: invalid argument {raw:?}", self.name))
    }
}

fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut sma = RollingSma::new(period);
    values.iter().map(|&v| sma.update(v)).collect()
}

fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let mut ewm = Ewm::with_span(span);
    values.iter().map(|&v| ewm.update(v)).collect()
}

fn macd(closes: &[f64], fast: usize, slow: usize) -> Vec<f64> {
    ema(closes, fast)
        .into_iter()
        .zip(ema(closes, slow))
        .map(|(f, s)| f - s)
        .collect()
}

fn bollinger(closes: &[f64], period: usize, k: f64) -> Vec<Option<f64>> {
    let mut mean = RollingSma::new(period);
    let mut std = RollingStd::new(period);
    closes
        .iter()
        .map(|&c| {
            let m = mean.update(c);
            let s = std.update(c);
            Some(m? + k * s?)
        })
        .collect()
}

fn stochastic(ticks: &[Tick], period: usize) -> Vec<Option<f64>> {
    let mut highs = RollingExtreme::max(period);
    let mut lows = RollingExtreme::min(period);
    ticks
        .iter()
        .map(|tick| {
            let high = highs.update(tick.high);
            let low = lows.update(tick.low);
            let (high, low) = (high?, low?);
            let range = high - low;
            if range == 0.0 {
                return None;
            }
            Some(100.0 * (tick.close - low) / range)
        })
        .collect()
}

fn atr(ticks: &[Tick], period: usize) -> Vec<Option<f64>> {
    let mut mean = RollingSma::new(period);
    let mut prev_close: Option<f64> = None;
    ticks
        .iter()
        .map(|tick| {
            let mut range = tick.high - tick.low;
            if let Some(prev) = prev_close {
                range = range
                    .max((tick.high - prev).abs())
                    .max((tick.low - prev).abs());
            }
            prev_close = Some(tick.close);
            mean.update(range)
        })
        .collect()
}

fn obv(ticks: &[Tick]) -> Vec<Option<f64>> {
    let mut total = 0.0;
    let mut prev_close: Option<f64> = None;
    ticks
        .iter()
        .map(|tick| {
            if let Some(prev) = prev_close {
                if tick.close > prev {
                    total += tick.volume;
                } else if tick.close < prev {
                    total -= tick.volume;
                }
            }
            prev_close = Some(tick.close);
            Some(total)
        })
        .collect()
}

fn vwap(ticks: &[Tick]) -> Vec<Option<f64>> {
    let mut value = 0.0;
    let mut volume = 0.0;
    ticks
        .iter()
        .map(|tick| {
            value += tick.close * tick.volume;
            volume += tick.volume;
            (volume != 0.0).then(|| value / volume)
        })
        .collect()
}

fn midpoint(ticks: &[Tick], period: usize) -> Vec<Option<f64>> {
    let mut highs = RollingExtreme::max(period);
    let mut lows = RollingExtreme::min(period);
    ticks
        .iter()
        .map(|tick| {
            let high = highs.update(tick.high);
            let low = lows.update(tick.low);
            Some((high? + low?) / 2.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ticks(closes: &[f64]) -> Vec<Tick> {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Tick {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 10.0,
            })
            .collect()
    }

    #[test]
    fn names_round_trip() {
        for name in [
            "sma-50",
            "ema-12",
            "macd-12_26",
            "macd_hist-12_26_9",
            "bollinger_upper-20_2",
            "bollinger_lower-20_2.5",
            "rsi-14",
            "stochastic_oscillator-14",
            "atr-14",
            "obv",
            "vwap",
            "tenkan_sen-9",
            "kijun_sen-26",
            "senkou_span_a-9_26",
            "senkou_span_b-52_26",
            "chikou_span-26",
        ] {
            let indicator = parse_indicator(name).unwrap();
            assert_eq!(indicator.name(), name);
        }
    }

    #[test]
    fn bare_kind_uses_defaults() {
        assert_eq!(
            Indicator::parse("macd_hist").unwrap(),
            Indicator::MacdHist {
                fast: 12,
                slow: 26,
                signal: 9
            }
        );
        assert_eq!(Indicator::parse("rsi").unwrap().name(), "rsi-14");
    }

    #[test]
    fn rejects_unknown_or_bad_arguments() {
        assert!(Indicator::parse("wma-10").is_err());
        assert!(Indicator::parse("sma-ten").is_err());
        assert!(Indicator::parse("sma-0").is_err());
        assert!(Indicator::parse("bollinger_upper-1_2").is_err());
        assert!(Indicator::parse("chikou_span-18446744073709551615").is_err());
        assert!(Indicator::parse("senkou_span_b-52_18446744073709551615").is_err());
    }

    #[test]
    fn sma_honors_period() {
        let values = Indicator::Sma { period: 2 }.compute(&ticks(&[1.0, 3.0, 5.0]));
        assert_eq!(values, vec![None, Some(2.0), Some(4.0)]);
    }

    #[test]
    fn ema_honors_span() {
        let values = Indicator::Ema { period: 3 }.compute(&ticks(&[10.0, 20.0]));
        assert_eq!(values, vec![Some(10.0), Some(15.0)]);
    }

    #[test]
    fn bollinger_bands_straddle_mean() {
        let data = ticks(&[1.0, 2.0, 3.0, 4.0]);
        let upper = Indicator::BollingerUpper { period: 3, k: 2.0 }.compute(&data);
        let lower = Indicator::BollingerLower { period: 3, k: 2.0 }.compute(&data);
        // Window [2, 3, 4]: mean 3, sample std 1.
        assert_eq!(upper[3], Some(5.0));
        assert_eq!(lower[3], Some(1.0));
        assert_eq!(upper[1], None);
    }

    #[test]
    fn obv_and_vwap_accumulate() {
        let data = ticks(&[1.0, 2.0, 2.0, 1.0]);
        assert_eq!(
            Indicator::Obv.compute(&data),
            vec![Some(0.0), Some(10.0), Some(10.0), Some(0.0)]
        );
        let vwap = Indicator::Vwap.compute(&data);
        assert_eq!(vwap[1], Some(1.5));
    }

    #[test]
    fn atr_uses_true_range() {
        let mut data = ticks(&[10.0, 10.0]);
        data[1].high = 15.0;
        let atr = Indicator::Atr { period: 2 }.compute(&data);
        // Ranges 2 then max(6, 5, 1) = 6.
        assert_eq!(atr, vec![None, Some(4.0)]);
    }

    #[test]
    fn ichimoku_spans_shift_in_time() {
        let data = ticks(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let chikou = Indicator::ChikouSpan { shift: 2 }.compute(&data);
        assert_eq!(chikou, vec![Some(3.0), Some(4.0), Some(5.0), None, None]);

        let span_b = Indicator::SenkouSpanB { period: 2, shift: 1 }.compute(&data);
        // The first two-tick midpoint, (3 + 0) / 2, becomes visible one tick later.
        assert_eq!(span_b, vec![None, None, Some(1.5), Some(2.5), Some(3.5)]);
    }

    #[test]
    fn shift_pads_with_none() {
        let values = vec![Some(1.0), Some(2.0), Some(3.0)];
        assert_eq!(shift(&values, 1), vec![None, Some(1.0), Some(2.0)]);
        assert_eq!(shift(&values, -1), vec![Some(2.0), Some(3.0), None]);
        assert_eq!(shift(&values, isize::MIN), vec![None, None, None]);
        assert_eq!(shift(&values, isize::MAX), vec![None, None, None]);
        assert_eq!(shift(&values, 5), vec![None, None, None]);
        assert_eq!(shift(&values, 0), values);
    }
}
