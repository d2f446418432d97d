use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingSma {
    window: usize,
    buf: VecDeque<f64>,
    sum: f64,
}

impl RollingSma {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            buf: VecDeque::new(),
            sum: 0.0,
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        if self.window == 0 {
            return None;
        }

        self.buf.push_back(value);
        self.sum += value;
        while self.buf.len() > self.window {
            if let Some(front) = self.buf.pop_front() {
                self.sum -= front;
            }
        }

        if self.buf.len() == self.window {
            Some(self.sum / self.window as f64)
        } else {
            None
        }
    }
}

/// Sample standard deviation (n - 1 denominator) over a fixed window.
#[derive(Debug, Clone)]
pub struct RollingStd {
    window: usize,
    buf: VecDeque<f64>,
}

impl RollingStd {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            buf: VecDeque::new(),
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        if self.window < 2 {
            return None;
        }

        self.buf.push_back(value);
        while self.buf.len() > self.window {
            self.buf.pop_front();
        }
        if self.buf.len() < self.window {
            return None;
        }

        let n = self.window as f64;
        let mean = self.buf.iter().sum::<f64>() / n;
        let ss: f64 = self.buf.iter().map(|v| (v - mean) * (v - mean)).sum();
        Some((ss / (n - 1.0)).sqrt())
    }
}

/// Exponentially weighted mean seeded with the first value, `alpha = 2 / (span + 1)`.
#[derive(Debug, Clone)]
pub struct Ewm {
    alpha: f64,
    value: Option<f64>,
}

impl Ewm {
    pub fn with_span(span: usize) -> Self {
        Self {
            alpha: 2.0 / (span as f64 + 1.0),
            value: None,
        }
    }

    pub fn update(&mut self, value: f64) -> f64 {
        let next = match self.value {
            Some(prev) => self.alpha * value + (1.0 - self.alpha) * prev,
            None => value,
        };
        self.value = Some(next);
        next
    }
}

/// Simple-average RSI over raw price differences.
#[derive(Debug, Clone)]
pub struct RollingRsi {
    prev_close: Option<f64>,
    gains: RollingSma,
    losses: RollingSma,
}

impl RollingRsi {
    pub fn new(window: usize) -> Self {
        Self {
            prev_close: None,
            gains: RollingSma::new(window),
            losses: RollingSma::new(window),
        }
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        let Some(prev) = self.prev_close.replace(close) else {
            return None;
        };
        let diff = close - prev;
        let gain = self.gains.update(diff.max(0.0));
        let loss = self.losses.update((-diff).max(0.0));
        let (gain, loss) = (gain?, loss?);

        if gain + loss == 0.0 {
            return Some(50.0);
        }
        if loss == 0.0 {
            return Some(100.0);
        }
        let rs = gain / loss;
        Some(100.0 - (100.0 / (1.0 + rs)))
    }
}

/// Rolling maximum ([`RollingExtreme::max`]) or minimum ([`RollingExtreme::min`]) over a fixed window.
#[derive(Debug, Clone)]
pub struct RollingExtreme {
    window: usize,
    want_max: bool,
    buf: VecDeque<f64>,
}

impl RollingExtreme {
    pub fn max(window: usize) -> Self {
        Self {
            window,
            want_max: true,
            buf: VecDeque::new(),
        }
    }

    pub fn min(window: usize) -> Self {
        Self {
            window,
            want_max: false,
            buf: VecDeque::new(),
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        if self.window == 0 {
            return None;
        }
        self.buf.push_back(value);
        while self.buf.len() > self.window {
            self.buf.pop_front();
        }
        if self.buf.len() < self.window {
            return None;
        }
        let fold = if self.want_max { f64::max } else { f64::min };
        self.buf.iter().copied().reduce(fold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_waits_for_full_window() {
        let mut sma = RollingSma::new(3);
        assert_eq!(sma.update(1.0), None);
        assert_eq!(sma.update(2.0), None);
        assert_eq!(sma.update(3.0), Some(2.0));
        assert_eq!(sma.update(6.0), Some(11.0 / 3.0));
    }

    #[test]
    fn std_uses_sample_denominator() {
        let mut std = RollingStd::new(4);
        let values: Vec<_> = [2.0, 4.0, 4.0, 6.0].iter().map(|v| std.update(*v)).collect();
        let last = values[3].unwrap();
        // mean 4, squared deviations 8, divided by 3.
        assert!((last - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!(values[..3].iter().all(Option::is_none));
    }

    #[test]
    fn ewm_seeds_with_first_value() {
        let mut ewm = Ewm::with_span(3);
        assert_eq!(ewm.update(10.0), 10.0);
        assert_eq!(ewm.update(20.0), 15.0);
    }

    #[test]
    fn rsi_extremes() {
        let mut rsi = RollingRsi::new(2);
        assert_eq!(rsi.update(1.0), None);
        assert_eq!(rsi.update(2.0), None);
        assert_eq!(rsi.update(3.0), Some(100.0));

        let mut rsi = RollingRsi::new(2);
        rsi.update(5.0);
        rsi.update(5.0);
        assert_eq!(rsi.update(5.0), Some(50.0));
    }

    #[test]
    fn extremes_track_window() {
        let mut hi = RollingExtreme::max(2);
        let mut lo = RollingExtreme::min(2);
        let seq = [3.0, 1.0, 2.0];
        let highs: Vec<_> = seq.iter().map(|v| hi.update(*v)).collect();
        let lows: Vec<_> = seq.iter().map(|v| lo.update(*v)).collect();
        assert_eq!(highs, vec![None, Some(3.0), Some(2.0)]);
        assert_eq!(lows, vec![None, Some(1.0), Some(1.0)]);
    }
}
