use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use swingtrade_core::engine::SimulationConfig;
use swingtrade_core::features::Indicator;
use swingtrade_core::strategy::{StrategyKind, StrategyParams};
use swingtrade_core::types::Frequency;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub run: RunConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    pub report: Option<ReportConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub ticker: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    /// Drops ticks after this date before the run starts.
    pub end_date: Option<NaiveDate>,
    pub principal: f64,
    pub max_steps: Option<usize>,
    /// Extra frequencies to load for `validate` and `bounds`.
    #[serde(default)]
    pub also_load: Vec<Frequency>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    pub data_root: String,
    pub out_dir: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    #[serde(default = "default_shares")]
    pub shares: f64,
    #[serde(default = "default_every")]
    pub every: usize,
    #[serde(default = "default_short_window")]
    pub short_window: usize,
    #[serde(default = "default_long_window")]
    pub long_window: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kind: StrategyKind::Hold,
            shares: default_shares(),
            every: default_every(),
            short_window: default_short_window(),
            long_window: default_long_window(),
        }
    }
}

fn default_shares() -> f64 {
    1.0
}

fn default_every() -> usize {
    10
}

fn default_short_window() -> usize {
    10
}

fn default_long_window() -> usize {
    30
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub indicators: Vec<String>,
    pub revenue_start: Option<NaiveDate>,
    pub revenue_end: Option<NaiveDate>,
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        if self.run.run_id.trim().is_empty() {
            return Err("run.run_id must not be empty".to_string());
        }
        if self.run.ticker.trim().is_empty() {
            return Err("run.ticker must not be empty".to_string());
        }
        if !self.run.principal.is_finite() || self.run.principal <= 0.0 {
            return Err(format!(
                "run.principal must be positive, got {}",
                self.run.principal
            ));
        }
        if let Some(end) = self.run.end_date {
            if end < self.run.start_date {
                return Err(format!(
                    "run.end_date {end} is before run.start_date {}",
                    self.run.start_date
                ));
            }
        }
        if !self.strategy.shares.is_finite() || self.strategy.shares <= 0.0 {
            return Err(format!(
                "strategy.shares must be positive, got {}",
                self.strategy.shares
            ));
        }
        if let Some(report) = &self.report {
            if let (Some(start), Some(end)) = (report.revenue_start, report.revenue_end) {
                if start > end {
                    return Err(format!(
                        "report.revenue_start {start} is after report.revenue_end {end}"
                    ));
                }
            }
        }
        self.indicators()?;
        Ok(())
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            ticker: self.run.ticker.clone(),
            frequency: self.run.frequency,
            start_date: self.run.start_date,
            principal: self.run.principal,
        }
    }

    pub fn strategy_params(&self) -> StrategyParams {
        StrategyParams {
            shares: self.strategy.shares,
            every: self.strategy.every,
            short_window: self.strategy.short_window,
            long_window: self.strategy.long_window,
        }
    }

    /// The run frequency first, then any extra ones, without repeats.
    pub fn frequencies(&self) -> Vec<Frequency> {
        let mut frequencies = vec![self.run.frequency];
        for &freq in &self.run.also_load {
            if !frequencies.contains(&freq) {
                frequencies.push(freq);
            }
        }
        frequencies
    }

    pub fn indicators(&self) -> Result<Vec<Indicator>, String> {
        self.report
            .as_ref()
            .map(|report| report.indicators.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|name| Indicator::parse(name).map_err(|err| err.to_string()))
            .collect()
    }
}

pub fn load_config_with_source(path: &Path) -> Result<(Config, String), String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))?;
    config
        .validate()
        .map_err(|err| format!("invalid config {}: {}", path.display(), err))?;
    Ok((config, contents))
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    load_config_with_source(path).map(|(config, _)| config)
}

#[cfg(test)]
mod tests {
    use super::{load_config, Config};
    use std::path::Path;
    use swingtrade_core::strategy::StrategyKind;
    use swingtrade_core::types::Frequency;

    fn parse_config(toml_str: &str) -> Config {
        toml::from_str(toml_str).expect("config should parse")
    }

    const FULL: &str = r#"
[run]
run_id = "aapl_2020"
ticker = "AAPL"
frequency = "daily"
start_date = "2020-03-20"
principal = 10000.0
max_steps = 100
also_load = ["weekly", "daily"]

[paths]
data_root = "data"
out_dir = "runs/"

[strategy]
kind = "periodic"
shares = 2.0
every = 5

[report]
indicators = ["sma-50", "macd_hist-12_26_9"]
revenue_start = "2020-04-01"
"#;

    #[test]
    fn parse_full_config() {
        let config = parse_config(FULL);
        assert_eq!(config.run.ticker, "AAPL");
        assert_eq!(config.run.frequency, Frequency::Daily);
        assert_eq!(config.run.max_steps, Some(100));
        assert_eq!(config.strategy.kind, StrategyKind::Periodic);
        assert_eq!(config.strategy.long_window, 30);
        assert_eq!(config.frequencies(), vec![Frequency::Daily, Frequency::Weekly]);
        assert_eq!(config.indicators().unwrap().len(), 2);
        assert!(config.validate().is_ok());
        assert_eq!(config.simulation_config().principal, 10_000.0);
    }

    #[test]
    fn strategy_section_defaults_to_hold() {
        let config = parse_config(
            r#"
[run]
run_id = "r"
ticker = "MSFT"
frequency = "weekly"
start_date = "2019-01-07"
principal = 500.0

[paths]
data_root = "data"
out_dir = "runs"
"#,
        );
        assert_eq!(config.strategy.kind, StrategyKind::Hold);
        assert!(config.report.is_none());
        assert!(config.indicators().unwrap().is_empty());
        assert_eq!(config.strategy_params().every, 10);
    }

    #[test]
    fn unknown_frequency_is_rejected() {
        let toml_str = FULL.replace("frequency = \"daily\"", "frequency = \"hourly\"");
        assert!(toml::from_str::<Config>(&toml_str).is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = parse_config(FULL);
        config.run.principal = 0.0;
        assert!(config.validate().unwrap_err().contains("principal"));

        let mut config = parse_config(FULL);
        config.report.as_mut().unwrap().indicators.push("nope-3".to_string());
        assert!(config.validate().unwrap_err().contains("unknown indicator"));

        let mut config = parse_config(FULL);
        config.run.end_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_missing_file_returns_error() {
        let path = std::env::temp_dir().join("swingtrade-missing-config.toml");
        let err = load_config(Path::new(&path)).expect_err("expected load to fail");
        assert!(err.contains("failed to read config"));
    }
}
