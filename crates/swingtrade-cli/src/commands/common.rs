use crate::config::Config;
use std::path::{Path, PathBuf};
use std::time::Instant;
use swingtrade_core::data::TimeSeriesStore;
use swingtrade_core::engine_name;
use swingtrade_core::types::Frequency;

pub(super) fn print_config_summary(command: &str, config: &Config, out: Option<&PathBuf>) {
    println!(
        "{} cli: {} (run_id={}, ticker={}, frequency={}, principal={})",
        engine_name(),
        command,
        config.run.run_id,
        config.run.ticker,
        config.run.frequency,
        config.run.principal
    );
    println!(
        "run: start_date={}, end_date={}, max_steps={}",
        config.run.start_date,
        config
            .run
            .end_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "end_of_data".to_string()),
        config
            .run
            .max_steps
            .map(|steps| steps.to_string())
            .unwrap_or_else(|| "unbounded".to_string())
    );
    println!(
        "data: data_root={}, out_dir={}",
        config.paths.data_root,
        out.map(|path| path.display().to_string())
            .unwrap_or_else(|| config.paths.out_dir.clone())
    );
    println!(
        "strategy: kind={}, shares={}, every={}, short_window={}, long_window={}",
        serde_json::to_value(config.strategy.kind)
            .ok()
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default(),
        config.strategy.shares,
        config.strategy.every,
        config.strategy.short_window,
        config.strategy.long_window
    );
    if let Some(report) = &config.report {
        println!("report: indicators={:?}", report.indicators);
    }
}

/// Loads every frequency in `frequencies` and applies `run.end_date` when set.
pub(super) fn load_store(
    config: &Config,
    frequencies: &[Frequency],
    metric: &'static str,
) -> Result<TimeSeriesStore, String> {
    let stage_start = Instant::now();
    let mut store = TimeSeriesStore::load(
        Path::new(&config.paths.data_root),
        &config.run.ticker,
        frequencies,
    )
    .map_err(|err| err.to_string())?;
    metrics::histogram!(metric).record(stage_start.elapsed().as_millis() as f64);

    if let Some(end) = config.run.end_date {
        let (first, _) = store.date_bounds(None).map_err(|err| err.to_string())?;
        store = store
            .with_date_bounds(first, end, None)
            .map_err(|err| err.to_string())?;
    }
    Ok(store)
}
