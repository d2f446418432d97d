use crate::config::load_config;
use std::path::PathBuf;
use swingtrade_core::engine_name;

/// Prints the date range of every loaded frequency and their common window.
pub(super) fn run_bounds(config_path: PathBuf) -> Result<(), String> {
    let config = load_config(&config_path)?;
    let frequencies = config.frequencies();
    let store = super::common::load_store(&config, &frequencies, "swingtrade.bounds.load_ms")?;

    for frequency in &frequencies {
        let (first, last) = store
            .date_bounds(Some(*frequency))
            .map_err(|err| err.to_string())?;
        let ticks = store.series(*frequency).map_err(|e| e.to_string())?.len();
        println!("bounds[{frequency}]: {first}..={last} ({ticks} ticks)");
    }

    let (first, last) = store.date_bounds(None).map_err(|err| err.to_string())?;
    let start = config.run.start_date;
    println!(
        "{} cli: common range {}..={}, start_date {} {}",
        engine_name(),
        first,
        last,
        start,
        if start >= first && start <= last {
            "is inside"
        } else {
            "is outside"
        }
    );
    Ok(())
}
