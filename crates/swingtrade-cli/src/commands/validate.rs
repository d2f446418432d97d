use crate::config::load_config;
use std::path::PathBuf;
use swingtrade_core::engine_name;
use tracing::warn;

pub(super) fn run_validate(config_path: PathBuf, strict: bool) -> Result<(), String> {
    let config = load_config(&config_path)?;
    super::common::print_config_summary("validate", &config, None);

    let frequencies = config.frequencies();
    let store = super::common::load_store(&config, &frequencies, "swingtrade.validate.load_ms")?;

    let mut dropped_total = 0usize;
    let mut missing_total = 0usize;
    for frequency in &frequencies {
        let Some(report) = store.quality(*frequency) else {
            continue;
        };
        dropped_total += report.dropped();
        missing_total += report.missing_trading_days;
        println!(
            "data[{}]: rows_read={}, rows_kept={}, dropped_null={}, dropped_zero_price={}, dropped_bad_date={}, duplicates={}, out_of_order={}, missing_trading_days={}, first={}, last={}",
            frequency,
            report.rows_read,
            report.rows_kept,
            report.dropped_null,
            report.dropped_zero_price,
            report.dropped_bad_date,
            report.duplicates,
            report.out_of_order,
            report.missing_trading_days,
            fmt_date(report.first_date),
            fmt_date(report.last_date)
        );
        if let Some(date) = report.first_duplicate {
            println!("data[{frequency}]: first duplicate at {date}");
        }
        if let Some(date) = report.first_out_of_order {
            println!("data[{frequency}]: first out-of-order row at {date}");
        }
        if let Some(date) = report.first_gap {
            println!("data[{frequency}]: first missing trading day {date}");
        }
    }
    metrics::gauge!("swingtrade.validate.rows_dropped").set(dropped_total as f64);

    let (first, last) = store
        .date_bounds(Some(config.run.frequency))
        .map_err(|err| err.to_string())?;
    if config.run.start_date < first || config.run.start_date > last {
        return Err(format!(
            "run.start_date {} is outside the {} data range {}..={}",
            config.run.start_date, config.run.frequency, first, last
        ));
    }

    if dropped_total > 0 || missing_total > 0 {
        warn!(
            dropped = dropped_total,
            missing_trading_days = missing_total,
            "data quality issues found"
        );
        if strict {
            return Err(format!(
                "strict validation failed: {} rows dropped, {} missing trading days",
                dropped_total, missing_total
            ));
        }
    }

    println!("{} cli: validate ok", engine_name());
    Ok(())
}

fn fmt_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}
