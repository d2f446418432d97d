use std::path::PathBuf;
use swingtrade_core::engine_name;
use swingtrade_core::metrics::MetricsConfig;
use swingtrade_core::report;
use swingtrade_core::types::Frequency;
use tracing::info;

/// Recomputes `summary.json` for an existing run directory from its equity and fill files.
pub(super) fn run_report(input: PathBuf) -> Result<(), String> {
    let summary_path = input.join("summary.json");
    let raw = std::fs::read_to_string(&summary_path)
        .map_err(|err| format!("failed to read {}: {}", summary_path.display(), err))?;
    let mut document: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|err| format!("failed to parse {}: {}", summary_path.display(), err))?;

    let frequency = document["meta"]["frequency"]
        .as_str()
        .map(Frequency::parse)
        .transpose()
        .map_err(|err| err.to_string())?;
    let metrics_config = frequency
        .map(MetricsConfig::for_frequency)
        .unwrap_or_default();
    let previous = &document["summary"];
    let realized_revenue = previous["realized_revenue"].as_f64().unwrap_or(0.0);
    let buy_and_hold = previous["buy_and_hold"].as_f64();
    let orders = previous["orders"].as_u64().unwrap_or(0) as usize;
    let rejected = previous["rejected_orders"].as_u64().unwrap_or(0) as usize;

    let equity = report::read_equity_csv(&input.join("equity.csv")).map_err(|e| e.to_string())?;
    let fills = report::read_fills_csv(&input.join("fills.csv")).map_err(|e| e.to_string())?;

    let mut summary = report::recompute_summary(&equity, &fills, realized_revenue, metrics_config);
    summary.orders = orders.max(summary.fills + rejected);
    summary.rejected_orders = rejected;
    summary.buy_and_hold = buy_and_hold;

    document["summary"] = serde_json::to_value(&summary).map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(&document).map_err(|e| e.to_string())?;
    std::fs::write(&summary_path, json)
        .map_err(|err| format!("failed to write {}: {}", summary_path.display(), err))?;
    info!(path = %summary_path.display(), "summary regenerated");

    let run_id = document["meta"]["run_id"].as_str().unwrap_or("unknown");
    println!(
        "{} cli: report regenerated (run_id={}, ticks={}, fills={}, final_net_worth={:.2}, max_drawdown={:.4})",
        engine_name(),
        run_id,
        summary.ticks,
        summary.fills,
        summary.final_net_worth,
        summary.max_drawdown
    );
    Ok(())
}
