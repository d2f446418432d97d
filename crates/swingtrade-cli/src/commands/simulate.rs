use crate::config::{load_config_with_source, Config};
use std::path::{Path, PathBuf};
use std::time::Instant;
use swingtrade_core::engine::{RunReport, Simulator};
use swingtrade_core::engine_name;
use swingtrade_core::features;
use swingtrade_core::metrics::{MetricsConfig, MetricsState, PerformanceSummary};
use swingtrade_core::pnl::RevenuePoint;
use swingtrade_core::report::{self, SummaryMeta};
use swingtrade_core::strategy::build_strategy;
use tracing::{info, info_span};

pub(super) fn run_simulate(config_path: PathBuf, out: Option<PathBuf>) -> Result<(), String> {
    let (config, config_toml) = load_config_with_source(&config_path)?;
    super::common::print_config_summary("simulate", &config, out.as_ref());

    let overall_start = Instant::now();
    let _span = info_span!(
        "simulate",
        run_id = %config.run.run_id,
        ticker = %config.run.ticker,
        frequency = %config.run.frequency
    )
    .entered();

    let store = super::common::load_store(
        &config,
        &[config.run.frequency],
        "swingtrade.simulate.load_ms",
    )?;

    let mut sim =
        Simulator::new(&store, config.simulation_config()).map_err(|err| err.to_string())?;
    let mut strategy = build_strategy(config.strategy.kind, config.strategy_params());

    let stage_start = Instant::now();
    let run = sim
        .run(strategy.as_mut(), config.run.max_steps)
        .map_err(|err| err.to_string())?;
    let engine_ms = stage_start.elapsed().as_millis() as f64;
    metrics::histogram!("swingtrade.simulate.engine_ms").record(engine_ms);
    metrics::gauge!("swingtrade.simulate.ticks").set(run.steps as f64);
    metrics::gauge!("swingtrade.simulate.fills").set(sim.ledger().fill_count() as f64);

    let (summary, revenue) = summarize(&config, &sim, &run)?;
    metrics::gauge!("swingtrade.simulate.final_net_worth").set(summary.final_net_worth);

    let run_dir = write_artifacts(&config, &config_toml, out, &sim, &run, &summary, &revenue)?;

    println!(
        "result: strategy={}, ticks={}, fills={}, rejected={}, final_net_worth={:.2}, total_return={:.4}, max_drawdown={:.4}, sharpe={:.4}, realized_revenue={:.4}, buy_and_hold={}",
        run.strategy,
        summary.ticks,
        summary.fills,
        summary.rejected_orders,
        summary.final_net_worth,
        summary.total_return,
        summary.max_drawdown,
        summary.sharpe,
        summary.realized_revenue,
        summary
            .buy_and_hold
            .map(|ratio| format!("{ratio:.4}"))
            .unwrap_or_else(|| "n/a".to_string())
    );
    println!("run output: {}", run_dir.display());
    println!(
        "{} cli: simulate total_ms={}",
        engine_name(),
        overall_start.elapsed().as_millis()
    );
    Ok(())
}

fn summarize(
    config: &Config,
    sim: &Simulator<'_>,
    run: &RunReport,
) -> Result<(PerformanceSummary, Vec<RevenuePoint>), String> {
    let report_config = config.report.clone().unwrap_or_default();
    let revenue_start = report_config.revenue_start.unwrap_or(run.start_date);
    let revenue_end = report_config.revenue_end.unwrap_or(run.end_date);
    let revenue = sim
        .realized_revenue(revenue_start, revenue_end)
        .map_err(|err| err.to_string())?;
    let realized = revenue
        .last()
        .map(|point| point.realized_revenue)
        .unwrap_or(0.0);

    let buy_and_hold = sim
        .store()
        .buy_and_hold(config.run.frequency, run.start_date, run.end_date)
        .ok();

    let mut state = MetricsState::new(
        config.run.principal,
        MetricsConfig::for_frequency(config.run.frequency),
    );
    for snapshot in sim.history() {
        state.record_snapshot(snapshot);
    }
    for fill in sim.ledger().fills() {
        state.record_fill(fill);
    }
    state.record_orders(sim.ledger().orders().len(), sim.ledger().rejected_count());
    info!(
        realized_revenue = realized,
        revenue_start = %revenue_start,
        revenue_end = %revenue_end,
        "realized revenue replayed"
    );
    Ok((state.summary(realized, buy_and_hold), revenue))
}

fn write_artifacts(
    config: &Config,
    config_toml: &str,
    out: Option<PathBuf>,
    sim: &Simulator<'_>,
    run: &RunReport,
    summary: &PerformanceSummary,
    revenue: &[RevenuePoint],
) -> Result<PathBuf, String> {
    let base_dir = out.unwrap_or_else(|| PathBuf::from(&config.paths.out_dir));
    let run_dir = base_dir.join(&config.run.run_id);
    std::fs::create_dir_all(&run_dir)
        .map_err(|err| format!("failed to create {}: {}", run_dir.display(), err))?;
    let path = |name: &str| run_dir.join(name);
    let stage_start = Instant::now();

    report::write_equity_csv(&path("equity.csv"), sim.history()).map_err(|e| e.to_string())?;
    report::write_fills_csv(&path("fills.csv"), sim.ledger().fills()).map_err(|e| e.to_string())?;
    report::write_orders_csv(&path("orders.csv"), sim.ledger().orders())
        .map_err(|e| e.to_string())?;

    report::write_revenue_csv(&path("revenue.csv"), revenue).map_err(|e| e.to_string())?;

    let indicators = config.indicators()?;
    if !indicators.is_empty() {
        write_indicators(&path("indicators.csv"), sim, run, &indicators)?;
    }

    let meta = SummaryMeta {
        run_id: config.run.run_id.clone(),
        ticker: config.run.ticker.clone(),
        frequency: config.run.frequency.to_string(),
        strategy: run.strategy.clone(),
        start: run.start_date,
        end: run.end_date,
    };
    let config_snapshot = serde_json::to_value(config).map_err(|e| e.to_string())?;
    report::write_summary_json(&path("summary.json"), summary, Some(&meta), Some(&config_snapshot))
        .map_err(|e| e.to_string())?;

    let events = report::audit_events(&config.run.run_id, sim.ledger(), summary);
    report::write_audit_jsonl(&path("audit.jsonl"), &events).map_err(|e| e.to_string())?;

    std::fs::write(path("config_snapshot.toml"), config_toml)
        .map_err(|err| format!("failed to write config snapshot: {}", err))?;

    metrics::histogram!("swingtrade.simulate.write_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    Ok(run_dir)
}

/// Indicators see the full history up to the run end so warm-up windows are filled.
fn write_indicators(
    path: &Path,
    sim: &Simulator<'_>,
    run: &RunReport,
    indicators: &[features::Indicator],
) -> Result<(), String> {
    let series = sim
        .store()
        .series(sim.config().frequency)
        .map_err(|e| e.to_string())?;
    let ticks = series.upto(run.end_date);
    let columns = features::compute_all(ticks, indicators);
    report::write_indicators_csv(path, ticks, &columns).map_err(|e| e.to_string())
}
