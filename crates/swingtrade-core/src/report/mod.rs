use crate::engine::ledger::{EventLedger, OrderStatus};
use crate::engine::OrderRecord;
use crate::error::{Result, SimError};
use crate::metrics::{MetricsConfig, MetricsState, PerformanceSummary};
use crate::pnl::RevenuePoint;
use crate::types::{AccountSnapshot, Fill, Side, Tick};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub stage: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryMeta {
    pub run_id: String,
    pub ticker: String,
    pub frequency: String,
    pub strategy: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn write_equity_csv(path: &Path, snapshots: &[AccountSnapshot]) -> Result<()> {
    let mut output = String::from("date,cash,shares_held,cur_price,net_worth,performance\n");
    for snap in snapshots {
        output.push_str(&format!(
            "{},{},{},{},{},{}\n",
            snap.date,
            snap.cash,
            snap.shares_held,
            fmt_opt(snap.cur_price),
            snap.net_worth,
            snap.performance
        ));
    }
    write_file(path, &output)
}

pub fn write_fills_csv(path: &Path, fills: &[Fill]) -> Result<()> {
    let mut output = String::from("date,ticker,side,shares,price\n");
    for fill in fills {
        output.push_str(&format!(
            "{},{},{},{},{}\n",
            fill.date,
            fill.ticker,
            fill.side.as_str(),
            fill.shares,
            fill.price
        ));
    }
    write_file(path, &output)
}

pub fn write_orders_csv(path: &Path, orders: &[OrderRecord]) -> Result<()> {
    let mut output = String::from("date_entered,ticker,side,shares,status\n");
    for record in orders {
        let order = &record.order;
        output.push_str(&format!(
            "{},{},{},{},{}\n",
            order
                .date_entered
                .map(|date| date.to_string())
                .unwrap_or_default(),
            order.ticker,
            order.side.as_str(),
            order.shares,
            record.status.as_str()
        ));
    }
    write_file(path, &output)
}

pub fn write_revenue_csv(path: &Path, points: &[RevenuePoint]) -> Result<()> {
    let mut output = String::from("date,realized_revenue\n");
    for point in points {
        output.push_str(&format!("{},{}\n", point.date, point.realized_revenue));
    }
    write_file(path, &output)
}

/// One row per tick: the OHLCV columns followed by one column per indicator.
pub fn write_indicators_csv(
    path: &Path,
    ticks: &[Tick],
    columns: &[(String, Vec<Option<f64>>)],
) -> Result<()> {
    let mut output = String::from("date,open,high,low,close,volume");
    for (name, _) in columns {
        output.push(',');
        output.push_str(name);
    }
    output.push('\n');

    for (idx, tick) in ticks.iter().enumerate() {
        output.push_str(&format!(
            "{},{},{},{},{},{}",
            tick.date, tick.open, tick.high, tick.low, tick.close, tick.volume
        ));
        for (_, values) in columns {
            output.push(',');
            output.push_str(&fmt_opt(values.get(idx).copied().flatten()));
        }
        output.push('\n');
    }
    write_file(path, &output)
}

pub fn write_summary_json(
    path: &Path,
    summary: &PerformanceSummary,
    meta: Option<&SummaryMeta>,
    config_snapshot: Option<&serde_json::Value>,
) -> Result<()> {
    let json = serde_json::json!({
        "meta": meta,
        "config_snapshot": config_snapshot,
        "summary": summary,
    });
    let json = serde_json::to_string_pretty(&json)?;
    write_file(path, &json)
}

pub fn write_audit_jsonl(path: &Path, events: &[AuditEvent]) -> Result<()> {
    let io_err = |source| SimError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = fs::File::create(path).map_err(io_err)?;
    for event in events {
        let line = serde_json::to_string(event)?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .map_err(io_err)?;
    }
    Ok(())
}

/// Audit trail for a run: one event per entered order, one per fill, and a closing
/// summary event.
pub fn audit_events(
    run_id: &str,
    ledger: &EventLedger,
    summary: &PerformanceSummary,
) -> Vec<AuditEvent> {
    let mut events = Vec::with_capacity(ledger.orders().len() + ledger.fills().len() + 1);

    for record in ledger.orders() {
        let order = &record.order;
        let error = match record.status {
            OrderStatus::Filled => None,
            OrderStatus::RejectedFunds => Some("insufficient funds".to_string()),
            OrderStatus::RejectedShares => Some("insufficient shares".to_string()),
            OrderStatus::Unfilled => Some("end of data".to_string()),
        };
        events.push(AuditEvent {
            run_id: run_id.to_string(),
            date: order.date_entered,
            stage: "order".to_string(),
            action: record.status.as_str().to_string(),
            error,
            details: serde_json::json!({
                "ticker": order.ticker,
                "side": order.side,
                "shares": order.shares,
            }),
        });
    }

    for fill in ledger.fills() {
        events.push(AuditEvent {
            run_id: run_id.to_string(),
            date: Some(fill.date),
            stage: "fill".to_string(),
            action: fill.side.as_str().to_string(),
            error: None,
            details: serde_json::json!({
                "ticker": fill.ticker,
                "shares": fill.shares,
                "price": fill.price,
            }),
        });
    }

    events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| b.stage.cmp(&a.stage)));

    events.push(AuditEvent {
        run_id: run_id.to_string(),
        date: None,
        stage: "summary".to_string(),
        action: "complete".to_string(),
        error: None,
        details: serde_json::json!({
            "ticks": summary.ticks,
            "fills": summary.fills,
            "final_net_worth": summary.final_net_worth,
            "realized_revenue": summary.realized_revenue,
            "max_drawdown": summary.max_drawdown,
        }),
    });
    events
}

#[derive(Debug, Deserialize)]
struct EquityRecord {
    date: NaiveDate,
    cash: f64,
    shares_held: f64,
    cur_price: Option<f64>,
    net_worth: f64,
    performance: f64,
}

#[derive(Debug, Deserialize)]
struct FillRecord {
    date: NaiveDate,
    ticker: String,
    side: Side,
    shares: f64,
    price: f64,
}

fn csv_reader(path: &Path) -> Result<csv::Reader<fs::File>> {
    let file = fs::File::open(path).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::Reader::from_reader(file))
}

pub fn read_equity_csv(path: &Path) -> Result<Vec<AccountSnapshot>> {
    let mut reader = csv_reader(path)?;
    let mut snapshots = Vec::new();
    for result in reader.deserialize::<EquityRecord>() {
        let record = result.map_err(|source| SimError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        snapshots.push(AccountSnapshot {
            date: record.date,
            cash: record.cash,
            shares_held: record.shares_held,
            cur_price: record.cur_price,
            net_worth: record.net_worth,
            performance: record.performance,
        });
    }
    Ok(snapshots)
}

pub fn read_fills_csv(path: &Path) -> Result<Vec<Fill>> {
    let mut reader = csv_reader(path)?;
    let mut fills = Vec::new();
    for result in reader.deserialize::<FillRecord>() {
        let record = result.map_err(|source| SimError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        fills.push(Fill {
            date: record.date,
            side: record.side,
            ticker: record.ticker,
            shares: record.shares,
            price: record.price,
        });
    }
    Ok(fills)
}

/// Rebuilds a summary from written report files. The first equity row is the reset
/// snapshot, so its net worth is the principal.
pub fn recompute_summary(
    equity: &[AccountSnapshot],
    fills: &[Fill],
    realized_revenue: f64,
    config: MetricsConfig,
) -> PerformanceSummary {
    let principal = equity.first().map(|snap| snap.net_worth).unwrap_or(0.0);
    let mut state = MetricsState::new(principal, config);
    for snap in equity {
        state.record_snapshot(snap);
    }
    for fill in fills {
        state.record_fill(fill);
    }
    state.summary(realized_revenue, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Order;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 5, day).unwrap()
    }

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = crate::test_support::scratch_path(name);
        let _ = fs::create_dir_all(&dir);
        dir
    }

    fn snapshots() -> Vec<AccountSnapshot> {
        vec![
            AccountSnapshot {
                date: d(3),
                cash: 1000.0,
                shares_held: 0.0,
                cur_price: None,
                net_worth: 1000.0,
                performance: 1.0,
            },
            AccountSnapshot {
                date: d(4),
                cash: 900.0,
                shares_held: 1.0,
                cur_price: Some(110.0),
                net_worth: 1010.0,
                performance: 1.01,
            },
        ]
    }

    fn fills() -> Vec<Fill> {
        vec![Fill {
            date: d(4),
            side: Side::Buy,
            ticker: "AAPL".to_string(),
            shares: 1.0,
            price: 100.0,
        }]
    }

    #[test]
    fn equity_and_fills_read_back() {
        let dir = scratch_dir("swingtrade_report_roundtrip");
        let equity_path = dir.join("equity.csv");
        let fills_path = dir.join("fills.csv");
        write_equity_csv(&equity_path, &snapshots()).unwrap();
        write_fills_csv(&fills_path, &fills()).unwrap();

        let equity = read_equity_csv(&equity_path).unwrap();
        assert_eq!(equity, snapshots());
        let read_fills = read_fills_csv(&fills_path).unwrap();
        assert_eq!(read_fills, fills());

        let summary = recompute_summary(&equity, &read_fills, 0.0, MetricsConfig::default());
        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.fills, 1);
        assert!((summary.total_return - 0.01).abs() < 1e-12);
    }

    #[test]
    fn writes_report_files() {
        let dir = scratch_dir("swingtrade_report_files");
        let mut ledger = EventLedger::new();
        ledger.record_order(Order::buy("AAPL", 1.0).entered_on(d(3)), OrderStatus::Filled);
        ledger.record_order(
            Order::sell("AAPL", 9.0).entered_on(d(4)),
            OrderStatus::RejectedShares,
        );
        for fill in fills() {
            ledger.record_fill(fill);
        }
        let summary = PerformanceSummary::default();
        let meta = SummaryMeta {
            run_id: "unit".to_string(),
            ticker: "AAPL".to_string(),
            frequency: "daily".to_string(),
            strategy: "hold".to_string(),
            start: d(3),
            end: d(4),
        };

        write_orders_csv(&dir.join("orders.csv"), ledger.orders()).unwrap();
        write_summary_json(&dir.join("summary.json"), &summary, Some(&meta), None).unwrap();
        let events = audit_events("unit", &ledger, &summary);
        write_audit_jsonl(&dir.join("audit.jsonl"), &events).unwrap();

        let orders = fs::read_to_string(dir.join("orders.csv")).unwrap();
        assert!(orders.contains("2021-05-04,AAPL,sell,9,rejected_shares"));
        let summary_json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("summary.json")).unwrap()).unwrap();
        assert_eq!(summary_json["meta"]["run_id"], "unit");
        let audit = fs::read_to_string(dir.join("audit.jsonl")).unwrap();
        assert_eq!(audit.lines().count(), 4);
        assert_eq!(events.last().unwrap().stage, "summary");
    }

    #[test]
    fn indicator_columns_align_with_ticks() {
        let dir = scratch_dir("swingtrade_report_indicators");
        let ticks: Vec<Tick> = (3..=4)
            .map(|day| Tick {
                date: d(day),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                volume: 5.0,
            })
            .collect();
        let path = dir.join("indicators.csv");
        write_indicators_csv(&path, &ticks, &[("sma-2".to_string(), vec![None, Some(1.0)])])
            .unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,open,high,low,close,volume,sma-2");
        assert_eq!(lines[1], "2021-05-03,1,1,1,1,5,");
        assert_eq!(lines[2], "2021-05-04,1,1,1,1,5,1");
    }
}
