//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: equity curve, fills and round trips for external analysis tools
//! - **Markdown**: a human-readable single-run report
//!
//! All persisted artifacts include a `schema_version` field. Newer versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use barlab_core::domain::{EquitySnapshot, Trade};

use crate::round_trip::RoundTrip;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: timestamp, cash, market_value, total_equity, position
pub fn export_equity_csv(equity_curve: &[EquitySnapshot]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "cash", "market_value", "total_equity", "position"])?;
    for s in equity_curve {
        wtr.write_record([
            &s.timestamp.to_string(),
            &format!("{:.2}", s.cash),
            &format!("{:.2}", s.market_value),
            &format!("{:.2}", s.total_equity),
            &s.position.to_string(),
        ])?;
    }
    finish(wtr)
}

/// Columns: order_id, timestamp, side, price, quantity, commission, slippage
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "order_id",
        "timestamp",
        "side",
        "price",
        "quantity",
        "commission",
        "slippage",
    ])?;
    for t in trades {
        wtr.write_record([
            &t.order_id.0.to_string(),
            &t.timestamp.to_string(),
            &t.side.to_string(),
            &format!("{:.4}", t.price),
            &t.quantity.to_string(),
            &format!("{:.2}", t.commission),
            &format!("{:.4}", t.slippage),
        ])?;
    }
    finish(wtr)
}

pub fn export_round_trips_csv(round_trips: &[RoundTrip]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "entry_time",
        "exit_time",
        "entry_price",
        "exit_price",
        "quantity",
        "commission",
        "pnl",
        "return_pct",
        "holding_bars",
    ])?;
    for r in round_trips {
        wtr.write_record([
            &r.entry_time.to_string(),
            &r.exit_time.to_string(),
            &format!("{:.4}", r.entry_price),
            &format!("{:.4}", r.exit_price),
            &r.quantity.to_string(),
            &format!("{:.2}", r.commission),
            &format!("{:.2}", r.pnl),
            &format!("{:.6}", r.return_pct),
            &r.holding_bars.to_string(),
        ])?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates `{symbol}_{timestamp}/` under `output_dir` containing
/// `manifest.json`, `equity.csv`, `trades.csv`, `round_trips.csv` and `report.md`.
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        result.symbol,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let files = [
        ("manifest.json", export_json(result)?),
        ("equity.csv", export_equity_csv(&result.equity_curve)?),
        ("trades.csv", export_trades_csv(&result.trades)?),
        ("round_trips.csv", export_round_trips_csv(&result.round_trips)?),
        ("report.md", generate_report(result)),
    ];
    for (name, contents) in files {
        let path = run_dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

pub fn generate_report(result: &BacktestResult) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str(&format!("# Backtest Report: {}\n\n", result.strategy_name));

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} |\n", result.symbol));
    md.push_str(&format!("| Period | {} to {} |\n", result.start, result.end));
    md.push_str(&format!("| Bars | {} |\n", result.bar_count));
    md.push_str(&format!("| Initial Capital | {:.2} |\n", result.initial_capital));
    md.push_str(&format!("| Final Equity | {:.2} |\n", result.final_equity));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.fingerprint.dataset_hash));
    md.push_str(&format!("| Result Digest | {} |\n", result.fingerprint.result_digest));
    if result.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    let m = &result.metrics;
    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Total Return | {:.2}% |\n", m.total_return * 100.0));
    md.push_str(&format!("| Annualized Return | {:.2}% |\n", m.annualized_return * 100.0));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", m.max_drawdown * 100.0));
    md.push_str(&format!("| Max Drawdown Duration | {} bars |\n", m.max_drawdown_bars));
    md.push_str(&format!("| Volatility | {:.2}% |\n", m.volatility * 100.0));
    md.push_str(&format!("| Sharpe | {:.3} |\n", m.sharpe));
    md.push_str(&format!("| Sortino | {:.3} |\n", m.sortino));
    md.push_str(&format!("| Calmar | {:.3} |\n", m.calmar));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", m.win_rate * 100.0));
    match m.profit_loss_ratio {
        Some(r) => md.push_str(&format!("| Profit/Loss Ratio | {r:.2} |\n")),
        None => md.push_str("| Profit/Loss Ratio | n/a |\n"),
    }
    md.push_str(&format!("| Round Trips | {} |\n", m.round_trip_count));
    md.push_str(&format!("| Fills | {} |\n", m.fill_count));
    md.push_str(&format!("| Total Commission | {:.2} |\n", m.total_commission));
    md.push_str(&format!("| Total Slippage | {:.2} |\n", m.total_slippage));
    md.push('\n');

    if !result.rejected_orders.is_empty() {
        md.push_str("## Rejected Orders\n\n");
        for order in &result.rejected_orders {
            let reason = order
                .rejection
                .as_ref()
                .map(|r| r.to_string())
                .unwrap_or_default();
            md.push_str(&format!(
                "- {} {} {} x{} at bar {}: {}\n",
                order.id, order.side, order.order_type.label(), order.quantity, order.bar_index, reason
            ));
        }
        md.push('\n');
    }

    md
}
