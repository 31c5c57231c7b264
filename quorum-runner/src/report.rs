//! Run summary rendering and artifact export.
//!
//! Two consumers: a human reading the terminal after a replay, and
//! external analysis tools reading the artifact directory (JSON summary
//! plus a CSV trade tape).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::replay::{RunSummary, TradeRecord};

// ─── Terminal summary ───────────────────────────────────────────────

/// Renders a run summary as plain text for the terminal.
pub fn render_summary(summary: &RunSummary) -> String {
    let stats = &summary.stats;
    let mut out = String::with_capacity(512);

    out.push_str(&format!("Replay: {}\n", summary.symbol));
    out.push_str(&format!("  candles            {}\n", summary.candles));
    out.push_str(&format!("  ignored events     {}\n", stats.ignored));
    out.push_str(&format!("  decisions          {}\n", stats.decisions));
    out.push_str(&format!("  buys submitted     {}\n", stats.buys_submitted));
    out.push_str(&format!("  sells submitted    {}\n", stats.sells_submitted));
    out.push_str(&format!("  fills              {}\n", stats.fills));
    out.push_str(&format!("  cancels            {}\n", stats.cancels));
    out.push_str(&format!("  submit failures    {}\n", stats.submit_failures));
    out.push_str(&format!("  completed trades   {}\n", summary.trades.len()));
    out.push_str(&format!("  realized pnl       {:.2}\n", summary.realized_pnl));
    out.push_str(&format!(
        "  final phase        {:?}\n",
        summary.final_state.phase()
    ));
    out.push_str(&format!(
        "  config fingerprint {}\n",
        summary.config_fingerprint
    ));
    out
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serializes a `RunSummary` to pretty JSON.
pub fn export_summary_json(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize run summary to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Exports the completed trades as CSV.
///
/// Columns: symbol, entry_time, entry_price, entry_quantity, exit_time,
/// exit_price, exit_quantity, pnl
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "symbol",
        "entry_time",
        "entry_price",
        "entry_quantity",
        "exit_time",
        "exit_price",
        "exit_quantity",
        "pnl",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.symbol,
            &t.entry_time.to_rfc3339(),
            &format!("{:.8}", t.entry_price),
            &format!("{:.8}", t.entry_quantity),
            &t.exit_time.to_rfc3339(),
            &format!("{:.8}", t.exit_price),
            &format!("{:.8}", t.exit_quantity),
            &format!("{:.2}", t.pnl),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Saves the artifact set for a replay run.
///
/// Creates a directory named `{symbol}_{timestamp}/` under `output_dir`
/// containing:
/// - `summary.json` — the full `RunSummary`
/// - `trades.csv` — completed entry/exit round trips
///
/// Returns the path to the created directory.
pub fn save_artifacts(summary: &RunSummary, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        summary.symbol,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_summary_json(summary)?;
    std::fs::write(run_dir.join("summary.json"), &json)?;

    let trades_csv = export_trades_csv(&summary.trades)?;
    std::fs::write(run_dir.join("trades.csv"), &trades_csv)?;

    Ok(run_dir)
}
