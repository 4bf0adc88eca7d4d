//! JSON report adapter implementing ReportPort.

use std::fs;
use std::path::Path;

use crate::domain::error::SigtraderError;
use crate::domain::metrics::BacktestReport;
use crate::ports::report_port::ReportPort;

pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, report: &BacktestReport) -> Result<String, SigtraderError> {
        serde_json::to_string_pretty(report).map_err(|e| SigtraderError::Report {
            reason: format!("failed to serialize report: {e}"),
        })
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &BacktestReport, output_path: &Path) -> Result<(), SigtraderError> {
        let json = self.render(report)?;
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(SigtraderError::Io)?;
            }
        }
        fs::write(output_path, json).map_err(SigtraderError::Io)?;
        tracing::info!(path = %output_path.display(), "report written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::BacktestRun;
    use tempfile::TempDir;

    fn empty_report() -> BacktestReport {
        let run = BacktestRun {
            trades: Vec::new(),
            balance_history: vec![10_000.0],
            final_balance: 10_000.0,
            open_at_end: None,
        };
        BacktestReport::compute(run, 10_000.0, &[])
    }

    #[test]
    fn render_contains_summary_fields() {
        let json = JsonReportAdapter::new().render(&empty_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_trades"], 0);
        assert_eq!(value["profit_factor"], 0.0);
        assert_eq!(value["final_balance"], 10_000.0);
        assert!(value["trades"].as_array().unwrap().is_empty());
        assert!(value["time_range"].is_null());
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports").join("run.json");
        JsonReportAdapter::new()
            .write(&empty_report(), &path)
            .unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"win_rate\""));
    }
}
