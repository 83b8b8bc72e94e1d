//! Summary Report Module
//! Exports the monthly summary as CSV (Polars writer) or JSON (serde).

use crate::data::{MonthlySummary, MONTH_COL};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported report format: {0}")]
    UnsupportedFormat(String),
}

/// One month of the wide table; missing counts serialize as `null`.
#[derive(Debug, Serialize, PartialEq)]
pub struct SummaryRow {
    #[serde(rename = "MONTH")]
    pub month: i64,
    #[serde(flatten)]
    pub counts: BTreeMap<String, Option<u32>>,
}

/// Serializable form of [`MonthlySummary`].
#[derive(Debug, Serialize, PartialEq)]
pub struct SummaryReport {
    pub years: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

impl From<&MonthlySummary> for SummaryReport {
    fn from(summary: &MonthlySummary) -> Self {
        let years = summary.years();
        let rows = summary
            .months()
            .into_iter()
            .map(|month| SummaryRow {
                month,
                counts: years
                    .iter()
                    .map(|&year| (year.to_string(), summary.count(year, month)))
                    .collect(),
            })
            .collect();

        Self {
            years: years.iter().map(|y| y.to_string()).collect(),
            rows,
        }
    }
}

/// Write `summary` to `path`, choosing CSV or JSON from the extension.
pub fn write_summary(summary: &MonthlySummary, path: &Path) -> Result<(), ReportError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("csv") => {
            let mut df = summary.to_frame()?;
            let mut file = File::create(path)?;
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(&mut df)?;
        }
        Some("json") => {
            let file = File::create(path)?;
            serde_json::to_writer_pretty(file, &SummaryReport::from(summary))?;
        }
        _ => {
            return Err(ReportError::UnsupportedFormat(path.display().to_string()));
        }
    }
    Ok(())
}

/// Plain-text table for the console, one row per month.
pub fn format_summary(summary: &MonthlySummary) -> String {
    let years = summary.years();
    let mut lines = Vec::with_capacity(summary.months().len() + 1);

    let mut header = format!("{:>5}", MONTH_COL);
    for year in &years {
        header.push_str(&format!(" {:>6}", year));
    }
    lines.push(header);

    for month in summary.months() {
        let mut line = format!("{:>5}", month);
        for &year in &years {
            let cell = summary
                .count(year, month)
                .map(|n| n.to_string())
                .unwrap_or_else(|| "NA".to_string());
            line.push_str(&format!(" {:>6}", cell));
        }
        lines.push(line);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataProcessor, YEAR_COL};
    use tempfile::TempDir;

    fn summary() -> MonthlySummary {
        let a = DataFrame::new(vec![
            Column::new(MONTH_COL.into(), vec![1i64, 1, 2]),
            Column::new(YEAR_COL.into(), vec![2013i32; 3]),
        ])
        .unwrap();
        let b = DataFrame::new(vec![
            Column::new(MONTH_COL.into(), vec![2i64]),
            Column::new(YEAR_COL.into(), vec![2014i32]),
        ])
        .unwrap();
        DataProcessor::summarize_frames([&a, &b]).unwrap()
    }

    #[test]
    fn test_report_rows() {
        let report = SummaryReport::from(&summary());
        assert_eq!(report.years, vec!["2013", "2014"]);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].month, 1);
        assert_eq!(report.rows[0].counts["2013"], Some(2));
        assert_eq!(report.rows[0].counts["2014"], None);
    }

    #[test]
    fn test_json_export_uses_null_for_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("summary.json");
        write_summary(&summary(), &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["rows"][0]["MONTH"], 1);
        assert_eq!(value["rows"][0]["2013"], 2);
        assert!(value["rows"][0]["2014"].is_null());
    }

    #[test]
    fn test_csv_export_header() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("summary.csv");
        write_summary(&summary(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("MONTH,2013,2014"));
        assert_eq!(lines.next(), Some("1,2,"));
        assert_eq!(lines.next(), Some("2,1,1"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = write_summary(&summary(), Path::new("summary.xlsx")).unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_console_table_marks_missing() {
        let text = format_summary(&summary());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "MONTH   2013   2014");
        assert_eq!(lines[1], "    1      2     NA");
        assert_eq!(lines[2], "    2      1      1");
    }
}
