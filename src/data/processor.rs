//! Data Processor Module
//! Counts accidents per (year, MONTH) and reshapes the counts into a wide table.

use super::loader::{report_failures, DataLoader, YearOutcome, MONTH_COL, YEAR_COL};
use super::record::YearKey;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Expected columns {expected:?}, found {found:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("Column {column} has no value at row {row}")]
    NullValue { column: String, row: usize },
    #[error("Year {value} at row {row} does not fit a census year")]
    YearOutOfRange { value: i64, row: usize },
}

/// Accident counts keyed by year, then by month.
///
/// Built by accumulation; a (year, month) pair that never occurred has no
/// entry, so [`MonthlySummary::count`] reports it as `None` rather than zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlySummary {
    counts: BTreeMap<YearKey, BTreeMap<i64, u32>>,
}

impl MonthlySummary {
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Years with at least one counted record, ascending.
    pub fn years(&self) -> Vec<YearKey> {
        self.counts.keys().copied().collect()
    }

    /// Every month seen in any year, ascending.
    pub fn months(&self) -> Vec<i64> {
        self.counts
            .values()
            .flat_map(|by_month| by_month.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn count(&self, year: YearKey, month: i64) -> Option<u32> {
        self.counts.get(&year)?.get(&month).copied()
    }

    /// Materialize the wide table: `MONTH` then one nullable column per year.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let months = self.months();
        let mut columns = Vec::with_capacity(self.counts.len() + 1);
        columns.push(Column::new(MONTH_COL.into(), months.clone()));

        for (year, by_month) in &self.counts {
            let cells: Vec<Option<u32>> = months
                .iter()
                .map(|month| by_month.get(month).copied())
                .collect();
            columns.push(Column::new(year.to_string().into(), cells));
        }

        DataFrame::new(columns)
    }

    fn add(&mut self, year: YearKey, month: i64) {
        *self
            .counts
            .entry(year)
            .or_default()
            .entry(month)
            .or_insert(0) += 1;
    }
}

/// Handles grouping and reshaping of per-year month tables.
pub struct DataProcessor;

impl DataProcessor {
    /// Summarize a batch, skipping years that failed to load.
    pub fn summarize(outcomes: &[YearOutcome]) -> Result<MonthlySummary, ProcessorError> {
        Self::summarize_frames(outcomes.iter().filter_map(YearOutcome::frame))
    }

    /// Stack `MONTH`/`year` tables and count rows per (year, MONTH).
    pub fn summarize_frames<'a, I>(frames: I) -> Result<MonthlySummary, ProcessorError>
    where
        I: IntoIterator<Item = &'a DataFrame>,
    {
        let mut summary = MonthlySummary::default();
        let mut row_offset = 0;

        for df in frames {
            Self::check_columns(df)?;

            let months = Self::integer_values(df, MONTH_COL, row_offset)?;
            let years = Self::integer_values(df, YEAR_COL, row_offset)?;
            for (row, (month, year)) in months.into_iter().zip(years).enumerate() {
                let year = i32::try_from(year).map_err(|_| ProcessorError::YearOutOfRange {
                    value: year,
                    row: row_offset + row,
                })?;
                summary.add(YearKey(year), month);
            }
            row_offset += df.height();
        }

        Ok(summary)
    }

    fn check_columns(df: &DataFrame) -> Result<(), ProcessorError> {
        let found: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let expected = vec![MONTH_COL.to_string(), YEAR_COL.to_string()];
        if found != expected {
            return Err(ProcessorError::ColumnMismatch { expected, found });
        }
        Ok(())
    }

    fn integer_values(
        df: &DataFrame,
        column: &str,
        row_offset: usize,
    ) -> Result<Vec<i64>, ProcessorError> {
        let cast = df.column(column)?.cast(&DataType::Int64)?;
        let values = cast.i64()?;
        values
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| ProcessorError::NullValue {
                    column: column.to_string(),
                    row: row_offset + row,
                })
            })
            .collect()
    }
}

/// Load `years`, log a warning for each one that failed, and summarize the rest.
pub fn summarize_years<S>(loader: &DataLoader, years: &[S]) -> Result<MonthlySummary, ProcessorError>
where
    S: AsRef<str> + Sync,
{
    let outcomes = loader.read_years(years);
    let skipped = report_failures(&outcomes);
    let summary = DataProcessor::summarize(&outcomes)?;
    info!(
        "Summarized {} of {} requested years ({} skipped)",
        summary.years().len(),
        outcomes.len(),
        skipped.len()
    );
    Ok(summary)
}
