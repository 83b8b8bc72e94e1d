//! Census Data Loader Module
//! Handles accident file loading, schema validation and per-year projection using Polars.

use super::filename::make_filename;
use super::record::{AccidentRecord, YearKey, YearParseError};
use bzip2::read::MultiBzDecoder;
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const STATE_COL: &str = "STATE";
pub const MONTH_COL: &str = "MONTH";
pub const LONGITUDE_COL: &str = "LONGITUD";
pub const LATITUDE_COL: &str = "LATITUDE";
/// Column attached to every per-year projection.
pub const YEAR_COL: &str = "year";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("file '{}' does not exist", .0.display())]
    FileNotFound(PathBuf),
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Schema mismatch in {}: column {column} {reason}", .path.display())]
    SchemaMismatch {
        path: PathBuf,
        column: String,
        reason: String,
    },
    #[error("Invalid year: {0}")]
    InvalidYear(#[from] YearParseError),
}

/// A fully loaded census file: the raw table plus its validated records.
#[derive(Debug, Clone)]
pub struct AccidentTable {
    path: PathBuf,
    df: DataFrame,
    records: Vec<AccidentRecord>,
}

impl AccidentTable {
    /// Raw table, every column passed through with its stored name.
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn records(&self) -> &[AccidentRecord] {
        &self.records
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    /// Get list of column names from the loaded DataFrame.
    pub fn columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Distinct STATE codes present in the file.
    pub fn states(&self) -> BTreeSet<i64> {
        self.records.iter().map(|r| r.state).collect()
    }

    /// Project down to `MONTH` plus a `year` column holding `year` on every row.
    pub fn month_year_frame(&self, year: YearKey) -> Result<DataFrame, LoaderError> {
        let mut projected = self.df.select([MONTH_COL])?;
        let height = projected.height();
        projected.with_column(Column::new(YEAR_COL.into(), vec![year.value(); height]))?;
        Ok(projected)
    }
}

/// Result of loading one requested year inside a batch.
#[derive(Debug)]
pub struct YearOutcome {
    /// The year exactly as the caller supplied it.
    pub requested: String,
    pub year: Option<YearKey>,
    /// Two-column `MONTH`/`year` table, or the reason this year was skipped.
    pub result: Result<DataFrame, LoaderError>,
}

impl YearOutcome {
    pub fn frame(&self) -> Option<&DataFrame> {
        self.result.as_ref().ok()
    }

    pub fn is_valid(&self) -> bool {
        self.result.is_ok()
    }

    /// Warning text for a skipped year.
    pub fn warning(&self) -> Option<String> {
        self.result
            .as_ref()
            .err()
            .map(|_| format!("invalid year: {}", self.requested))
    }
}

/// Log one warning per skipped year, in request order, and return them.
pub fn report_failures(outcomes: &[YearOutcome]) -> Vec<String> {
    outcomes
        .iter()
        .filter_map(|outcome| {
            let warning = outcome.warning()?;
            if let Err(e) = &outcome.result {
                debug!("{}: {}", warning, e);
            }
            warn!("{}", warning);
            Some(warning)
        })
        .collect()
}

/// Resolves census years to files and loads them with Polars.
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
    data_dir: Option<PathBuf>,
}

impl DataLoader {
    /// Loader that looks files up by bare name, relative to the working directory.
    pub fn new() -> Self {
        Self { data_dir: None }
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
        }
    }

    /// Path a given year's file is expected at.
    pub fn resolve_path(&self, year: YearKey) -> PathBuf {
        let file_name = make_filename(year);
        match &self.data_dir {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }

    /// Load a census file. `.bz2` files are decompressed in memory first.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<AccidentTable, LoaderError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoaderError::FileNotFound(path.to_path_buf()));
        }

        let bytes = Self::read_bytes(path)?;
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;

        let records = Self::extract_records(path, &df)?;
        debug!(
            "Loaded {} rows, {} columns from {}",
            df.height(),
            df.width(),
            path.display()
        );

        Ok(AccidentTable {
            path: path.to_path_buf(),
            df,
            records,
        })
    }

    /// Load the full table for a single year.
    pub fn read_year(&self, year: YearKey) -> Result<AccidentTable, LoaderError> {
        self.read_file(self.resolve_path(year))
    }

    /// Load several years independently; one entry per request, in request order.
    ///
    /// A year that cannot be parsed or loaded yields an `Err` entry instead of
    /// aborting the batch. Pair with [`report_failures`] to surface warnings.
    pub fn read_years<S>(&self, years: &[S]) -> Vec<YearOutcome>
    where
        S: AsRef<str> + Sync,
    {
        years
            .par_iter()
            .map(|requested| self.read_month_year(requested.as_ref()))
            .collect()
    }

    fn read_month_year(&self, requested: &str) -> YearOutcome {
        let year = requested.parse::<YearKey>();
        let result = year
            .clone()
            .map_err(LoaderError::from)
            .and_then(|year| self.read_year(year)?.month_year_frame(year));

        YearOutcome {
            requested: requested.to_string(),
            year: year.ok(),
            result,
        }
    }

    fn read_bytes(path: &Path) -> Result<Vec<u8>, LoaderError> {
        let io_err = |source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let mut bytes = Vec::new();
        let is_bz2 = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("bz2"));

        if is_bz2 {
            MultiBzDecoder::new(file)
                .read_to_end(&mut bytes)
                .map_err(io_err)?;
        } else {
            let mut file = file;
            file.read_to_end(&mut bytes).map_err(io_err)?;
        }
        Ok(bytes)
    }

    fn extract_records(path: &Path, df: &DataFrame) -> Result<Vec<AccidentRecord>, LoaderError> {
        let states = Self::required_integers(path, df, STATE_COL)?;
        let months = Self::required_integers(path, df, MONTH_COL)?;
        let longitudes = Self::float_column(path, df, LONGITUDE_COL)?;
        let latitudes = Self::float_column(path, df, LATITUDE_COL)?;

        let mut records = Vec::with_capacity(df.height());
        for (row, (((state, month), longitude), latitude)) in states
            .into_iter()
            .zip(months)
            .zip(longitudes)
            .zip(latitudes)
            .enumerate()
        {
            let month = u8::try_from(month)
                .ok()
                .filter(|m| (1..=12).contains(m))
                .ok_or_else(|| Self::schema_error(
                    path,
                    MONTH_COL,
                    format!("has out-of-range value {} at row {}", month, row + 1),
                ))?;

            records.push(AccidentRecord {
                state,
                month,
                longitude,
                latitude,
            });
        }
        Ok(records)
    }

    fn required_integers(path: &Path, df: &DataFrame, name: &str) -> Result<Vec<i64>, LoaderError> {
        let column = df
            .column(name)
            .map_err(|_| Self::schema_error(path, name, "is missing".to_string()))?;
        let cast = column
            .cast(&DataType::Int64)
            .map_err(|e| Self::schema_error(path, name, format!("is not integer ({})", e)))?;

        let values = cast.i64()?;
        values
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| {
                    Self::schema_error(path, name, format!("has no integer value at row {}", row + 1))
                })
            })
            .collect()
    }

    fn float_column(
        path: &Path,
        df: &DataFrame,
        name: &str,
    ) -> Result<Vec<Option<f64>>, LoaderError> {
        let column = df
            .column(name)
            .map_err(|_| Self::schema_error(path, name, "is missing".to_string()))?;
        let cast = column
            .cast(&DataType::Float64)
            .map_err(|e| Self::schema_error(path, name, format!("is not numeric ({})", e)))?;
        let values = cast.f64()?;
        Ok(values.into_iter().collect())
    }

    fn schema_error(path: &Path, column: &str, reason: String) -> LoaderError {
        LoaderError::SchemaMismatch {
            path: path.to_path_buf(),
            column: column.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bzip2::write::BzEncoder;
    use bzip2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str = "STATE,ST_CASE,MONTH,LATITUDE,LONGITUD";

    fn write_bz2(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut encoder = BzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(body.as_bytes()).unwrap();
        encoder.finish().unwrap();
        path
    }

    fn sample_rows() -> String {
        format!(
            "{}\n1,10001,1,32.5,-86.2\n1,10002,2,99.9999,999.9999\n6,60001,2,36.1,-119.7\n",
            HEADER
        )
    }

    #[test]
    fn test_missing_file_names_exact_path() {
        let loader = DataLoader::new();
        let err = loader.read_file("no_such_dir/accident_1899.csv.bz2").unwrap_err();
        match err {
            LoaderError::FileNotFound(path) => {
                assert_eq!(path, PathBuf::from("no_such_dir/accident_1899.csv.bz2"))
            }
            other => panic!("expected FileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_path_without_data_dir_is_bare_name() {
        let loader = DataLoader::new();
        assert_eq!(
            loader.resolve_path(YearKey(2013)),
            PathBuf::from("accident_2013.csv.bz2")
        );
    }

    #[test]
    fn test_read_bz2_preserves_columns_and_rows() {
        let tmp = TempDir::new().expect("tempdir");
        write_bz2(tmp.path(), "accident_2013.csv.bz2", &sample_rows());

        let loader = DataLoader::with_data_dir(tmp.path());
        let table = loader.read_year(YearKey(2013)).expect("load");

        assert_eq!(table.row_count(), 3);
        assert_eq!(
            table.columns(),
            vec!["STATE", "ST_CASE", "MONTH", "LATITUDE", "LONGITUD"]
        );
        assert_eq!(table.states().into_iter().collect::<Vec<_>>(), vec![1, 6]);

        let second = &table.records()[1];
        assert_eq!(second.month, 2);
        assert_eq!(second.longitude, Some(999.9999));
        assert_eq!(second.position(), None);
    }

    #[test]
    fn test_read_plain_csv() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("accident_2013.csv");
        std::fs::write(&path, sample_rows()).unwrap();

        let table = DataLoader::new().read_file(&path).expect("load");
        assert_eq!(table.records().len(), 3);
    }

    #[test]
    fn test_missing_required_column_is_schema_mismatch() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write_bz2(tmp.path(), "bad.csv.bz2", "STATE,MONTH,LATITUDE\n1,1,30.0\n");

        let err = DataLoader::new().read_file(&path).unwrap_err();
        match err {
            LoaderError::SchemaMismatch { column, .. } => assert_eq!(column, "LONGITUD"),
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_month_is_schema_mismatch() {
        let tmp = TempDir::new().expect("tempdir");
        let body = format!("{}\n1,10001,13,32.5,-86.2\n", HEADER);
        let path = write_bz2(tmp.path(), "bad.csv.bz2", &body);

        let err = DataLoader::new().read_file(&path).unwrap_err();
        assert!(matches!(err, LoaderError::SchemaMismatch { ref column, .. } if column == "MONTH"));
    }

    #[test]
    fn test_month_year_projection() {
        let tmp = TempDir::new().expect("tempdir");
        write_bz2(tmp.path(), "accident_2013.csv.bz2", &sample_rows());

        let loader = DataLoader::with_data_dir(tmp.path());
        let frame = loader
            .read_year(YearKey(2013))
            .and_then(|t| t.month_year_frame(YearKey(2013)))
            .expect("projection");

        let names: Vec<String> = frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["MONTH", "year"]);
        assert_eq!(frame.height(), 3);

        let years: Vec<Option<i32>> = frame.column(YEAR_COL).unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(years, vec![Some(2013); 3]);
    }

    #[test]
    fn test_read_years_isolates_failures_in_order() {
        let tmp = TempDir::new().expect("tempdir");
        write_bz2(tmp.path(), "accident_2013.csv.bz2", &sample_rows());
        write_bz2(tmp.path(), "accident_2015.csv.bz2", &sample_rows());

        let loader = DataLoader::with_data_dir(tmp.path());
        let outcomes = loader.read_years(&["2013", "2014", "2015"]);

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].requested, "2013");
        assert!(outcomes[0].is_valid());
        assert!(!outcomes[1].is_valid());
        assert!(matches!(outcomes[1].result, Err(LoaderError::FileNotFound(_))));
        assert!(outcomes[2].is_valid());
        assert_eq!(outcomes[2].frame().map(|f| f.width()), Some(2));

        let warnings = report_failures(&outcomes);
        assert_eq!(warnings, vec!["invalid year: 2014".to_string()]);
    }

    #[test]
    fn test_unparsable_year_becomes_placeholder() {
        let loader = DataLoader::new();
        let outcomes = loader.read_years(&["twenty"]);

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].year, None);
        assert!(matches!(outcomes[0].result, Err(LoaderError::InvalidYear(_))));
        assert_eq!(outcomes[0].warning().as_deref(), Some("invalid year: twenty"));
    }
}
