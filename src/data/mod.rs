//! Data module - census file loading and monthly aggregation

mod filename;
mod loader;
mod processor;
mod record;

pub use filename::make_filename;
pub use loader::{
    report_failures, AccidentTable, DataLoader, LoaderError, YearOutcome, LATITUDE_COL,
    LONGITUDE_COL, MONTH_COL, STATE_COL, YEAR_COL,
};
pub use processor::{summarize_years, DataProcessor, MonthlySummary, ProcessorError};
pub use record::{
    AccidentRecord, YearKey, YearParseError, LATITUDE_SENTINEL_THRESHOLD,
    LONGITUDE_SENTINEL_THRESHOLD,
};
