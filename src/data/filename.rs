//! Census file naming.

use super::record::YearKey;

/// Canonical file name for a census year, e.g. `accident_2013.csv.bz2`.
pub fn make_filename(year: YearKey) -> String {
    format!("accident_{}.csv.bz2", year.value())
}
