//! Accident Record Types
//! Typed view over the census columns the pipeline relies on.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longitudes above this value are census placeholders for "unknown".
pub const LONGITUDE_SENTINEL_THRESHOLD: f64 = 900.0;
/// Latitudes above this value are census placeholders for "unknown".
pub const LATITUDE_SENTINEL_THRESHOLD: f64 = 90.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("not a numeric year: {0:?}")]
pub struct YearParseError(pub String);

/// Four-digit census year, used both to name files and to group counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct YearKey(pub i32);

impl YearKey {
    /// Coerce a floating point year, truncating any fraction.
    pub fn from_f64(value: f64) -> Result<Self, YearParseError> {
        if !value.is_finite() || value.abs() > i32::MAX as f64 {
            return Err(YearParseError(value.to_string()));
        }
        Ok(Self(value.trunc() as i32))
    }

    pub fn value(self) -> i32 {
        self.0
    }
}

impl From<i32> for YearKey {
    fn from(year: i32) -> Self {
        Self(year)
    }
}

impl FromStr for YearKey {
    type Err = YearParseError;

    /// Accepts `2013`, ` 2013 ` and `2013.0` style text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(year) = trimmed.parse::<i32>() {
            return Ok(Self(year));
        }
        trimmed
            .parse::<f64>()
            .map_err(|_| YearParseError(s.to_string()))
            .and_then(|v| Self::from_f64(v).map_err(|_| YearParseError(s.to_string())))
    }
}

impl fmt::Display for YearKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the census file, reduced to the typed fields the pipeline reads.
#[derive(Debug, Clone, PartialEq)]
pub struct AccidentRecord {
    pub state: i64,
    pub month: u8,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

impl AccidentRecord {
    /// Longitude with sentinel and NaN values mapped to `None`.
    pub fn clean_longitude(&self) -> Option<f64> {
        self.longitude
            .filter(|v| !v.is_nan() && *v <= LONGITUDE_SENTINEL_THRESHOLD)
    }

    /// Latitude with sentinel and NaN values mapped to `None`.
    pub fn clean_latitude(&self) -> Option<f64> {
        self.latitude
            .filter(|v| !v.is_nan() && *v <= LATITUDE_SENTINEL_THRESHOLD)
    }

    /// `(longitude, latitude)` when both coordinates are usable.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.clean_longitude()?, self.clean_latitude()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(longitude: f64, latitude: f64) -> AccidentRecord {
        AccidentRecord {
            state: 1,
            month: 1,
            longitude: Some(longitude),
            latitude: Some(latitude),
        }
    }

    #[test]
    fn test_year_from_text() {
        assert_eq!("2013".parse::<YearKey>(), Ok(YearKey(2013)));
        assert_eq!(" 2014 ".parse::<YearKey>(), Ok(YearKey(2014)));
        assert_eq!("2013.0".parse::<YearKey>(), Ok(YearKey(2013)));
        assert_eq!("2015.9".parse::<YearKey>(), Ok(YearKey(2015)));
    }

    #[test]
    fn test_year_rejects_non_numeric() {
        assert!("abc".parse::<YearKey>().is_err());
        assert!("".parse::<YearKey>().is_err());
        assert!("NaN".parse::<YearKey>().is_err());
        assert!("inf".parse::<YearKey>().is_err());
    }

    #[test]
    fn test_sentinel_boundaries() {
        assert_eq!(record(900.0, 40.0).clean_longitude(), Some(900.0));
        assert_eq!(record(900.1, 40.0).clean_longitude(), None);
        assert_eq!(record(-86.0, 90.0).clean_latitude(), Some(90.0));
        assert_eq!(record(-86.0, 90.1).clean_latitude(), None);
    }

    #[test]
    fn test_position_requires_both_coordinates() {
        assert_eq!(record(-86.5, 32.1).position(), Some((-86.5, 32.1)));
        assert_eq!(record(999.9999, 32.1).position(), None);
        assert_eq!(record(-86.5, 99.9999).position(), None);

        let missing = AccidentRecord {
            state: 1,
            month: 1,
            longitude: None,
            latitude: Some(32.0),
        };
        assert_eq!(missing.position(), None);
    }
}
