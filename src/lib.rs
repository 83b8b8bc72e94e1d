//! FARS Explorer - accident census loading, monthly summaries & state maps
//!
//! Reads yearly `accident_<year>.csv.bz2` files, counts accidents per month
//! for a set of years, and plots one state's accident locations for a year.

pub mod bootstrap;
pub mod charts;
pub mod data;
pub mod report;
pub mod settings;
