//! Command line settings.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// FARS accident census explorer
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fars-explorer",
    about = "Monthly accident summaries and state accident maps from FARS census files",
    version
)]
pub struct Settings {
    /// Directory holding accident_<year>.csv.bz2 files (default: working directory)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Logging level
    #[arg(long, global = true, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Count accidents per month for each year
    Summarize {
        /// Years to load, e.g. 2013 2014 2015
        #[arg(required = true)]
        years: Vec<String>,

        /// Also export the table (.csv or .json)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Plot one state's accidents for a year
    Map {
        /// STATE code
        #[arg(long, value_parser = parse_state_code)]
        state: i64,

        /// Census year
        #[arg(long)]
        year: String,

        /// Output image (.png or .svg); default state_<STATE>_<YEAR>.png
        #[arg(long)]
        output: Option<PathBuf>,

        /// GeoJSON outlines drawn under the points, replacing the bundled US outline
        #[arg(long)]
        basemap: Option<PathBuf>,

        /// Image width in pixels
        #[arg(long, default_value = "1000")]
        width: u32,

        /// Image height in pixels
        #[arg(long, default_value = "800")]
        height: u32,

        /// Open the rendered map with the system viewer
        #[arg(long)]
        open: bool,
    },
}

/// STATE codes may be given as `1` or `1.0`.
pub fn parse_state_code(s: &str) -> Result<i64, String> {
    let trimmed = s.trim();
    if let Ok(code) = trimmed.parse::<i64>() {
        return Ok(code);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v.trunc() as i64),
        _ => Err(format!("invalid STATE number: {}", s)),
    }
}
