//! FARS Explorer - command line entry point

use anyhow::{Context, Result};
use clap::Parser;
use fars_explorer::bootstrap;
use fars_explorer::charts::{BaseMap, MapRenderer, PlotOutcome, RegionPlotter};
use fars_explorer::data::{summarize_years, DataLoader, YearKey};
use fars_explorer::report;
use fars_explorer::settings::{Command, Settings};
use std::path::PathBuf;

fn main() -> Result<()> {
    let settings = Settings::parse();
    bootstrap::setup_logging(&settings.log_level)?;

    let loader = match &settings.data_dir {
        Some(dir) => DataLoader::with_data_dir(dir),
        None => DataLoader::new(),
    };

    match settings.command {
        Command::Summarize { years, output } => {
            let summary = summarize_years(&loader, &years)?;
            println!("{}", report::format_summary(&summary));

            if let Some(path) = output {
                report::write_summary(&summary, &path)
                    .with_context(|| format!("writing summary to {}", path.display()))?;
                tracing::info!("Summary written to {}", path.display());
            }
        }
        Command::Map {
            state,
            year,
            output,
            basemap,
            width,
            height,
            open,
        } => {
            let year: YearKey = year
                .parse()
                .with_context(|| format!("invalid year: {}", year))?;
            let output =
                output.unwrap_or_else(|| PathBuf::from(format!("state_{}_{}.png", state, year)));

            let mut plotter =
                RegionPlotter::new(loader).with_renderer(MapRenderer::new(width, height));
            if let Some(path) = basemap {
                let map = BaseMap::from_path(&path)
                    .with_context(|| format!("loading base map {}", path.display()))?;
                plotter = plotter.with_base_map(map);
            }

            match plotter.plot_state(state, year, &output)? {
                PlotOutcome::Rendered(path) if open => {
                    open::that(&path)
                        .with_context(|| format!("opening {}", path.display()))?;
                }
                PlotOutcome::Rendered(_) | PlotOutcome::NoAccidents => {}
            }
        }
    }

    Ok(())
}
