//! Region Plotter Module
//! Filters one state's accidents for a year, cleans coordinates and renders them on a map.

use super::basemap::{BaseMap, BaseMapError};
use super::renderer::MapRenderer;
use crate::data::{AccidentTable, DataLoader, LoaderError, YearKey};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error("invalid STATE number: {0}")]
    InvalidRegion(i64),
    #[error("Failed to render map: {0}")]
    Render(String),
    #[error(transparent)]
    BaseMap(#[from] BaseMapError),
}

/// Longitude/latitude extent of a set of positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    /// `None` for an empty slice.
    pub fn from_points(points: &[(f64, f64)]) -> Option<Self> {
        let (&(lon, lat), rest) = points.split_first()?;
        let start = Self {
            min_lon: lon,
            max_lon: lon,
            min_lat: lat,
            max_lat: lat,
        };
        Some(rest.iter().fold(start, |b, &(lon, lat)| Self {
            min_lon: b.min_lon.min(lon),
            max_lon: b.max_lon.max(lon),
            min_lat: b.min_lat.min(lat),
            max_lat: b.max_lat.max(lat),
        }))
    }

    pub fn intersects(&self, other: &GeoBounds) -> bool {
        self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
            && self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
    }

    /// Grow each side by `fraction` of the extent, with a floor for degenerate extents.
    pub fn padded(&self, fraction: f64) -> Self {
        let pad_lon = ((self.max_lon - self.min_lon) * fraction).max(0.5);
        let pad_lat = ((self.max_lat - self.min_lat) * fraction).max(0.5);
        Self {
            min_lon: self.min_lon - pad_lon,
            max_lon: self.max_lon + pad_lon,
            min_lat: self.min_lat - pad_lat,
            max_lat: self.max_lat + pad_lat,
        }
    }
}

/// Everything a backend needs to draw one state's accidents.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionGeometry {
    pub state: i64,
    pub year: YearKey,
    pub bounds: GeoBounds,
    /// (LONGITUD, LATITUDE) per accident with usable coordinates.
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlotOutcome {
    Rendered(PathBuf),
    /// Nothing to place on the map; not an error.
    NoAccidents,
}

/// Select `state`'s accidents from a loaded year and compute their map geometry.
///
/// Returns `Ok(None)` when the state has no accident with usable coordinates.
pub fn region_geometry(
    table: &AccidentTable,
    state: i64,
    year: YearKey,
) -> Result<Option<RegionGeometry>, PlotError> {
    if !table.states().contains(&state) {
        return Err(PlotError::InvalidRegion(state));
    }

    let selected: Vec<_> = table
        .records()
        .iter()
        .filter(|r| r.state == state)
        .collect();
    if selected.is_empty() {
        info!("no accidents to plot");
        return Ok(None);
    }

    let points: Vec<(f64, f64)> = selected.iter().filter_map(|r| r.position()).collect();
    let Some(bounds) = GeoBounds::from_points(&points) else {
        info!("no accidents to plot");
        return Ok(None);
    };

    info!(
        "STATE {} in {}: {} accidents, {} with known location",
        state,
        year,
        selected.len(),
        points.len()
    );

    Ok(Some(RegionGeometry {
        state,
        year,
        bounds,
        points,
    }))
}

/// Loads a year, selects one state and renders its accident map.
pub struct RegionPlotter {
    loader: DataLoader,
    renderer: MapRenderer,
    base_map: Option<BaseMap>,
}

impl RegionPlotter {
    pub fn new(loader: DataLoader) -> Self {
        Self {
            loader,
            renderer: MapRenderer::default(),
            base_map: None,
        }
    }

    pub fn with_renderer(mut self, renderer: MapRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_base_map(mut self, base_map: BaseMap) -> Self {
        self.base_map = Some(base_map);
        self
    }

    /// Geometry for `state` in `year`, loading the full table for that year.
    pub fn geometry(&self, state: i64, year: YearKey) -> Result<Option<RegionGeometry>, PlotError> {
        let table = self.loader.read_year(year)?;
        region_geometry(&table, state, year)
    }

    /// Render `state`'s accidents in `year` to `output` (PNG, or SVG by extension).
    ///
    /// Draws over the supplied base map, or the bundled outline when none was given.
    pub fn plot_state(
        &self,
        state: i64,
        year: YearKey,
        output: &Path,
    ) -> Result<PlotOutcome, PlotError> {
        let Some(geometry) = self.geometry(state, year)? else {
            return Ok(PlotOutcome::NoAccidents);
        };

        let bundled;
        let base_map = match &self.base_map {
            Some(map) => map,
            None => {
                bundled = BaseMap::bundled()?;
                &bundled
            }
        };

        self.renderer.render(&geometry, Some(base_map), output)?;
        info!("Map written to {}", output.display());
        Ok(PlotOutcome::Rendered(output.to_path_buf()))
    }
}
