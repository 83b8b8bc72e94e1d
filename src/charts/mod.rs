//! Charts module - state accident maps

mod basemap;
mod region;
mod renderer;

pub use basemap::{BaseMap, BaseMapError, Ring};
pub use region::{region_geometry, GeoBounds, PlotError, PlotOutcome, RegionGeometry, RegionPlotter};
pub use renderer::MapRenderer;
