//! Static Map Renderer
//! Draws one state's accident positions over an outline map with plotters.
//!
//! Layout:
//! 1. Caption: "STATE {state}, {year}"
//! 2. Longitude/latitude mesh scoped to the accident bounds (plus padding)
//! 3. Base map outlines, or the accident bounding frame when called without one
//! 4. One small filled marker per accident

use super::basemap::BaseMap;
use super::region::{PlotError, RegionGeometry};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

// Colors
const OUTLINE: RGBColor = RGBColor(90, 90, 90);
const FRAME: RGBColor = RGBColor(160, 160, 160);
const MARKER: RGBColor = RGBColor(200, 30, 45);

/// Fraction of the accident extent added around the map.
const VIEW_PADDING: f64 = 0.05;
const MARKER_RADIUS: i32 = 2;

/// Renders [`RegionGeometry`] to PNG or SVG files.
#[derive(Debug, Clone, Copy)]
pub struct MapRenderer {
    width: u32,
    height: u32,
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new(1000, 800)
    }
}

impl MapRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Write the map to `output`; a `.svg` extension selects the SVG backend.
    pub fn render(
        &self,
        geometry: &RegionGeometry,
        base_map: Option<&BaseMap>,
        output: &Path,
    ) -> Result<(), PlotError> {
        let is_svg = output
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

        let result = if is_svg {
            let root = SVGBackend::new(output, self.size()).into_drawing_area();
            Self::draw(root, geometry, base_map)
        } else {
            let root = BitMapBackend::new(output, self.size()).into_drawing_area();
            Self::draw(root, geometry, base_map)
        };

        result.map_err(|e| PlotError::Render(format!("{:#}", e)))
    }

    fn draw<DB>(
        root: DrawingArea<DB, Shift>,
        geometry: &RegionGeometry,
        base_map: Option<&BaseMap>,
    ) -> anyhow::Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let view = geometry.bounds.padded(VIEW_PADDING);
        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("STATE {}, {}", geometry.state, geometry.year),
                ("sans-serif", 24),
            )
            .margin(20)
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(view.min_lon..view.max_lon, view.min_lat..view.max_lat)?;

        chart
            .configure_mesh()
            .x_desc("Longitude")
            .y_desc("Latitude")
            .x_label_formatter(&|v| format!("{:.1}", v))
            .y_label_formatter(&|v| format!("{:.1}", v))
            .draw()?;

        match base_map {
            Some(map) => {
                for ring in map.rings_within(&view) {
                    chart.draw_series(std::iter::once(PathElement::new(
                        ring.clone(),
                        OUTLINE.stroke_width(1),
                    )))?;
                }
            }
            None => {
                let b = geometry.bounds;
                chart.draw_series(std::iter::once(Rectangle::new(
                    [(b.min_lon, b.min_lat), (b.max_lon, b.max_lat)],
                    FRAME.stroke_width(1),
                )))?;
            }
        }

        chart.draw_series(
            geometry
                .points
                .iter()
                .map(|&(lon, lat)| Circle::new((lon, lat), MARKER_RADIUS, MARKER.filled())),
        )?;

        root.present()?;
        Ok(())
    }
}
