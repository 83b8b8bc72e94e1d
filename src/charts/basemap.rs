//! Base Map Module
//! Loads outline rings (borders, coastlines) from GeoJSON for drawing under accident points.

use super::region::GeoBounds;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Simplified conterminous United States outline drawn when no base map is supplied.
const BUNDLED_OUTLINE: &str = include_str!("../../assets/us_outline.geojson");

/// One closed or open outline, as (longitude, latitude) pairs.
pub type Ring = Vec<(f64, f64)>;

#[derive(Error, Debug)]
pub enum BaseMapError {
    #[error("Failed to read base map: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported GeoJSON: {0}")]
    Format(String),
}

/// Outline geometry drawn beneath the accident markers.
#[derive(Debug, Clone, Default)]
pub struct BaseMap {
    rings: Vec<Ring>,
}

impl BaseMap {
    /// The outline shipped with the crate.
    pub fn bundled() -> Result<Self, BaseMapError> {
        Self::from_geojson_str(BUNDLED_OUTLINE)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BaseMapError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&text)
    }

    pub fn from_geojson_str(text: &str) -> Result<Self, BaseMapError> {
        let value: Value = serde_json::from_str(text)?;
        let mut rings = Vec::new();
        collect_rings(&value, &mut rings)?;
        Ok(Self { rings })
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// Rings whose own extent overlaps `bounds`.
    pub fn rings_within(&self, bounds: &GeoBounds) -> Vec<&Ring> {
        self.rings
            .iter()
            .filter(|ring| GeoBounds::from_points(ring).is_some_and(|b| b.intersects(bounds)))
            .collect()
    }
}

fn collect_rings(value: &Value, rings: &mut Vec<Ring>) -> Result<(), BaseMapError> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| BaseMapError::Format("object without \"type\"".to_string()))?;

    match kind {
        "FeatureCollection" => {
            for feature in array_field(value, "features")? {
                collect_rings(feature, rings)?;
            }
        }
        "Feature" => match value.get("geometry") {
            Some(Value::Null) | None => {}
            Some(geometry) => collect_rings(geometry, rings)?,
        },
        "GeometryCollection" => {
            for geometry in array_field(value, "geometries")? {
                collect_rings(geometry, rings)?;
            }
        }
        "LineString" => rings.push(parse_ring(coordinates(value)?)?),
        "Polygon" | "MultiLineString" => {
            for ring in as_array(coordinates(value)?)? {
                rings.push(parse_ring(ring)?);
            }
        }
        "MultiPolygon" => {
            for polygon in as_array(coordinates(value)?)? {
                for ring in as_array(polygon)? {
                    rings.push(parse_ring(ring)?);
                }
            }
        }
        // Points carry no outline.
        "Point" | "MultiPoint" => {}
        other => return Err(BaseMapError::Format(format!("geometry type {}", other))),
    }
    Ok(())
}

fn array_field<'a>(value: &'a Value, name: &str) -> Result<&'a Vec<Value>, BaseMapError> {
    value
        .get(name)
        .and_then(Value::as_array)
        .ok_or_else(|| BaseMapError::Format(format!("missing \"{}\" array", name)))
}

fn coordinates(value: &Value) -> Result<&Value, BaseMapError> {
    value
        .get("coordinates")
        .ok_or_else(|| BaseMapError::Format("geometry without coordinates".to_string()))
}

fn as_array(value: &Value) -> Result<&Vec<Value>, BaseMapError> {
    value
        .as_array()
        .ok_or_else(|| BaseMapError::Format(format!("expected array, found {}", value)))
}

fn parse_ring(value: &Value) -> Result<Ring, BaseMapError> {
    as_array(value)?
        .iter()
        .map(|position| {
            let pair = as_array(position)?;
            match (
                pair.first().and_then(Value::as_f64),
                pair.get(1).and_then(Value::as_f64),
            ) {
                (Some(lon), Some(lat)) => Ok((lon, lat)),
                _ => Err(BaseMapError::Format(format!("bad position {}", position))),
            }
        })
        .collect()
}
