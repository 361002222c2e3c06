//! Area-of-interest loading from OGR vector files, reduced to a WGS-84 bounding box.
use std::path::Path;

use gdal::Dataset;
use gdal::errors::GdalError as GdalCrateError;
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::vector::LayerAccess;
use thiserror::Error;
use tracing::{debug, info};

/// Errors encountered when loading an area of interest
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Invalid geometry file {path}: {reason}")]
    InvalidGeometry { path: String, reason: String },
}

impl GeometryError {
    fn invalid(path: &Path, reason: impl Into<String>) -> Self {
        GeometryError::InvalidGeometry {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }
}

/// Axis-aligned bounding box in traditional GIS order (x = lon, y = lat for WGS-84)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Smallest box containing both `self` and `other`
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Rectangle as a closed WKT polygon, counter-clockwise from the south-east corner.
    pub fn to_wkt(&self) -> String {
        let ring = [
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
        ];
        let coords: Vec<String> = ring.iter().map(|(x, y)| format!("{} {}", x, y)).collect();
        format!("POLYGON (({}))", coords.join(", "))
    }
}

/// Area of interest normalized to EPSG:4326
#[derive(Debug, Clone, PartialEq)]
pub struct AreaOfInterest {
    pub bbox: BoundingBox,
    pub wkt: String,
    /// Name of the CRS the file was read in
    pub source_crs: String,
    pub reprojected: bool,
}

fn wgs84() -> Result<SpatialRef, GeometryError> {
    let mut srs = SpatialRef::from_epsg(4326)?;
    // x = longitude, y = latitude
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

fn is_wgs84(srs: &SpatialRef) -> bool {
    matches!((srs.auth_name(), srs.auth_code()), (Some(name), Ok(4326)) if name == "EPSG")
}

fn crs_label(srs: &SpatialRef) -> String {
    match (srs.auth_name(), srs.auth_code()) {
        (Some(name), Ok(code)) => format!("{}:{}", name, code),
        _ => "custom (no authority)".to_string(),
    }
}

/// Load a vector file and return the bounding rectangle of all its features in WGS-84.
///
/// Only the bounding box is kept; the exact feature shapes are discarded.
pub fn load_area_of_interest(path: &Path) -> Result<AreaOfInterest, GeometryError> {
    let dataset =
        Dataset::open(path).map_err(|e| GeometryError::invalid(path, e.to_string()))?;
    if dataset.layer_count() == 0 {
        return Err(GeometryError::invalid(path, "no vector layers"));
    }
    let mut layer = dataset
        .layer(0)
        .map_err(|e| GeometryError::invalid(path, e.to_string()))?;

    let source_srs = layer
        .spatial_ref()
        .ok_or_else(|| GeometryError::invalid(path, "no coordinate reference system"))?;
    let source_crs = crs_label(&source_srs);

    let mut native: Option<BoundingBox> = None;
    for feature in layer.features() {
        if let Some(geometry) = feature.geometry() {
            if geometry.is_empty() {
                continue;
            }
            let env = geometry.envelope();
            let bbox = BoundingBox {
                min_x: env.MinX,
                min_y: env.MinY,
                max_x: env.MaxX,
                max_y: env.MaxY,
            };
            native = Some(match native {
                Some(acc) => acc.union(&bbox),
                None => bbox,
            });
        }
    }
    let native = native.ok_or_else(|| GeometryError::invalid(path, "no features"))?;
    info!("Loaded AOI file: {:?}, CRS: {}", path, source_crs);

    let (bbox, reprojected) = if is_wgs84(&source_srs) {
        (native, false)
    } else {
        let mut source_srs = source_srs;
        source_srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        let transform = CoordTransform::new(&source_srs, &wgs84()?)?;
        let bounds = transform.transform_bounds(
            &[native.min_x, native.min_y, native.max_x, native.max_y],
            21,
        )?;
        debug!("Reprojected bounds {:?} -> {:?}", native, bounds);
        (
            BoundingBox {
                min_x: bounds[0],
                min_y: bounds[1],
                max_x: bounds[2],
                max_y: bounds[3],
            },
            true,
        )
    };

    Ok(AreaOfInterest {
        bbox,
        wkt: bbox.to_wkt(),
        source_crs,
        reprojected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wkt_ring_is_closed_rectangle() {
        let bbox = BoundingBox {
            min_x: 14.0,
            min_y: 49.5,
            max_x: 15.25,
            max_y: 50.0,
        };
        assert_eq!(
            bbox.to_wkt(),
            "POLYGON ((15.25 49.5, 15.25 50, 14 50, 14 49.5, 15.25 49.5))"
        );
    }

    #[test]
    fn union_covers_both_boxes() {
        let a = BoundingBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 1.0,
            max_y: 1.0,
        };
        let b = BoundingBox {
            min_x: -2.0,
            min_y: 0.5,
            max_x: 0.5,
            max_y: 3.0,
        };
        let u = a.union(&b);
        assert_eq!((u.min_x, u.min_y, u.max_x, u.max_y), (-2.0, 0.0, 1.0, 3.0));
    }

    #[test]
    fn unreadable_file_is_invalid_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.geojson");
        std::fs::write(&path, "this is not a vector file").unwrap();
        assert!(matches!(
            load_area_of_interest(&path),
            Err(GeometryError::InvalidGeometry { .. })
        ));
    }
}
