//! Projection transforms between map coordinates and latitude/longitude.
//!
//! The core treats projections as opaque pure functions. Two simple
//! transforms are provided: the sinusoidal projection used by MODIS tiles
//! and a plain geographic (degrees as coordinates) pass-through.

use std::f64::consts::PI;

use crate::geometry::ProjPoint;

/// Mean earth radius used by the MODIS sinusoidal grid, in metres.
pub const SINUSOIDAL_SPHERE_RADIUS: f64 = 6_371_007.181;

/// Bidirectional map projection.
pub trait ProjectionTransform: Send + Sync {
    /// Projection code, as carried in the tile table of contents.
    fn code(&self) -> i32;

    /// Projection coordinates to `(latitude, longitude)` in degrees.
    fn to_lat_lon(&self, point: ProjPoint) -> (f64, f64);

    /// `(latitude, longitude)` in degrees to projection coordinates.
    fn to_projection(&self, lat: f64, lon: f64) -> ProjPoint;
}

/// Sinusoidal projection on a sphere.
#[derive(Debug, Clone, Copy)]
pub struct Sinusoidal {
    radius: f64,
    central_meridian: f64,
}

impl Sinusoidal {
    pub fn new(radius: f64, central_meridian: f64) -> Self {
        Self {
            radius,
            central_meridian,
        }
    }
}

impl Default for Sinusoidal {
    fn default() -> Self {
        Self::new(SINUSOIDAL_SPHERE_RADIUS, 0.0)
    }
}

impl ProjectionTransform for Sinusoidal {
    fn code(&self) -> i32 {
        16
    }

    fn to_lat_lon(&self, point: ProjPoint) -> (f64, f64) {
        let lat_rad = point.y / self.radius;
        let cos_lat = lat_rad.cos();
        let lon_offset = if cos_lat.abs() < f64::EPSILON {
            0.0
        } else {
            point.x / (self.radius * cos_lat)
        };
        (
            lat_rad * 180.0 / PI,
            self.central_meridian + lon_offset * 180.0 / PI,
        )
    }

    fn to_projection(&self, lat: f64, lon: f64) -> ProjPoint {
        let lat_rad = lat * PI / 180.0;
        let lon_rad = (lon - self.central_meridian) * PI / 180.0;
        ProjPoint::new(
            self.radius * lon_rad * lat_rad.cos(),
            self.radius * lat_rad,
        )
    }
}

/// Geographic coordinates used directly: x is longitude, y is latitude.
#[derive(Debug, Clone, Copy, Default)]
pub struct Geographic;

impl ProjectionTransform for Geographic {
    fn code(&self) -> i32 {
        0
    }

    fn to_lat_lon(&self, point: ProjPoint) -> (f64, f64) {
        (point.y, point.x)
    }

    fn to_projection(&self, lat: f64, lon: f64) -> ProjPoint {
        ProjPoint::new(lon, lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sinusoidal_origin() {
        let proj = Sinusoidal::default();
        let p = proj.to_projection(0.0, 0.0);
        assert!(p.x.abs() < 1e-6 && p.y.abs() < 1e-6);
    }

    #[test]
    fn test_sinusoidal_roundtrip() {
        let proj = Sinusoidal::default();
        for &(lat, lon) in &[(45.0, -120.0), (-33.9, 18.4), (60.0, 10.0)] {
            let (lat2, lon2) = proj.to_lat_lon(proj.to_projection(lat, lon));
            assert!((lat - lat2).abs() < 1e-9, "lat {} -> {}", lat, lat2);
            assert!((lon - lon2).abs() < 1e-9, "lon {} -> {}", lon, lon2);
        }
    }

    #[test]
    fn test_sinusoidal_equator_scale() {
        // One degree of longitude at the equator is R * pi / 180 metres.
        let proj = Sinusoidal::default();
        let p = proj.to_projection(0.0, 1.0);
        assert!((p.x - SINUSOIDAL_SPHERE_RADIUS * PI / 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_geographic_passthrough() {
        let proj = Geographic;
        assert_eq!(proj.to_projection(10.0, 20.0), ProjPoint::new(20.0, 10.0));
        assert_eq!(proj.to_lat_lon(ProjPoint::new(20.0, 10.0)), (10.0, 20.0));
    }
}
