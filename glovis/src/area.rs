//! User-defined search areas.
//!
//! The polygon editor lives in the UI layer; the core only needs to ask
//! whether a scene touches the area. [`PolygonArea`] is the plain
//! implementation used when the polygon is known up front.

use crate::geometry::{PixelPoint, Polygon};
use crate::scene::Scene;

/// A user-drawn area that scenes can be tested against.
pub trait UserDefinedArea: Send + Sync {
    /// True once the user has closed the polygon. Open polygons filter
    /// nothing.
    fn is_closed(&self) -> bool;

    /// True if the scene's footprint touches the area.
    fn intersects(&self, scene: &Scene) -> bool;
}

/// A polygon in mosaic pixel coordinates, built point by point.
#[derive(Debug, Clone, Default)]
pub struct PolygonArea {
    points: Vec<PixelPoint>,
    closed: bool,
}

impl PolygonArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an already-closed area.
    pub fn closed(points: Vec<PixelPoint>) -> Self {
        let mut area = Self {
            points,
            closed: false,
        };
        area.close();
        area
    }

    /// Append a vertex. Ignored once the polygon is closed.
    pub fn add_point(&mut self, point: PixelPoint) {
        if !self.closed {
            self.points.push(point);
        }
    }

    /// Close the polygon. Needs at least three vertices.
    pub fn close(&mut self) -> bool {
        self.closed = self.points.len() >= 3;
        self.closed
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.closed = false;
    }

    pub fn points(&self) -> &[PixelPoint] {
        &self.points
    }

    pub fn polygon(&self) -> Polygon {
        Polygon::new(self.points.clone())
    }
}

impl UserDefinedArea for PolygonArea {
    fn is_closed(&self) -> bool {
        self.closed
    }

    fn intersects(&self, scene: &Scene) -> bool {
        // Scenes without a footprint cannot be tested; treat them as inside.
        match scene.screen_location() {
            Some(footprint) => self.polygon().intersects(&footprint),
            None => true,
        }
    }
}
