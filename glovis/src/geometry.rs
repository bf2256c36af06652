//! Projection-space and pixel-space geometry primitives.
//!
//! Projection coordinates are metres in the sensor's map projection (Y grows
//! northwards). Pixel coordinates are mosaic pixels relative to the mosaic's
//! upper-left corner (Y grows downwards).

/// A point in projection space (metres).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjPoint {
    pub x: f64,
    pub y: f64,
}

impl ProjPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point in mosaic pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box in projection space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl ProjBounds {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Create a degenerate box around a single point.
    pub fn from_point(p: ProjPoint) -> Self {
        Self::new(p.x, p.x, p.y, p.y)
    }

    /// Expand this box to include a point.
    pub fn expand(&mut self, p: ProjPoint) {
        self.min_x = self.min_x.min(p.x);
        self.max_x = self.max_x.max(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn center(&self) -> ProjPoint {
        ProjPoint::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// A closed polygon in pixel space.
///
/// Scene footprints are quadrilaterals; user-drawn areas may have any
/// number of vertices. The closing edge from the last vertex back to the
/// first is implicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polygon {
    points: Vec<PixelPoint>,
}

impl Polygon {
    pub fn new(points: Vec<PixelPoint>) -> Self {
        Self { points }
    }

    /// Build an axis-aligned rectangle from its upper-left corner and size.
    pub fn rect(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(vec![
            PixelPoint::new(x, y),
            PixelPoint::new(x + width, y),
            PixelPoint::new(x + width, y + height),
            PixelPoint::new(x, y + height),
        ])
    }

    pub fn points(&self) -> &[PixelPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over the polygon's edges, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (PixelPoint, PixelPoint)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Even-odd point containment test.
    pub fn contains(&self, p: PixelPoint) -> bool {
        if self.points.len() < 3 {
            return false;
        }
        let (px, py) = (p.x as f64, p.y as f64);
        let mut inside = false;
        for (a, b) in self.edges() {
            let (ax, ay, bx, by) = (a.x as f64, a.y as f64, b.x as f64, b.y as f64);
            if (ay > py) != (by > py) {
                let x_cross = ax + (py - ay) * (bx - ax) / (by - ay);
                if px < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// True if the two polygons overlap: an edge crosses or one contains
    /// a vertex of the other.
    pub fn intersects(&self, other: &Polygon) -> bool {
        if self.points.len() < 3 || other.points.len() < 3 {
            return false;
        }
        for (a, b) in self.edges() {
            for (c, d) in other.edges() {
                if segments_intersect(a, b, c, d) {
                    return true;
                }
            }
        }
        self.contains(other.points[0]) || other.contains(self.points[0])
    }

    /// Bounding rectangle as `(min, max)` corners.
    pub fn bounds(&self) -> Option<(PixelPoint, PixelPoint)> {
        let first = *self.points.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }
}

fn orientation(a: PixelPoint, b: PixelPoint, c: PixelPoint) -> i64 {
    let v = (b.x as i64 - a.x as i64) * (c.y as i64 - a.y as i64)
        - (b.y as i64 - a.y as i64) * (c.x as i64 - a.x as i64);
    v.signum()
}

fn on_segment(a: PixelPoint, b: PixelPoint, p: PixelPoint) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn segments_intersect(a: PixelPoint, b: PixelPoint, c: PixelPoint, d: PixelPoint) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);

    if o1 != o2 && o3 != o4 {
        return true;
    }
    (o1 == 0 && on_segment(a, b, c))
        || (o2 == 0 && on_segment(a, b, d))
        || (o3 == 0 && on_segment(c, d, a))
        || (o4 == 0 && on_segment(c, d, b))
}
