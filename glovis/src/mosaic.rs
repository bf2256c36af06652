//! Pixel layout of a tile grid.
//!
//! [`MosaicCoords`] maps projection coordinates (metres) onto mosaic pixels
//! at a fixed pixel size. The mosaic's upper-left corner is derived from the
//! valid tiles of a [`TileGrid`]; when no tile is valid the layout has no
//! anchor and every projection query returns `None`.
//!
//! ```text
//!   upper_left ─► ┌──────────────────────────┐ ▲
//!                 │  x: (p.x - ul.x) / size  │ │
//!                 │  y: (ul.y - p.y) / size  │ height_px
//!                 │                          │ │
//!                 └──────────────────────────┘ ▼
//!                 ◄──────── width_px ────────►
//! ```

use tracing::debug;

use crate::coord::GridCell;
use crate::geometry::{PixelPoint, Polygon, ProjBounds, ProjPoint};
use crate::grid::{Tile, TileGrid};

/// Sub-cell pan increments per cell in each direction.
pub const SUB_CELL_STEPS: i32 = 4;

/// Factor from tile-centre spread to full mosaic extent.
///
/// For a K×K grid the centres span K-1 tiles; 1.5 recovers the full three
/// tiles of the default grid.
pub const CENTER_SPREAD_FACTOR: f64 = 1.5;

/// Mosaic size and projection anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MosaicCoords {
    width_px: i32,
    height_px: i32,
    upper_left: Option<ProjPoint>,
    pixel_size: f64,
}

impl MosaicCoords {
    /// A layout with no anchor.
    pub fn unanchored(pixel_size: f64) -> Self {
        Self {
            width_px: 0,
            height_px: 0,
            upper_left: None,
            pixel_size,
        }
    }

    /// Compute the mosaic extent covering the valid tiles of `grid`.
    ///
    /// Two estimates are combined. The edge estimate is the union of the
    /// valid tiles' bounding boxes. The centre estimate is the spread of the
    /// tile centres scaled by [`CENTER_SPREAD_FACTOR`], centred on their
    /// midpoint. Width and height are the larger of the two; the anchor is
    /// the outermost.
    pub fn compute_mosaic_extent(grid: &TileGrid, pixel_size: f64) -> Self {
        let mut valid = grid.valid_tiles();
        let first = match valid.next() {
            Some(tile) => tile,
            None => {
                debug!(center = %grid.center(), "No valid tiles, mosaic has no anchor");
                return Self::unanchored(pixel_size);
            }
        };

        let mut edges = first.bounds();
        let mut centers = ProjBounds::from_point(first.bounds().center());
        for tile in valid {
            let b = tile.bounds();
            edges.expand(ProjPoint::new(b.min_x, b.min_y));
            edges.expand(ProjPoint::new(b.max_x, b.max_y));
            centers.expand(b.center());
        }

        let spread_width = centers.width() * CENTER_SPREAD_FACTOR;
        let spread_height = centers.height() * CENTER_SPREAD_FACTOR;
        let mid = centers.center();
        let spread_ul = ProjPoint::new(mid.x - spread_width / 2.0, mid.y + spread_height / 2.0);

        let width = edges.width().max(spread_width);
        let height = edges.height().max(spread_height);
        let upper_left = ProjPoint::new(edges.min_x.min(spread_ul.x), edges.max_y.max(spread_ul.y));

        let coords = Self {
            width_px: (width / pixel_size).ceil() as i32,
            height_px: (height / pixel_size).ceil() as i32,
            upper_left: Some(upper_left),
            pixel_size,
        };
        debug!(
            width = coords.width_px,
            height = coords.height_px,
            ul_x = upper_left.x,
            ul_y = upper_left.y,
            pixel_size,
            "Mosaic extent computed"
        );
        coords
    }

    pub fn width_px(&self) -> i32 {
        self.width_px
    }

    pub fn height_px(&self) -> i32 {
        self.height_px
    }

    /// Projection coordinate of the mosaic's upper-left pixel.
    pub fn upper_left(&self) -> Option<ProjPoint> {
        self.upper_left
    }

    pub fn is_anchored(&self) -> bool {
        self.upper_left.is_some()
    }

    /// Metres per pixel.
    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    /// Projection coordinate to mosaic pixel.
    pub fn to_pixel(&self, p: ProjPoint) -> Option<PixelPoint> {
        let ul = self.upper_left?;
        Some(PixelPoint::new(
            ((p.x - ul.x) / self.pixel_size).round() as i32,
            ((ul.y - p.y) / self.pixel_size).round() as i32,
        ))
    }

    /// Mosaic pixel to projection coordinate.
    pub fn to_projection(&self, p: PixelPoint) -> Option<ProjPoint> {
        let ul = self.upper_left?;
        Some(ProjPoint::new(
            ul.x + p.x as f64 * self.pixel_size,
            ul.y - p.y as f64 * self.pixel_size,
        ))
    }

    /// Store a pixel footprint on every scene of every valid tile.
    ///
    /// Corner offsets are scaled by the grid sensor's offset resolution.
    /// Returns the number of scenes located; zero when unanchored.
    pub fn compute_screen_locations(&self, grid: &TileGrid) -> usize {
        if self.upper_left.is_none() {
            debug!("Mosaic has no anchor, skipping screen locations");
            return 0;
        }

        let offset_resolution = grid.sensor().offset_resolution();
        let mut located = 0;
        for scene in grid.scenes() {
            let corners = scene.corner_points(offset_resolution);
            let points: Option<Vec<PixelPoint>> =
                corners.iter().map(|&c| self.to_pixel(c)).collect();
            scene.set_screen_location(points.map(Polygon::new));
            located += 1;
        }
        located
    }

    /// Pixel rectangle covering a tile's bounding box.
    pub fn tile_rect(&self, tile: &Tile) -> Option<PixelRect> {
        let ul = self.upper_left?;
        let b = tile.bounds();
        Some(PixelRect {
            x: (b.min_x - ul.x) / self.pixel_size,
            y: (ul.y - b.max_y) / self.pixel_size,
            width: b.width() / self.pixel_size,
            height: b.height() / self.pixel_size,
        })
    }

    /// Viewport for single-cell display with a sub-cell pan.
    ///
    /// `col_steps` and `row_steps` are clamped to `[-SUB_CELL_STEPS,
    /// SUB_CELL_STEPS]`. Each axis interpolates between the centre tile and
    /// its neighbour in the pan direction. An axis whose neighbour lies
    /// outside the sensor grid, outside this tile grid, or is invalid does
    /// not pan. Returns `None` when unanchored or the centre tile is invalid.
    pub fn single_cell_viewport(
        &self,
        grid: &TileGrid,
        col_steps: i32,
        row_steps: i32,
    ) -> Option<Polygon> {
        let center_tile = grid.center_tile();
        if !center_tile.is_valid() {
            return None;
        }
        let center = self.tile_rect(center_tile)?;

        let col_steps = col_steps.clamp(-SUB_CELL_STEPS, SUB_CELL_STEPS);
        let row_steps = row_steps.clamp(-SUB_CELL_STEPS, SUB_CELL_STEPS);

        let mut view = center;
        if let Some(neighbour) = self.neighbour_rect(grid, col_steps.signum(), 0) {
            let t = col_steps.abs() as f64 / SUB_CELL_STEPS as f64;
            view.x = lerp(center.x, neighbour.x, t);
            view.width = lerp(center.width, neighbour.width, t);
        }
        if let Some(neighbour) = self.neighbour_rect(grid, 0, row_steps.signum()) {
            let t = row_steps.abs() as f64 / SUB_CELL_STEPS as f64;
            view.y = lerp(center.y, neighbour.y, t);
            view.height = lerp(center.height, neighbour.height, t);
        }
        Some(view.to_polygon())
    }

    fn neighbour_rect(&self, grid: &TileGrid, dcol: i32, drow: i32) -> Option<PixelRect> {
        if dcol == 0 && drow == 0 {
            return None;
        }
        let cell: GridCell = grid.center().offset(dcol, drow);
        if !grid.sensor().contains_cell(cell) {
            return None;
        }
        grid.tile_for(cell)
            .filter(|t| t.is_valid())
            .and_then(|t| self.tile_rect(t))
    }
}

/// Fractional pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn to_polygon(&self) -> Polygon {
        Polygon::rect(
            self.x.round() as i32,
            self.y.round() as i32,
            self.width.round() as i32,
            self.height.round() as i32,
        )
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{AcquisitionDate, CornerOffset, Scene};
    use crate::sensor::SensorKind;

    const TILE: f64 = 1000.0;

    /// Grid of contiguous 1000 m tiles; `valid(gx, gy)` picks which load.
    fn grid(center: GridCell, valid: impl Fn(usize, usize) -> bool) -> TileGrid {
        let mut tiles = Vec::new();
        for gy in 0..3 {
            for gx in 0..3 {
                let cell = center.offset(gx as i32 - 1, gy as i32 - 1);
                if valid(gx, gy) {
                    let min_x = gx as f64 * TILE;
                    let max_y = -(gy as f64) * TILE;
                    let scene = Scene::new(
                        format!("S{}{}", gx, gy),
                        cell,
                        AcquisitionDate::from_yyyymmdd(20200101).unwrap(),
                    )
                    .with_geometry(
                        ProjPoint::new(min_x, max_y),
                        [
                            CornerOffset::new(0, 0),
                            CornerOffset::new(10, 0),
                            CornerOffset::new(10, 10),
                            CornerOffset::new(0, 10),
                        ],
                    );
                    tiles.push(Tile::new(
                        cell,
                        ProjBounds::new(min_x, min_x + TILE, max_y - TILE, max_y),
                        vec![scene],
                    ));
                } else {
                    tiles.push(Tile::invalid(cell));
                }
            }
        }
        TileGrid::from_tiles(SensorKind::LandsatEtm, center, 3, tiles)
    }

    fn rect_points(p: &Polygon) -> Vec<(i32, i32)> {
        p.points().iter().map(|p| (p.x, p.y)).collect()
    }

    mod extent {
        use super::*;

        #[test]
        fn test_full_grid() {
            let g = grid(GridCell::new(44, 34), |_, _| true);
            let coords = MosaicCoords::compute_mosaic_extent(&g, 10.0);
            assert_eq!(coords.upper_left(), Some(ProjPoint::new(0.0, 0.0)));
            assert_eq!(coords.width_px(), 300);
            assert_eq!(coords.height_px(), 300);
        }

        #[test]
        fn test_no_valid_tiles_is_unanchored() {
            let g = grid(GridCell::new(44, 34), |_, _| false);
            let coords = MosaicCoords::compute_mosaic_extent(&g, 10.0);
            assert!(!coords.is_anchored());
            assert_eq!(coords.to_pixel(ProjPoint::new(0.0, 0.0)), None);
            assert_eq!(coords.compute_screen_locations(&g), 0);
        }

        #[test]
        fn test_corner_tiles_use_center_spread() {
            // Only the two diagonal corners are valid. Their edges cover
            // 3000 m; the centre spread of 2000 m scales to the same.
            let g = grid(GridCell::new(44, 34), |gx, gy| (gx, gy) == (0, 0) || (gx, gy) == (2, 2));
            let coords = MosaicCoords::compute_mosaic_extent(&g, 10.0);
            assert_eq!(coords.width_px(), 300);
            assert_eq!(coords.upper_left(), Some(ProjPoint::new(0.0, 0.0)));
        }

        #[test]
        fn test_small_tiles_widened_by_center_spread() {
            let center = GridCell::new(44, 34);
            let small = |cell: GridCell, min_x: f64, max_y: f64| {
                Tile::new(cell, ProjBounds::new(min_x, min_x + 100.0, max_y - 100.0, max_y), vec![])
            };
            let mut tiles: Vec<Tile> = (0..9)
                .map(|i| Tile::invalid(center.offset(i % 3 - 1, i / 3 - 1)))
                .collect();
            tiles[0] = small(center.offset(-1, -1), 0.0, 0.0);
            tiles[8] = small(center.offset(1, 1), 2000.0, -2000.0);
            let g = TileGrid::from_tiles(SensorKind::LandsatEtm, center, 3, tiles);

            let coords = MosaicCoords::compute_mosaic_extent(&g, 10.0);
            // Edges span 2100 m, centres 2000 m * 1.5 = 3000 m.
            assert_eq!(coords.width_px(), 300);
            assert_eq!(coords.height_px(), 300);
            // Centre midpoint (1050, -1050) minus half of 3000.
            assert_eq!(coords.upper_left(), Some(ProjPoint::new(-450.0, 450.0)));
        }

        #[test]
        fn test_single_tile() {
            let g = grid(GridCell::new(44, 34), |gx, gy| (gx, gy) == (1, 1));
            let coords = MosaicCoords::compute_mosaic_extent(&g, 10.0);
            assert_eq!(coords.upper_left(), Some(ProjPoint::new(1000.0, -1000.0)));
            assert_eq!(coords.width_px(), 100);
        }

        #[test]
        fn test_pixel_projection_inverse() {
            let g = grid(GridCell::new(44, 34), |_, _| true);
            let coords = MosaicCoords::compute_mosaic_extent(&g, 10.0);
            let p = coords.to_pixel(ProjPoint::new(1500.0, -2500.0)).unwrap();
            assert_eq!(p, PixelPoint::new(150, 250));
            assert_eq!(coords.to_projection(p), Some(ProjPoint::new(1500.0, -2500.0)));
        }
    }

    mod screen_locations {
        use super::*;

        #[test]
        fn test_locations_anchored_at_upper_left() {
            let g = grid(GridCell::new(44, 34), |_, _| true);
            let coords = MosaicCoords::compute_mosaic_extent(&g, 10.0);
            assert_eq!(coords.compute_screen_locations(&g), 9);

            // ETM offsets are 30 m, so a 10-unit corner offset is 300 m.
            let scene = g.find_entity("S12").unwrap();
            let location = scene.screen_location().unwrap();
            assert_eq!(
                rect_points(&location),
                vec![(100, 200), (130, 200), (130, 230), (100, 230)]
            );
        }
    }

    mod viewport {
        use super::*;

        fn coords(g: &TileGrid) -> MosaicCoords {
            MosaicCoords::compute_mosaic_extent(g, 10.0)
        }

        #[test]
        fn test_zero_pan_is_center_cell() {
            let g = grid(GridCell::new(44, 34), |_, _| true);
            let view = coords(&g).single_cell_viewport(&g, 0, 0).unwrap();
            assert_eq!(view, Polygon::rect(100, 100, 100, 100));
        }

        #[test]
        fn test_half_step_pan() {
            let g = grid(GridCell::new(44, 34), |_, _| true);
            let c = coords(&g);
            assert_eq!(
                c.single_cell_viewport(&g, 2, 0).unwrap(),
                Polygon::rect(150, 100, 100, 100)
            );
            assert_eq!(
                c.single_cell_viewport(&g, 0, -2).unwrap(),
                Polygon::rect(100, 50, 100, 100)
            );
            assert_eq!(
                c.single_cell_viewport(&g, -4, 4).unwrap(),
                Polygon::rect(0, 200, 100, 100)
            );
        }

        #[test]
        fn test_pan_is_clamped_to_one_cell() {
            let g = grid(GridCell::new(44, 34), |_, _| true);
            let c = coords(&g);
            assert_eq!(c.single_cell_viewport(&g, 9, 0), c.single_cell_viewport(&g, 4, 0));
        }

        #[test]
        fn test_invalid_neighbour_blocks_pan() {
            let g = grid(GridCell::new(44, 34), |gx, _| gx != 2);
            let view = coords(&g).single_cell_viewport(&g, 3, 0).unwrap();
            assert_eq!(view, Polygon::rect(100, 100, 100, 100));
        }

        #[test]
        fn test_sensor_grid_edge_blocks_pan() {
            // WRS-2 rows stop at 248.
            let g = grid(GridCell::new(44, 248), |_, _| true);
            let c = coords(&g);
            assert_eq!(
                c.single_cell_viewport(&g, 0, 3).unwrap(),
                Polygon::rect(100, 100, 100, 100)
            );
            assert_eq!(
                c.single_cell_viewport(&g, 0, -4).unwrap(),
                Polygon::rect(100, 0, 100, 100)
            );
        }

        #[test]
        fn test_invalid_center_has_no_viewport() {
            let g = grid(GridCell::new(44, 34), |gx, gy| (gx, gy) != (1, 1));
            assert!(coords(&g).single_cell_viewport(&g, 0, 0).is_none());
        }
    }
}
