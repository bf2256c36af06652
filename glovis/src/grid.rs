//! Tiles and the tile grid around the selected cell.
//!
//! A [`Tile`] is one grid cell's table of contents: every scene acquired
//! over the cell, sorted by date, plus the cell's projection bounding box.
//! A [`TileGrid`] is the K×K block of tiles centred on the user's selected
//! cell. It is rebuilt from a [`TileSource`] whenever the user pans, zooms
//! or changes resolution.
//!
//! ```text
//!        col-1     col      col+1
//!      ┌────────┬────────┬────────┐
//! row-1│ (0,0)  │ (1,0)  │ (2,0)  │
//!      ├────────┼────────┼────────┤
//! row  │ (0,1)  │ center │ (2,1)  │
//!      ├────────┼────────┼────────┤
//! row+1│ (0,2)  │ (1,2)  │ (2,2)  │
//!      └────────┴────────┴────────┘
//! ```
//!
//! Tiles that cannot be loaded, or that fall outside the sensor's grid, are
//! kept in place but marked invalid and contribute no scenes.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::coord::GridCell;
use crate::geometry::ProjBounds;
use crate::scene::Scene;
use crate::scene_list::SceneLookup;
use crate::sensor::SensorKind;

/// Default number of tiles per side.
pub const DEFAULT_GRID_SIZE: usize = 3;

/// Errors reported by a tile source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TileSourceError {
    /// The cell has no table of contents.
    #[error("No table of contents for cell {0}")]
    NotFound(GridCell),

    /// The table of contents could not be parsed.
    #[error("Malformed table of contents for cell {cell}: {reason}")]
    Malformed { cell: GridCell, reason: String },

    /// The transport failed.
    #[error("Failed to fetch cell {cell}: {reason}")]
    Transport { cell: GridCell, reason: String },
}

/// Produces tiles for grid cells.
pub trait TileSource {
    /// Load the tile for `cell`. Scenes need not be sorted.
    fn load_tile(&self, sensor: SensorKind, cell: GridCell) -> Result<Tile, TileSourceError>;
}

/// One grid cell's scenes.
#[derive(Debug, Clone)]
pub struct Tile {
    cell: GridCell,
    valid: bool,
    bounds: ProjBounds,
    scenes: Vec<Arc<Scene>>,
}

impl Tile {
    /// Create a valid tile. Scenes are sorted by acquisition date.
    pub fn new(cell: GridCell, bounds: ProjBounds, scenes: Vec<Scene>) -> Self {
        let mut scenes: Vec<Arc<Scene>> = scenes.into_iter().map(Arc::new).collect();
        scenes.sort_by_key(|s| s.date());
        Self {
            cell,
            valid: true,
            bounds,
            scenes,
        }
    }

    /// Create a valid tile whose bounding box is the union of its scenes'
    /// corners.
    pub fn from_scenes(cell: GridCell, scenes: Vec<Scene>, offset_resolution: f64) -> Self {
        let mut corners = scenes
            .iter()
            .flat_map(|s| s.corner_points(offset_resolution));
        let bounds = match corners.next() {
            Some(first) => corners.fold(ProjBounds::from_point(first), |mut b, p| {
                b.expand(p);
                b
            }),
            None => return Self::invalid(cell),
        };
        Self::new(cell, bounds, scenes)
    }

    /// A placeholder for a cell with no usable data.
    pub fn invalid(cell: GridCell) -> Self {
        Self {
            cell,
            valid: false,
            bounds: ProjBounds::new(0.0, 0.0, 0.0, 0.0),
            scenes: Vec::new(),
        }
    }

    pub fn cell(&self) -> GridCell {
        self.cell
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn bounds(&self) -> ProjBounds {
        self.bounds
    }

    /// Scenes sorted ascending by date; empty for invalid tiles.
    pub fn scenes(&self) -> &[Arc<Scene>] {
        &self.scenes
    }

    pub fn scene(&self, date_index: usize) -> Option<&Arc<Scene>> {
        self.scenes.get(date_index)
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Date index of `scene` within this tile, by identity.
    pub fn date_index_of(&self, scene: &Arc<Scene>) -> Option<usize> {
        self.scenes.iter().position(|s| Arc::ptr_eq(s, scene))
    }

    /// Index of the scene with the given entity ID.
    pub fn find_entity(&self, entity_id: &str) -> Option<usize> {
        self.scenes.iter().position(|s| s.entity_id() == entity_id)
    }
}

/// K×K tiles centred on a cell, stored row-major from the upper-left.
#[derive(Debug, Clone)]
pub struct TileGrid {
    sensor: SensorKind,
    center: GridCell,
    size: usize,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Build a grid from already-loaded tiles.
    ///
    /// `tiles` must hold `size * size` entries in row-major order. Missing
    /// entries are filled with invalid tiles.
    pub fn from_tiles(sensor: SensorKind, center: GridCell, size: usize, tiles: Vec<Tile>) -> Self {
        let size = size.max(1);
        let mut tiles = tiles;
        tiles.truncate(size * size);
        let half = (size / 2) as i32;
        while tiles.len() < size * size {
            let i = tiles.len();
            let cell = center.offset((i % size) as i32 - half, (i / size) as i32 - half);
            tiles.push(Tile::invalid(cell));
        }
        Self {
            sensor,
            center,
            size,
            tiles,
        }
    }

    /// Load every tile of a `size`×`size` grid around `center`.
    ///
    /// Cells outside the sensor's grid and cells the source fails on become
    /// invalid tiles.
    pub fn load(
        source: &dyn TileSource,
        sensor: SensorKind,
        center: GridCell,
        size: usize,
    ) -> Self {
        let size = size.max(1);
        let half = (size / 2) as i32;
        let mut tiles = Vec::with_capacity(size * size);

        for gy in 0..size as i32 {
            for gx in 0..size as i32 {
                let cell = center.offset(gx - half, gy - half);
                let tile = if !sensor.contains_cell(cell) {
                    Tile::invalid(cell)
                } else {
                    match source.load_tile(sensor, cell) {
                        Ok(tile) if tile.cell() == cell => tile,
                        Ok(tile) => {
                            warn!(requested = %cell, returned = %tile.cell(), "Tile source returned wrong cell");
                            Tile::invalid(cell)
                        }
                        Err(e) => {
                            warn!(cell = %cell, error = %e, "Marking tile invalid");
                            Tile::invalid(cell)
                        }
                    }
                };
                tiles.push(tile);
            }
        }

        let grid = Self {
            sensor,
            center,
            size,
            tiles,
        };
        debug!(
            sensor = %sensor,
            center = %center,
            valid_tiles = grid.valid_tiles().count(),
            scenes = grid.total_scenes(),
            "Tile grid loaded"
        );
        grid
    }

    pub fn sensor(&self) -> SensorKind {
        self.sensor
    }

    pub fn center(&self) -> GridCell {
        self.center
    }

    /// Tiles per side.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn valid_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|t| t.is_valid())
    }

    /// Tile at grid position `(gx, gy)`, origin upper-left.
    pub fn tile_at(&self, gx: usize, gy: usize) -> Option<&Tile> {
        if gx >= self.size || gy >= self.size {
            return None;
        }
        self.tiles.get(gy * self.size + gx)
    }

    /// Tile covering `cell`, if it is part of this grid.
    pub fn tile_for(&self, cell: GridCell) -> Option<&Tile> {
        let half = (self.size / 2) as i32;
        let gx = cell.col - self.center.col + half;
        let gy = cell.row - self.center.row + half;
        if gx < 0 || gy < 0 {
            return None;
        }
        self.tile_at(gx as usize, gy as usize)
    }

    pub fn center_tile(&self) -> &Tile {
        let half = self.size / 2;
        &self.tiles[half * self.size + half]
    }

    /// Scene count over all valid tiles.
    pub fn total_scenes(&self) -> usize {
        self.valid_tiles().map(Tile::scene_count).sum()
    }

    /// Every scene in every valid tile.
    pub fn scenes(&self) -> impl Iterator<Item = &Arc<Scene>> {
        self.valid_tiles().flat_map(|t| t.scenes().iter())
    }

    /// Find a scene by entity ID anywhere in the grid.
    pub fn find_entity(&self, entity_id: &str) -> Option<&Arc<Scene>> {
        self.scenes().find(|s| s.entity_id() == entity_id)
    }
}

impl SceneLookup for TileGrid {
    fn lookup(&self, sensor: SensorKind, entity_id: &str) -> Option<Scene> {
        if sensor != self.sensor {
            return None;
        }
        self.find_entity(entity_id).map(|s| s.detached_copy())
    }
}

/// Tile source backed by scenes held in memory.
///
/// Used for scene lists restored without network access and in tests.
#[derive(Debug, Default)]
pub struct StaticTileSource {
    tiles: HashMap<GridCell, Tile>,
}

impl StaticTileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tile: Tile) {
        self.tiles.insert(tile.cell(), tile);
    }

    pub fn with_tile(mut self, tile: Tile) -> Self {
        self.insert(tile);
        self
    }
}

impl TileSource for StaticTileSource {
    fn load_tile(&self, _sensor: SensorKind, cell: GridCell) -> Result<Tile, TileSourceError> {
        self.tiles
            .get(&cell)
            .cloned()
            .ok_or(TileSourceError::NotFound(cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ProjPoint;
    use crate::scene::{AcquisitionDate, CornerOffset};

    fn scene(id: &str, cell: GridCell, date: u32) -> Scene {
        Scene::new(id, cell, AcquisitionDate::from_yyyymmdd(date).unwrap())
    }

    fn bounds() -> ProjBounds {
        ProjBounds::new(0.0, 100.0, 0.0, 100.0)
    }

    mod tile {
        use super::*;

        #[test]
        fn test_scenes_sorted_by_date() {
            let cell = GridCell::new(10, 10);
            let tile = Tile::new(
                cell,
                bounds(),
                vec![
                    scene("C", cell, 20200301),
                    scene("A", cell, 20200101),
                    scene("B", cell, 20200201),
                ],
            );
            let ids: Vec<&str> = tile.scenes().iter().map(|s| s.entity_id()).collect();
            assert_eq!(ids, vec!["A", "B", "C"]);
            assert!(tile.is_valid());
        }

        #[test]
        fn test_invalid_tile_is_empty() {
            let tile = Tile::invalid(GridCell::new(1, 1));
            assert!(!tile.is_valid());
            assert_eq!(tile.scene_count(), 0);
        }

        #[test]
        fn test_from_scenes_bounds() {
            let cell = GridCell::new(10, 10);
            let corners = [
                CornerOffset::new(0, 0),
                CornerOffset::new(100, 0),
                CornerOffset::new(100, 100),
                CornerOffset::new(0, 100),
            ];
            let a = scene("A", cell, 20200101).with_geometry(ProjPoint::new(0.0, 1000.0), corners);
            let b =
                scene("B", cell, 20200201).with_geometry(ProjPoint::new(-300.0, 1300.0), corners);

            let tile = Tile::from_scenes(cell, vec![a, b], 30.0);
            let bounds = tile.bounds();
            assert_eq!(bounds.min_x, -300.0);
            assert_eq!(bounds.max_x, 3000.0);
            assert_eq!(bounds.min_y, -2000.0);
            assert_eq!(bounds.max_y, 1300.0);
        }

        #[test]
        fn test_from_no_scenes_is_invalid() {
            let tile = Tile::from_scenes(GridCell::new(1, 1), vec![], 30.0);
            assert!(!tile.is_valid());
        }

        #[test]
        fn test_date_index_of_uses_identity() {
            let cell = GridCell::new(10, 10);
            let tile = Tile::new(cell, bounds(), vec![scene("A", cell, 20200101)]);
            let stored = tile.scene(0).unwrap().clone();
            assert_eq!(tile.date_index_of(&stored), Some(0));

            let lookalike = Arc::new(scene("A", cell, 20200101));
            assert_eq!(tile.date_index_of(&lookalike), None);
            assert_eq!(tile.find_entity("A"), Some(0));
        }
    }

    mod tile_grid {
        use super::*;

        #[test]
        fn test_load_marks_failures_invalid() {
            let center = GridCell::new(44, 34);
            let source = StaticTileSource::new().with_tile(Tile::new(
                center,
                bounds(),
                vec![scene("A", center, 20200101)],
            ));

            let grid = TileGrid::load(&source, SensorKind::LandsatEtm, center, 3);
            assert_eq!(grid.tiles().len(), 9);
            assert_eq!(grid.valid_tiles().count(), 1);
            assert_eq!(grid.center_tile().cell(), center);
            assert_eq!(grid.total_scenes(), 1);
        }

        #[test]
        fn test_cells_outside_sensor_grid_are_invalid() {
            let center = GridCell::new(1, 1);
            let mut source = StaticTileSource::new();
            for dc in -1..=1 {
                for dr in -1..=1 {
                    let cell = center.offset(dc, dr);
                    source.insert(Tile::new(cell, bounds(), vec![scene("X", cell, 20200101)]));
                }
            }

            let grid = TileGrid::load(&source, SensorKind::LandsatEtm, center, 3);
            // Column 0 and row 0 are outside WRS-2.
            assert_eq!(grid.valid_tiles().count(), 4);
        }

        #[test]
        fn test_tile_lookup_by_cell_and_position() {
            let center = GridCell::new(44, 34);
            let grid = TileGrid::from_tiles(SensorKind::LandsatEtm, center, 3, vec![]);

            assert_eq!(grid.tile_at(0, 0).unwrap().cell(), GridCell::new(43, 33));
            assert_eq!(grid.tile_at(2, 2).unwrap().cell(), GridCell::new(45, 35));
            assert!(grid.tile_at(3, 0).is_none());

            assert_eq!(
                grid.tile_for(GridCell::new(45, 33)).unwrap().cell(),
                GridCell::new(45, 33)
            );
            assert!(grid.tile_for(GridCell::new(47, 34)).is_none());
            assert!(grid.tile_for(GridCell::new(42, 34)).is_none());
        }

        #[test]
        fn test_find_entity() {
            let center = GridCell::new(44, 34);
            let source = StaticTileSource::new().with_tile(Tile::new(
                center,
                bounds(),
                vec![scene("A", center, 20200101), scene("B", center, 20200102)],
            ));
            let grid = TileGrid::load(&source, SensorKind::LandsatEtm, center, 3);
            assert_eq!(grid.find_entity("B").unwrap().entity_id(), "B");
            assert!(grid.find_entity("Z").is_none());
        }

        #[test]
        fn test_lookup_returns_detached_copy() {
            let center = GridCell::new(44, 34);
            let source = StaticTileSource::new().with_tile(Tile::new(
                center,
                bounds(),
                vec![scene("A", center, 20200101)],
            ));
            let grid = TileGrid::load(&source, SensorKind::LandsatEtm, center, 3);

            let copy = grid.lookup(SensorKind::LandsatEtm, "A").unwrap();
            assert_eq!(copy.entity_id(), "A");
            assert!(!copy.is_visible());
            assert!(grid.find_entity("A").unwrap().is_visible());
            assert!(grid.lookup(SensorKind::Aster, "A").is_none());
        }
    }
}
