//! One sensor's browsing state.
//!
//! [`BrowseSession`] owns the tile grid around the selected cell and keeps
//! the derived structures in step with it:
//!
//! ```text
//!                 load_grid(source, center)
//!                            │
//!          ┌─────────────────┼─────────────────────┐
//!          ▼                 ▼                     ▼
//!   MosaicCoords       SearchLimits          SwathSceneFilter
//!   extent + screen    apply_to_grid         build + filter
//!   locations                │                     │
//!                            └──────────┬──────────┘
//!                                       ▼
//!                                  ZOrderList
//!                     cloud-cover order (mosaic) or
//!                     one scene per cell (single / per-tile)
//! ```
//!
//! Date navigation moves the selection through the swath and restacks the
//! Z-order: the new scene goes on top in mosaic mode and replaces its cell's
//! scene in place otherwise.

use std::sync::Arc;

use tracing::{debug, info};

use crate::area::UserDefinedArea;
use crate::config::ConfigFile;
use crate::coord::GridCell;
use crate::geometry::PixelPoint;
use crate::grid::{Tile, TileGrid, TileSource, DEFAULT_GRID_SIZE};
use crate::mosaic::MosaicCoords;
use crate::scene::{AcquisitionDate, Scene};
use crate::search::SearchLimits;
use crate::sensor::SensorKind;
use crate::swath::{SwathMode, SwathSceneFilter};
use crate::zorder::ZOrderList;

/// How many scenes per cell are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// One cell, one scene. Navigation stays in the selected cell.
    SingleScene,
    /// One scene per cell; navigation crosses cells along the swath.
    OnePerTile,
    /// Every visible scene, stacked by cloud cover.
    #[default]
    Mosaic,
}

impl DisplayMode {
    fn one_scene_per_cell(self) -> bool {
        !matches!(self, DisplayMode::Mosaic)
    }
}

/// Browsing state for one sensor.
#[derive(Debug)]
pub struct BrowseSession {
    sensor: SensorKind,
    grid_size: usize,
    grid: Option<TileGrid>,
    mosaic: MosaicCoords,
    zorder: ZOrderList,
    swath: SwathSceneFilter,
    limits: SearchLimits,
    mode: DisplayMode,
    selected: Option<Arc<Scene>>,
}

impl BrowseSession {
    pub fn new(sensor: SensorKind) -> Self {
        Self {
            sensor,
            grid_size: DEFAULT_GRID_SIZE,
            grid: None,
            mosaic: MosaicCoords::unanchored(sensor.lowest_resolution() as f64),
            zorder: ZOrderList::new(),
            swath: SwathSceneFilter::new(),
            limits: SearchLimits::default(),
            mode: DisplayMode::default(),
            selected: None,
        }
    }

    /// Session using the configured sensor, grid size and filter limits.
    pub fn from_config(config: &ConfigFile) -> Self {
        let mut session = Self::new(config.browser.sensor);
        session.grid_size = config.browser.grid_size;
        session.limits = SearchLimits::from(&config.filter);
        session
    }

    pub fn with_grid_size(mut self, size: usize) -> Self {
        self.grid_size = size.max(1);
        self
    }

    pub fn sensor(&self) -> SensorKind {
        self.sensor
    }

    pub fn grid(&self) -> Option<&TileGrid> {
        self.grid.as_ref()
    }

    pub fn mosaic(&self) -> &MosaicCoords {
        &self.mosaic
    }

    pub fn zorder(&self) -> &ZOrderList {
        &self.zorder
    }

    pub fn swath(&self) -> &SwathSceneFilter {
        &self.swath
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    /// Scene currently selected for display.
    pub fn selected(&self) -> Option<&Arc<Scene>> {
        self.selected.as_ref()
    }

    /// Z-order copy for an image loader.
    pub fn snapshot(&self) -> Vec<Arc<Scene>> {
        self.zorder.snapshot()
    }

    /// Load the grid around `center` and rebuild every derived structure.
    ///
    /// In mosaic mode a selection whose entity is still in the new grid and
    /// visible survives the reload. Per-cell modes keep it only when it lies
    /// in the new centre cell; otherwise the centre cell's visible scene
    /// nearest the old selection's date is chosen.
    pub fn load_grid(&mut self, source: &dyn TileSource, center: GridCell) {
        let grid = TileGrid::load(source, self.sensor, center, self.grid_size);
        let previous = self.selected.take();

        self.mosaic =
            MosaicCoords::compute_mosaic_extent(&grid, self.sensor.lowest_resolution() as f64);
        self.mosaic.compute_screen_locations(&grid);
        self.limits.apply_to_grid(&grid);
        self.swath.build(&grid);

        self.selected = previous
            .as_ref()
            .and_then(|p| grid.find_entity(p.entity_id()))
            .cloned();
        self.grid = Some(grid);
        self.restack(previous.as_ref().map(|p| p.date()), true);

        info!(
            sensor = %self.sensor,
            center = %center,
            scenes = self.swath.len(),
            selected = self.selected.as_ref().map(|s| s.entity_id()),
            "Grid loaded"
        );
    }

    /// Replace the search limits and re-filter everything.
    ///
    /// A selection hidden by the new limits is replaced by the nearest
    /// visible scene of its cell (per-cell modes) or the front scene
    /// (mosaic).
    pub fn apply_limits(&mut self, limits: SearchLimits) {
        self.limits = limits;
        let Some(grid) = &self.grid else {
            return;
        };
        let visible = self.limits.apply_to_grid(grid);
        let anchor = self.selected.as_ref().map(|s| s.date());
        self.restack(anchor, false);
        debug!(visible, "Search limits changed");
    }

    /// Set or clear the user-drawn area and re-filter.
    pub fn set_user_area(&mut self, area: Option<Arc<dyn UserDefinedArea>>) {
        let mut limits = self.limits.clone();
        limits.user_area = area;
        self.apply_limits(limits);
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        if self.mode == mode {
            return;
        }
        debug!(from = ?self.mode, to = ?mode, "Display mode changed");
        self.mode = mode;
        let anchor = self.selected.as_ref().map(|s| s.date());
        self.restack(anchor, false);
    }

    /// Toggle between single-scene and mosaic display.
    pub fn set_single_scene_mode(&mut self, single: bool) {
        self.set_display_mode(if single {
            DisplayMode::SingleScene
        } else {
            DisplayMode::Mosaic
        });
    }

    /// Make `scene` the selection and bring it to the front.
    ///
    /// Single-scene navigation follows the grid centre; selecting a scene in
    /// another cell does not recentre the grid. Call
    /// [`load_grid`](Self::load_grid) for that.
    pub fn select(&mut self, scene: &Arc<Scene>) {
        self.selected = Some(Arc::clone(scene));
        self.zorder.put_on_top(scene);
        debug!(scene = %scene, "Scene selected");
    }

    /// Select the front-most visible scene under a mosaic pixel.
    pub fn select_at(&mut self, point: PixelPoint) -> Option<Arc<Scene>> {
        let hit = self
            .zorder
            .iter()
            .find(|s| {
                s.is_visible()
                    && s.screen_location()
                        .is_some_and(|footprint| footprint.contains(point))
            })
            .cloned()?;
        self.select(&hit);
        Some(hit)
    }

    pub fn next_date(&mut self) -> Option<Arc<Scene>> {
        let scene = self.swath.next_date(self.selected.as_ref())?;
        self.show(&scene);
        Some(scene)
    }

    pub fn prev_date(&mut self) -> Option<Arc<Scene>> {
        let scene = self.swath.prev_date(self.selected.as_ref())?;
        self.show(&scene);
        Some(scene)
    }

    /// Jump to the first scene on or after `year`/`month` (1-12).
    pub fn goto_date(&mut self, year: i32, month: u32) -> Option<Arc<Scene>> {
        let scene = self.swath.goto_date(self.selected.as_ref(), year, month)?;
        self.show(&scene);
        Some(scene)
    }

    pub fn goto_first_date(&mut self) -> Option<Arc<Scene>> {
        let scene = self.swath.goto_first_date(self.selected.as_ref())?;
        self.show(&scene);
        Some(scene)
    }

    pub fn goto_last_date(&mut self) -> Option<Arc<Scene>> {
        let scene = self.swath.goto_last_date(self.selected.as_ref())?;
        self.show(&scene);
        Some(scene)
    }

    pub fn is_next_date_available(&mut self) -> bool {
        self.swath.is_next_date_available(self.selected.as_ref())
    }

    pub fn is_prev_date_available(&mut self) -> bool {
        self.swath.is_prev_date_available(self.selected.as_ref())
    }

    /// Display a scene reached by navigation.
    fn show(&mut self, scene: &Arc<Scene>) {
        if self.mode.one_scene_per_cell() {
            if !self.zorder.change_scene(scene) {
                self.zorder.put_on_top(scene);
            }
        } else {
            self.zorder.put_on_top(scene);
        }
        self.selected = Some(Arc::clone(scene));
        debug!(scene = %scene, date = %scene.date(), "Date changed");
    }

    fn swath_mode(&self) -> SwathMode {
        match self.mode {
            DisplayMode::SingleScene => {
                let cell = self
                    .grid
                    .as_ref()
                    .map(TileGrid::center)
                    .or_else(|| self.selected.as_ref().map(|s| s.cell()))
                    .unwrap_or_default();
                SwathMode::SelectedCell(cell)
            }
            DisplayMode::OnePerTile => SwathMode::OnePerTile,
            DisplayMode::Mosaic => SwathMode::AnyVisible,
        }
    }

    /// Bring selection, swath window and Z-order back in step after the
    /// grid, limits or display mode changed.
    fn restack(&mut self, anchor: Option<AcquisitionDate>, recentre: bool) {
        self.reconcile_selection(anchor, recentre);
        self.refilter_swath();
        self.populate_zorder();
        if self.selected.is_none() {
            self.selected = self.zorder.front().cloned();
        }
    }

    /// Drop or replace a selection that can no longer be displayed.
    ///
    /// The selection must be visible. Single-scene mode also requires it in
    /// the centre cell, as do both per-cell modes after a recentre.
    fn reconcile_selection(&mut self, anchor: Option<AcquisitionDate>, recentre: bool) {
        let Some(grid) = &self.grid else {
            self.selected = None;
            return;
        };
        let centred = recentre || self.mode == DisplayMode::SingleScene;
        let keep = self.selected.as_ref().is_some_and(|s| {
            s.is_visible()
                && (!self.mode.one_scene_per_cell() || !centred || s.cell() == grid.center())
        });
        if keep {
            return;
        }

        let replacement = if self.mode.one_scene_per_cell() {
            let home = self
                .selected
                .as_ref()
                .filter(|_| !centred)
                .and_then(|s| grid.tile_for(s.cell()))
                .unwrap_or_else(|| grid.center_tile());
            pick_scene(home, anchor)
                .or_else(|| pick_scene(grid.center_tile(), anchor))
                .cloned()
        } else {
            None
        };
        if let Some(old) = &self.selected {
            debug!(
                scene = %old,
                replacement = replacement.as_ref().map(|s| s.entity_id()),
                "Selection replaced"
            );
        }
        self.selected = replacement;
    }

    fn refilter_swath(&mut self) {
        let mode = self.swath_mode();
        self.swath.filter(mode, self.limits.user_area.clone());
    }

    fn populate_zorder(&mut self) {
        self.zorder.empty();
        self.zorder
            .set_single_scene_mode(self.mode.one_scene_per_cell());
        let Some(grid) = &self.grid else {
            return;
        };

        if self.mode.one_scene_per_cell() {
            let anchor = self.selected.as_ref().map(|s| s.date());
            for tile in grid.valid_tiles() {
                if let Some(scene) = pick_scene(tile, anchor) {
                    self.zorder.put_on_bottom(scene);
                }
            }
            if let Some(selected) = &self.selected {
                self.zorder.put_on_top(selected);
            }
        } else {
            for scene in grid.scenes().filter(|s| s.is_visible()) {
                self.zorder.insert_by_cloud_cover(scene);
            }
        }
        debug!(stacked = self.zorder.len(), mode = ?self.mode, "Z-order populated");
    }
}

/// The visible scene of `tile` closest to `anchor`, or its latest visible
/// scene without an anchor.
fn pick_scene(tile: &Tile, anchor: Option<AcquisitionDate>) -> Option<&Arc<Scene>> {
    let mut visible = tile.scenes().iter().filter(|s| s.is_visible());
    match anchor {
        Some(anchor) => visible.min_by_key(|s| {
            (s.date().as_naive() - anchor.as_naive())
                .num_days()
                .abs()
        }),
        None => visible.next_back(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ProjBounds;
    use crate::grid::StaticTileSource;

    fn scene(id: &str, cell: GridCell, date: u32, cloud: u8) -> Scene {
        Scene::new(id, cell, AcquisitionDate::from_yyyymmdd(date).unwrap()).with_cloud_cover(cloud)
    }

    fn source(center: GridCell) -> StaticTileSource {
        let west = center.offset(-1, 0);
        StaticTileSource::new()
            .with_tile(Tile::new(
                center,
                ProjBounds::new(1000.0, 2000.0, -2000.0, -1000.0),
                vec![
                    scene("C1", center, 20200101, 50),
                    scene("C2", center, 20200301, 10),
                ],
            ))
            .with_tile(Tile::new(
                west,
                ProjBounds::new(0.0, 1000.0, -2000.0, -1000.0),
                vec![scene("W1", west, 20200201, 30)],
            ))
    }

    #[test]
    fn test_mosaic_load_stacks_by_cloud_cover() {
        let center = GridCell::new(44, 34);
        let mut session = BrowseSession::new(SensorKind::LandsatEtm);
        session.load_grid(&source(center), center);

        let ids: Vec<&str> = session.zorder().iter().map(|s| s.entity_id()).collect();
        assert_eq!(ids, vec!["C2", "W1", "C1"]);
        assert_eq!(session.selected().unwrap().entity_id(), "C2");
        assert!(session.mosaic().is_anchored());
        assert_eq!(session.swath().len(), 3);
    }

    #[test]
    fn test_single_scene_mode_keeps_one_per_cell() {
        let center = GridCell::new(44, 34);
        let mut session = BrowseSession::new(SensorKind::LandsatEtm);
        session.set_single_scene_mode(true);
        session.load_grid(&source(center), center);

        assert_eq!(session.zorder().len(), 2);
        assert!(session.zorder().is_single_scene_mode());
        assert_eq!(session.selected().unwrap().entity_id(), "C2");

        let prev = session.prev_date().unwrap();
        assert_eq!(prev.entity_id(), "C1", "stays in the selected cell");
        assert_eq!(session.zorder().len(), 2);
        assert_eq!(session.zorder().front().unwrap().entity_id(), "C1");
        assert!(!session.is_prev_date_available());
    }

    #[test]
    fn test_mosaic_navigation_crosses_cells() {
        let center = GridCell::new(44, 34);
        let mut session = BrowseSession::new(SensorKind::LandsatEtm);
        session.load_grid(&source(center), center);

        assert_eq!(session.goto_first_date().unwrap().entity_id(), "C1");
        assert_eq!(session.next_date().unwrap().entity_id(), "W1");
        assert_eq!(session.zorder().front().unwrap().entity_id(), "W1");
        assert_eq!(session.next_date().unwrap().entity_id(), "C2");
        assert!(session.next_date().is_none());
        assert_eq!(session.selected().unwrap().entity_id(), "C2");
    }

    #[test]
    fn test_limits_restack_mosaic() {
        let center = GridCell::new(44, 34);
        let mut session = BrowseSession::new(SensorKind::LandsatEtm);
        session.load_grid(&source(center), center);

        session.apply_limits(SearchLimits::new().with_max_cloud_cover(30));
        let ids: Vec<&str> = session.zorder().iter().map(|s| s.entity_id()).collect();
        assert_eq!(ids, vec!["C2", "W1"]);
        assert_eq!(session.swath().range(), Some((1, 2)));
    }

    fn two_cell_source(west: GridCell) -> StaticTileSource {
        let east = west.offset(1, 0);
        StaticTileSource::new()
            .with_tile(Tile::new(
                west,
                ProjBounds::new(0.0, 1000.0, -1000.0, 0.0),
                vec![
                    scene("A1", west, 20200101, 10),
                    scene("A2", west, 20200301, 90),
                ],
            ))
            .with_tile(Tile::new(
                east,
                ProjBounds::new(1000.0, 2000.0, -1000.0, 0.0),
                vec![
                    scene("B1", east, 20200115, 20),
                    scene("B2", east, 20200215, 40),
                ],
            ))
    }

    #[test]
    fn test_single_scene_pan_follows_new_center() {
        let west = GridCell::new(44, 34);
        let east = west.offset(1, 0);
        let src = two_cell_source(west);
        let mut session = BrowseSession::new(SensorKind::LandsatEtm);
        session.set_single_scene_mode(true);
        session.load_grid(&src, west);
        assert_eq!(session.selected().unwrap().entity_id(), "A2");

        session.load_grid(&src, east);
        assert_eq!(session.selected().unwrap().entity_id(), "B2", "nearest to A2's date");
        assert_eq!(session.swath().mode(), SwathMode::SelectedCell(east));
        assert_eq!(session.zorder().front().unwrap().entity_id(), "B2");

        assert_eq!(session.goto_first_date().unwrap().entity_id(), "B1");
        assert_eq!(session.next_date().unwrap().entity_id(), "B2");
        assert!(session.next_date().is_none());
    }

    #[test]
    fn test_one_per_tile_pan_reselects_in_center() {
        let west = GridCell::new(44, 34);
        let east = west.offset(1, 0);
        let src = two_cell_source(west);
        let mut session = BrowseSession::new(SensorKind::LandsatEtm);
        session.set_display_mode(DisplayMode::OnePerTile);
        session.load_grid(&src, west);
        assert_eq!(session.selected().unwrap().cell(), west);

        session.load_grid(&src, east);
        assert_eq!(session.selected().unwrap().cell(), east);
        assert_eq!(session.zorder().len(), 2);
    }

    #[test]
    fn test_limits_replace_hidden_selection_in_single_scene() {
        let west = GridCell::new(44, 34);
        let mut session = BrowseSession::new(SensorKind::LandsatEtm);
        session.set_single_scene_mode(true);
        session.load_grid(&two_cell_source(west), west);
        assert_eq!(session.selected().unwrap().entity_id(), "A2");

        session.apply_limits(SearchLimits::new().with_max_cloud_cover(50));

        let selected = session.selected().unwrap();
        assert_eq!(selected.entity_id(), "A1");
        assert!(selected.is_visible());
        let snapshot = session.snapshot();
        assert!(snapshot.iter().all(|s| s.is_visible()));
        assert!(snapshot.iter().all(|s| s.entity_id() != "A2"));
        assert_eq!(snapshot[0].entity_id(), "A1");
    }

    #[test]
    fn test_limits_keep_visible_selection_off_center_in_one_per_tile() {
        let west = GridCell::new(44, 34);
        let mut session = BrowseSession::new(SensorKind::LandsatEtm);
        session.set_display_mode(DisplayMode::OnePerTile);
        session.load_grid(&two_cell_source(west), west);

        assert_eq!(session.goto_first_date().unwrap().entity_id(), "A1");
        assert_eq!(session.next_date().unwrap().entity_id(), "B1");

        session.apply_limits(SearchLimits::new().with_max_cloud_cover(30));
        assert_eq!(session.selected().unwrap().entity_id(), "B1");

        session.apply_limits(SearchLimits::new().with_max_cloud_cover(15));
        assert_eq!(session.selected().unwrap().entity_id(), "A1", "east cell has nothing left");
        assert!(session.snapshot().iter().all(|s| s.is_visible()));
        assert_eq!(session.zorder().len(), 1);
    }

    #[test]
    fn test_limits_replace_hidden_selection_in_mosaic() {
        let center = GridCell::new(44, 34);
        let mut session = BrowseSession::new(SensorKind::LandsatEtm);
        session.load_grid(&source(center), center);
        session.goto_first_date();
        assert_eq!(session.selected().unwrap().entity_id(), "C1");

        session.apply_limits(SearchLimits::new().with_max_cloud_cover(30));
        assert_eq!(session.selected().unwrap().entity_id(), "C2");
    }

    #[test]
    fn test_empty_session_navigation() {
        let mut session = BrowseSession::new(SensorKind::LandsatEtm);
        assert!(session.next_date().is_none());
        assert!(!session.is_next_date_available());
        assert!(session.snapshot().is_empty());
        session.apply_limits(SearchLimits::new());
    }

    #[test]
    fn test_from_config() {
        let mut config = ConfigFile::default();
        config.browser.sensor = SensorKind::ModisTerra;
        config.browser.grid_size = 5;
        config.filter.max_cloud_cover = 25;
        let session = BrowseSession::from_config(&config);
        assert_eq!(session.sensor(), SensorKind::ModisTerra);
        assert_eq!(session.limits().max_cloud_cover, 25);
    }
}
