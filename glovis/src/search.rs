//! Global search limits applied to every scene.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::area::UserDefinedArea;
use crate::config::FilterConfig;
use crate::coord::GridRange;
use crate::geometry::Polygon;
use crate::grid::TileGrid;
use crate::scene::{DateRange, Scene, ALL_DATA_VERSIONS};
use crate::scene_list::SceneList;

/// Every constraint the filter predicates test against.
///
/// `apply` runs all ten predicates, so a scene's visibility always reflects
/// the whole set. Defaults filter nothing.
#[derive(Clone)]
pub struct SearchLimits {
    pub max_cloud_cover: u8,
    pub date_range: DateRange,
    pub min_quality: u8,
    pub data_version: String,
    pub hidden: HashSet<String>,
    pub grid_range: Option<GridRange>,
    pub downloadable_only: bool,
    /// When set, only members of this list are shown.
    pub scene_list: Option<Arc<SceneList>>,
    /// Mosaic pixel area currently on screen.
    pub viewport: Option<Polygon>,
    pub user_area: Option<Arc<dyn UserDefinedArea>>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_cloud_cover: 100,
            date_range: DateRange::unbounded(),
            min_quality: 0,
            data_version: ALL_DATA_VERSIONS.to_string(),
            hidden: HashSet::new(),
            grid_range: None,
            downloadable_only: false,
            scene_list: None,
            viewport: None,
            user_area: None,
        }
    }
}

impl std::fmt::Debug for SearchLimits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchLimits")
            .field("max_cloud_cover", &self.max_cloud_cover)
            .field("date_range", &self.date_range)
            .field("min_quality", &self.min_quality)
            .field("data_version", &self.data_version)
            .field("hidden", &self.hidden.len())
            .field("grid_range", &self.grid_range)
            .field("downloadable_only", &self.downloadable_only)
            .field("scene_list", &self.scene_list.as_ref().map(|l| l.len()))
            .field("viewport", &self.viewport.is_some())
            .field("user_area", &self.user_area.is_some())
            .finish()
    }
}

impl From<&FilterConfig> for SearchLimits {
    fn from(config: &FilterConfig) -> Self {
        Self {
            max_cloud_cover: config.max_cloud_cover,
            date_range: config.date_range(),
            min_quality: config.min_quality,
            data_version: config.data_version.clone(),
            downloadable_only: config.downloadable_only,
            ..Self::default()
        }
    }
}

impl SearchLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_cloud_cover(mut self, percent: u8) -> Self {
        self.max_cloud_cover = percent.min(100);
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    pub fn with_min_quality(mut self, quality: u8) -> Self {
        self.min_quality = quality;
        self
    }

    pub fn with_data_version(mut self, version: impl Into<String>) -> Self {
        self.data_version = version.into();
        self
    }

    pub fn with_grid_range(mut self, range: GridRange) -> Self {
        self.grid_range = Some(range);
        self
    }

    pub fn with_downloadable_only(mut self, only: bool) -> Self {
        self.downloadable_only = only;
        self
    }

    pub fn with_scene_list(mut self, list: Arc<SceneList>) -> Self {
        self.scene_list = Some(list);
        self
    }

    pub fn with_viewport(mut self, viewport: Polygon) -> Self {
        self.viewport = Some(viewport);
        self
    }

    pub fn with_user_area(mut self, area: Arc<dyn UserDefinedArea>) -> Self {
        self.user_area = Some(area);
        self
    }

    /// Hide a scene by entity ID.
    pub fn hide(&mut self, entity_id: impl Into<String>) {
        self.hidden.insert(entity_id.into());
    }

    /// Undo [`hide`](Self::hide). Returns false if it was not hidden.
    pub fn unhide(&mut self, entity_id: &str) -> bool {
        self.hidden.remove(entity_id)
    }

    /// Re-evaluate every predicate for one scene.
    pub fn apply(&self, scene: &Scene) {
        scene.filter_to_viewport(self.viewport.as_ref());
        scene.filter_to_cloud_cover(self.max_cloud_cover);
        scene.filter_to_date_range(&self.date_range);
        scene.filter_to_scene_list(self.scene_list.as_deref());
        scene.filter_to_quality(self.min_quality);
        scene.filter_to_data_version(&self.data_version);
        scene.filter_to_hidden(&self.hidden);
        scene.filter_to_user_area(self.user_area.as_deref());
        scene.filter_to_grid_range(self.grid_range.as_ref());
        scene.filter_to_downloadable(self.downloadable_only);
    }

    /// Apply to every scene in the grid and return how many stay visible.
    pub fn apply_to_grid(&self, grid: &TileGrid) -> usize {
        let mut visible = 0;
        for scene in grid.scenes() {
            self.apply(scene);
            if scene.is_visible() {
                visible += 1;
            }
        }
        debug!(
            total = grid.total_scenes(),
            visible,
            limits = ?self,
            "Search limits applied"
        );
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::PolygonArea;
    use crate::coord::GridCell;
    use crate::geometry::{PixelPoint, ProjBounds};
    use crate::grid::Tile;
    use crate::scene::{AcquisitionDate, FilterPredicate};
    use crate::sensor::SensorKind;

    fn scene(id: &str, date: u32, cloud: u8) -> Scene {
        Scene::new(
            id,
            GridCell::new(44, 34),
            AcquisitionDate::from_yyyymmdd(date).unwrap(),
        )
        .with_cloud_cover(cloud)
        .with_quality(vec![9, 7])
        .with_data_version("L1T")
        .with_download(true, Some(1024))
    }

    fn failing(s: &Scene) -> Vec<FilterPredicate> {
        s.filter_flags().failing().collect()
    }

    #[test]
    fn test_default_limits_show_everything() {
        let s = scene("A", 20200101, 90);
        s.set_predicate(FilterPredicate::Quality);
        SearchLimits::default().apply(&s);
        assert!(s.is_visible());
    }

    #[test]
    fn test_each_limit_sets_its_own_bit() {
        let s = scene("A", 20201215, 40);

        SearchLimits::new().with_max_cloud_cover(30).apply(&s);
        assert_eq!(failing(&s), vec![FilterPredicate::CloudCover]);

        SearchLimits::new()
            .with_date_range(DateRange::new(2020, 2020, 5, 7))
            .apply(&s);
        assert_eq!(failing(&s), vec![FilterPredicate::DateRange]);

        SearchLimits::new().with_min_quality(8).apply(&s);
        assert_eq!(failing(&s), vec![FilterPredicate::Quality]);

        SearchLimits::new().with_data_version("L1GT").apply(&s);
        assert_eq!(failing(&s), vec![FilterPredicate::DataVersion]);

        SearchLimits::new()
            .with_grid_range(GridRange::new(1, 10, 1, 10))
            .apply(&s);
        assert_eq!(failing(&s), vec![FilterPredicate::GridRange]);

        let mut limits = SearchLimits::new();
        limits.hide("A");
        limits.apply(&s);
        assert_eq!(failing(&s), vec![FilterPredicate::Hidden]);
        assert!(limits.unhide("A"));
        limits.apply(&s);
        assert!(s.is_visible());
    }

    #[test]
    fn test_scene_list_membership() {
        let member = scene("A", 20200101, 0);
        let other = scene("B", 20200101, 0);
        let mut list = SceneList::new(SensorKind::LandsatEtm);
        list.add(&member);

        let limits = SearchLimits::new().with_scene_list(Arc::new(list));
        limits.apply(&member);
        limits.apply(&other);
        assert!(member.is_visible());
        assert_eq!(failing(&other), vec![FilterPredicate::SceneList]);
    }

    #[test]
    fn test_viewport_and_user_area() {
        let s = scene("A", 20200101, 0);
        s.set_screen_location(Some(Polygon::rect(0, 0, 10, 10)));

        SearchLimits::new()
            .with_viewport(Polygon::rect(100, 100, 10, 10))
            .apply(&s);
        assert_eq!(failing(&s), vec![FilterPredicate::Viewport]);

        let area = PolygonArea::closed(vec![
            PixelPoint::new(50, 50),
            PixelPoint::new(60, 50),
            PixelPoint::new(60, 60),
        ]);
        SearchLimits::new().with_user_area(Arc::new(area)).apply(&s);
        assert_eq!(failing(&s), vec![FilterPredicate::UserArea]);
    }

    #[test]
    fn test_from_filter_config() {
        let config = FilterConfig {
            max_cloud_cover: 20,
            start_year: Some(2001),
            downloadable_only: true,
            ..FilterConfig::default()
        };
        let limits = SearchLimits::from(&config);
        assert_eq!(limits.max_cloud_cover, 20);
        assert_eq!(limits.date_range.start_year, 2001);
        assert!(limits.downloadable_only);
        assert!(limits.scene_list.is_none());
    }

    #[test]
    fn test_apply_to_grid_counts_visible() {
        let cell = GridCell::new(44, 34);
        let tile = Tile::new(
            cell,
            ProjBounds::new(0.0, 1.0, 0.0, 1.0),
            vec![
                scene("A", 20200101, 10),
                scene("B", 20200201, 50),
                scene("C", 20200301, 80),
            ],
        );
        let grid = TileGrid::from_tiles(SensorKind::LandsatEtm, cell, 1, vec![tile]);

        assert_eq!(SearchLimits::new().with_max_cloud_cover(50).apply_to_grid(&grid), 2);
        assert_eq!(SearchLimits::new().apply_to_grid(&grid), 3);
    }
}
