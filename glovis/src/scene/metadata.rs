//! Scene metadata: identity, geometry, quality and runtime filter state.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU16, Ordering};

use parking_lot::{Mutex, RwLock};

use super::date::{AcquisitionDate, DateRange};
use super::filter::{FilterFlags, FilterPredicate};
use crate::area::UserDefinedArea;
use crate::coord::{GridCell, GridRange};
use crate::geometry::{Polygon, ProjPoint};
use crate::projection::ProjectionTransform;
use crate::scene_list::SceneList;

/// Data version value that matches every scene.
pub const ALL_DATA_VERSIONS: &str = "All";

/// Corner offset from the scene's upper-left coordinate, in sensor units.
///
/// Samples grow eastwards, lines grow southwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CornerOffset {
    pub sample: i32,
    pub line: i32,
}

impl CornerOffset {
    pub fn new(sample: i32, line: i32) -> Self {
        Self { sample, line }
    }
}

/// Handle to a decoded image held by the image loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHandle {
    /// Loader-assigned identifier.
    pub id: u64,
    /// Resolution the image was loaded at, in metres per pixel.
    pub resolution: u32,
}

/// One satellite acquisition at one grid cell.
///
/// Identity, geometry and quality fields are fixed at construction. The
/// filter flags, screen location and image handle change at runtime and may
/// be read from a loader thread holding an `Arc<Scene>` snapshot.
pub struct Scene {
    entity_id: String,
    secondary_id: Option<String>,
    cell: GridCell,
    date: AcquisitionDate,

    upper_left: ProjPoint,
    corners: [CornerOffset; 4],
    lat_lon_corners: Option<[(f64, f64); 4]>,

    cloud_cover: Option<u8>,
    quality: Vec<u8>,
    data_version: Option<String>,
    downloadable: bool,
    file_size: Option<u64>,

    flags: AtomicU16,
    screen_location: RwLock<Option<Polygon>>,
    image: Mutex<Option<ImageHandle>>,
}

impl Scene {
    /// Create a scene with no geometry or quality information.
    pub fn new(entity_id: impl Into<String>, cell: GridCell, date: AcquisitionDate) -> Self {
        Self {
            entity_id: entity_id.into(),
            secondary_id: None,
            cell,
            date,
            upper_left: ProjPoint::new(0.0, 0.0),
            corners: [CornerOffset::default(); 4],
            lat_lon_corners: None,
            cloud_cover: None,
            quality: Vec::new(),
            data_version: None,
            downloadable: false,
            file_size: None,
            flags: AtomicU16::new(FilterFlags::NONE.bits()),
            screen_location: RwLock::new(None),
            image: Mutex::new(None),
        }
    }

    pub fn with_secondary_id(mut self, id: impl Into<String>) -> Self {
        self.secondary_id = Some(id.into());
        self
    }

    /// Set the projection-space upper-left corner and the four corner
    /// offsets (upper-left, upper-right, lower-right, lower-left).
    pub fn with_geometry(mut self, upper_left: ProjPoint, corners: [CornerOffset; 4]) -> Self {
        self.upper_left = upper_left;
        self.corners = corners;
        self
    }

    pub fn with_lat_lon_corners(mut self, corners: [(f64, f64); 4]) -> Self {
        self.lat_lon_corners = Some(corners);
        self
    }

    pub fn with_cloud_cover(mut self, percent: u8) -> Self {
        self.cloud_cover = Some(percent.min(100));
        self
    }

    pub fn with_quality(mut self, digits: Vec<u8>) -> Self {
        self.quality = digits;
        self
    }

    pub fn with_data_version(mut self, version: impl Into<String>) -> Self {
        self.data_version = Some(version.into());
        self
    }

    pub fn with_download(mut self, downloadable: bool, file_size: Option<u64>) -> Self {
        self.downloadable = downloadable;
        self.file_size = file_size;
        self
    }

    /// Copy identity and quality fields into a new, unattached scene.
    ///
    /// The copy has no image and no screen location, and every filter bit
    /// is set so it stays hidden until filtered again.
    pub fn detached_copy(&self) -> Scene {
        Scene {
            entity_id: self.entity_id.clone(),
            secondary_id: self.secondary_id.clone(),
            cell: self.cell,
            date: self.date,
            upper_left: self.upper_left,
            corners: self.corners,
            lat_lon_corners: self.lat_lon_corners,
            cloud_cover: self.cloud_cover,
            quality: self.quality.clone(),
            data_version: self.data_version.clone(),
            downloadable: self.downloadable,
            file_size: self.file_size,
            flags: AtomicU16::new(FilterFlags::ALL.bits()),
            screen_location: RwLock::new(None),
            image: Mutex::new(None),
        }
    }

    // ---- identity -------------------------------------------------------

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn secondary_id(&self) -> Option<&str> {
        self.secondary_id.as_deref()
    }

    pub fn cell(&self) -> GridCell {
        self.cell
    }

    pub fn date(&self) -> AcquisitionDate {
        self.date
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn julian_day(&self) -> u32 {
        self.date.julian_day()
    }

    // ---- geometry -------------------------------------------------------

    pub fn upper_left(&self) -> ProjPoint {
        self.upper_left
    }

    pub fn corner_offsets(&self) -> &[CornerOffset; 4] {
        &self.corners
    }

    /// Corner coordinates in projection space.
    ///
    /// `offset_resolution` is the sensor's metres per offset unit.
    pub fn corner_points(&self, offset_resolution: f64) -> [ProjPoint; 4] {
        self.corners.map(|c| {
            ProjPoint::new(
                self.upper_left.x + c.sample as f64 * offset_resolution,
                self.upper_left.y - c.line as f64 * offset_resolution,
            )
        })
    }

    /// Average of the four corners in projection space.
    pub fn center(&self, offset_resolution: f64) -> ProjPoint {
        let corners = self.corner_points(offset_resolution);
        let (sx, sy) = corners
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        ProjPoint::new(sx / 4.0, sy / 4.0)
    }

    /// Latitude/longitude corners, derived through `projection` when the
    /// table of contents did not supply them.
    pub fn lat_lon_corners(
        &self,
        projection: &dyn ProjectionTransform,
        offset_resolution: f64,
    ) -> [(f64, f64); 4] {
        match self.lat_lon_corners {
            Some(corners) => corners,
            None => self
                .corner_points(offset_resolution)
                .map(|p| projection.to_lat_lon(p)),
        }
    }

    /// Footprint in mosaic pixels, once computed by the mosaic engine.
    pub fn screen_location(&self) -> Option<Polygon> {
        self.screen_location.read().clone()
    }

    pub fn set_screen_location(&self, polygon: Option<Polygon>) {
        *self.screen_location.write() = polygon;
    }

    // ---- quality --------------------------------------------------------

    pub fn cloud_cover(&self) -> Option<u8> {
        self.cloud_cover
    }

    pub fn quality_digits(&self) -> &[u8] {
        &self.quality
    }

    /// Worst of the quality digits, if the sensor reports any.
    pub fn quality(&self) -> Option<u8> {
        self.quality.iter().copied().min()
    }

    pub fn data_version(&self) -> Option<&str> {
        self.data_version.as_deref()
    }

    pub fn is_downloadable(&self) -> bool {
        self.downloadable
    }

    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    // ---- image ----------------------------------------------------------

    pub fn image(&self) -> Option<ImageHandle> {
        *self.image.lock()
    }

    pub fn set_image(&self, handle: ImageHandle) {
        *self.image.lock() = Some(handle);
    }

    /// Drop the image handle, returning it so the loader can free it.
    pub fn release_image(&self) -> Option<ImageHandle> {
        self.image.lock().take()
    }

    pub fn image_resolution(&self) -> Option<u32> {
        self.image().map(|img| img.resolution)
    }

    // ---- filter state ---------------------------------------------------

    pub fn filter_flags(&self) -> FilterFlags {
        FilterFlags::from_bits(self.flags.load(Ordering::Acquire))
    }

    /// True while no predicate is failing.
    pub fn is_visible(&self) -> bool {
        self.filter_flags().is_visible()
    }

    pub fn set_predicate(&self, predicate: FilterPredicate) {
        self.update_predicate(predicate, true);
    }

    pub fn clear_predicate(&self, predicate: FilterPredicate) {
        self.update_predicate(predicate, false);
    }

    fn update_predicate(&self, predicate: FilterPredicate, fails: bool) {
        let mut flags = self.filter_flags();
        flags.update(predicate, fails);
        self.flags.store(flags.bits(), Ordering::Release);
    }

    /// Hide the scene when its footprint misses `viewport`.
    pub fn filter_to_viewport(&self, viewport: Option<&Polygon>) {
        let fails = match (viewport, self.screen_location.read().as_ref()) {
            (Some(view), Some(footprint)) => !view.intersects(footprint),
            _ => false,
        };
        self.update_predicate(FilterPredicate::Viewport, fails);
    }

    /// Hide the scene when its cloud cover exceeds `max_cloud_cover`.
    pub fn filter_to_cloud_cover(&self, max_cloud_cover: u8) {
        let fails = self.cloud_cover.is_some_and(|cc| cc > max_cloud_cover);
        self.update_predicate(FilterPredicate::CloudCover, fails);
    }

    pub fn filter_to_date_range(&self, range: &DateRange) {
        self.update_predicate(FilterPredicate::DateRange, !range.contains(self.date));
    }

    /// Hide the scene when a scene list is active and does not include it.
    pub fn filter_to_scene_list(&self, list: Option<&SceneList>) {
        let fails = list.is_some_and(|l| !l.contains(&self.entity_id));
        self.update_predicate(FilterPredicate::SceneList, fails);
    }

    /// Hide the scene when its worst quality digit is below `min_quality`.
    pub fn filter_to_quality(&self, min_quality: u8) {
        let fails = self.quality().is_some_and(|q| q < min_quality);
        self.update_predicate(FilterPredicate::Quality, fails);
    }

    /// Hide the scene unless its data version is `version` or `version`
    /// is [`ALL_DATA_VERSIONS`].
    pub fn filter_to_data_version(&self, version: &str) {
        let fails = version != ALL_DATA_VERSIONS
            && self.data_version.as_deref().is_some_and(|v| v != version);
        self.update_predicate(FilterPredicate::DataVersion, fails);
    }

    pub fn filter_to_hidden(&self, hidden: &HashSet<String>) {
        self.update_predicate(FilterPredicate::Hidden, hidden.contains(&self.entity_id));
    }

    /// Hide the scene when a closed user area is active and misses it.
    pub fn filter_to_user_area(&self, area: Option<&dyn UserDefinedArea>) {
        let fails = match area {
            Some(area) if area.is_closed() => !area.intersects(self),
            _ => false,
        };
        self.update_predicate(FilterPredicate::UserArea, fails);
    }

    pub fn filter_to_grid_range(&self, range: Option<&GridRange>) {
        let fails = range.is_some_and(|r| !r.contains(self.cell));
        self.update_predicate(FilterPredicate::GridRange, fails);
    }

    pub fn filter_to_downloadable(&self, downloadable_only: bool) {
        let fails = downloadable_only && !self.downloadable;
        self.update_predicate(FilterPredicate::Downloadable, fails);
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("entity_id", &self.entity_id)
            .field("cell", &self.cell)
            .field("date", &self.date.yyyymmdd())
            .field("cloud_cover", &self.cloud_cover)
            .field("flags", &self.filter_flags())
            .finish()
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.entity_id, self.cell, self.date)
    }
}
