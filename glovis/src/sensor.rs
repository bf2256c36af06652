//! Sensor capability table.
//!
//! Each supported sensor family is a [`SensorKind`] variant mapped to a
//! static [`SensorCapabilities`] record. Per-sensor differences (cell
//! directory layout, browse image naming, corner-offset units, grid limits,
//! which quality fields exist) are data in that record rather than
//! overridden methods.
//!
//! # Browse image layout
//!
//! ```text
//! {base_url}/{image_dir}/{cell_dir}/{year}/{image_file}
//!
//! Landsat:  .../l7/p044/r034/2020/LE70440342020015EDC00_240.jpg
//! MODIS:    .../modis/mod09ga/h08/v05/2020/MOD09GA.A2020015.h08v05_2000.jpg
//! ```

use std::fmt;
use std::str::FromStr;

use crate::coord::{GridCell, GridRange};
use crate::scene::Scene;

/// How a grid cell maps to a directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellNaming {
    /// WRS path/row: `p044/r034`.
    PathRow,
    /// MODIS sinusoidal tile: `h08/v05`.
    ModisTile,
}

/// How a scene's browse image file is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageNaming {
    /// `{entity_id}_{resolution}.jpg`
    EntityId,
    /// `{product}.A{year}{julian}.h{col}v{row}_{resolution}.jpg`
    ProductDate { product: &'static str },
}

/// Static description of one sensor family.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorCapabilities {
    /// Human-readable sensor name.
    pub name: &'static str,
    /// Dataset name written to scene-list files.
    pub dataset: &'static str,
    /// Directory below the base URL holding this sensor's cells.
    pub image_dir: &'static str,
    /// Metres per corner-offset unit.
    pub offset_resolution: f64,
    /// Browse image resolutions in metres per pixel, finest first.
    pub resolutions: &'static [u32],
    /// Valid columns and rows of the reference grid.
    pub grid: GridRange,
    /// Whether the table of contents carries cloud cover.
    pub has_cloud_cover: bool,
    /// Number of quality digits per scene (0 = none).
    pub quality_count: usize,
    /// Selectable data versions; empty when the sensor has only one.
    pub data_versions: &'static [&'static str],
    /// Projection code of the cell geometry.
    pub projection_code: i32,
    pub cell_naming: CellNaming,
    pub image_naming: ImageNaming,
}

/// Closed set of supported sensor families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    LandsatMss,
    LandsatTm,
    LandsatEtm,
    LandsatOli,
    Aster,
    ModisTerra,
    Eo1Ali,
}

const WRS2_GRID: GridRange = GridRange::new(1, 233, 1, 248);
const WRS1_GRID: GridRange = GridRange::new(1, 251, 1, 248);
const MODIS_GRID: GridRange = GridRange::new(0, 35, 0, 17);

static LANDSAT_MSS: SensorCapabilities = SensorCapabilities {
    name: "Landsat 1-5 MSS",
    dataset: "LANDSAT_MSS",
    image_dir: "mss",
    offset_resolution: 60.0,
    resolutions: &[240, 1000],
    grid: WRS1_GRID,
    has_cloud_cover: true,
    quality_count: 0,
    data_versions: &[],
    projection_code: 1,
    cell_naming: CellNaming::PathRow,
    image_naming: ImageNaming::EntityId,
};

static LANDSAT_TM: SensorCapabilities = SensorCapabilities {
    name: "Landsat 4-5 TM",
    dataset: "LANDSAT_TM",
    image_dir: "l5",
    offset_resolution: 30.0,
    resolutions: &[240, 1000],
    grid: WRS2_GRID,
    has_cloud_cover: true,
    quality_count: 1,
    data_versions: &["L1T", "L1GT", "L1G"],
    projection_code: 1,
    cell_naming: CellNaming::PathRow,
    image_naming: ImageNaming::EntityId,
};

static LANDSAT_ETM: SensorCapabilities = SensorCapabilities {
    name: "Landsat 7 ETM+",
    dataset: "LANDSAT_ETM",
    image_dir: "l7",
    offset_resolution: 30.0,
    resolutions: &[240, 1000],
    grid: WRS2_GRID,
    has_cloud_cover: true,
    quality_count: 2,
    data_versions: &["L1T", "L1GT", "L1G"],
    projection_code: 1,
    cell_naming: CellNaming::PathRow,
    image_naming: ImageNaming::EntityId,
};

static LANDSAT_OLI: SensorCapabilities = SensorCapabilities {
    name: "Landsat 8 OLI",
    dataset: "LANDSAT_8",
    image_dir: "l8",
    offset_resolution: 30.0,
    resolutions: &[240, 1000],
    grid: WRS2_GRID,
    has_cloud_cover: true,
    quality_count: 1,
    data_versions: &["L1T", "L1GT"],
    projection_code: 1,
    cell_naming: CellNaming::PathRow,
    image_naming: ImageNaming::EntityId,
};

static ASTER: SensorCapabilities = SensorCapabilities {
    name: "ASTER",
    dataset: "ASTER_VNIR",
    image_dir: "aster",
    offset_resolution: 15.0,
    resolutions: &[155, 400, 1000],
    grid: WRS2_GRID,
    has_cloud_cover: true,
    quality_count: 0,
    data_versions: &[],
    projection_code: 1,
    cell_naming: CellNaming::PathRow,
    image_naming: ImageNaming::EntityId,
};

static MODIS_TERRA: SensorCapabilities = SensorCapabilities {
    name: "MODIS Terra Surface Reflectance",
    dataset: "MOD09GA",
    image_dir: "modis/mod09ga",
    offset_resolution: 463.312_716_528,
    resolutions: &[2000, 4000],
    grid: MODIS_GRID,
    has_cloud_cover: false,
    quality_count: 0,
    data_versions: &["005", "006"],
    projection_code: 16,
    cell_naming: CellNaming::ModisTile,
    image_naming: ImageNaming::ProductDate { product: "MOD09GA" },
};

static EO1_ALI: SensorCapabilities = SensorCapabilities {
    name: "EO-1 ALI",
    dataset: "EO1_ALI",
    image_dir: "eo1/ali",
    offset_resolution: 30.0,
    resolutions: &[240, 1000],
    grid: WRS2_GRID,
    has_cloud_cover: true,
    quality_count: 0,
    data_versions: &[],
    projection_code: 1,
    cell_naming: CellNaming::PathRow,
    image_naming: ImageNaming::EntityId,
};

impl SensorKind {
    /// Every supported sensor.
    pub const ALL: [SensorKind; 7] = [
        SensorKind::LandsatMss,
        SensorKind::LandsatTm,
        SensorKind::LandsatEtm,
        SensorKind::LandsatOli,
        SensorKind::Aster,
        SensorKind::ModisTerra,
        SensorKind::Eo1Ali,
    ];

    pub fn capabilities(self) -> &'static SensorCapabilities {
        match self {
            SensorKind::LandsatMss => &LANDSAT_MSS,
            SensorKind::LandsatTm => &LANDSAT_TM,
            SensorKind::LandsatEtm => &LANDSAT_ETM,
            SensorKind::LandsatOli => &LANDSAT_OLI,
            SensorKind::Aster => &ASTER,
            SensorKind::ModisTerra => &MODIS_TERRA,
            SensorKind::Eo1Ali => &EO1_ALI,
        }
    }

    /// Look a sensor up by display name or dataset name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|s| {
            let caps = s.capabilities();
            caps.name.eq_ignore_ascii_case(name) || caps.dataset.eq_ignore_ascii_case(name)
        })
    }

    pub fn offset_resolution(self) -> f64 {
        self.capabilities().offset_resolution
    }

    /// Coarsest browse resolution, used to size the full mosaic.
    pub fn lowest_resolution(self) -> u32 {
        self.capabilities()
            .resolutions
            .iter()
            .copied()
            .max()
            .unwrap_or(1000)
    }

    /// Finest browse resolution, used for single-cell display.
    pub fn highest_resolution(self) -> u32 {
        self.capabilities()
            .resolutions
            .iter()
            .copied()
            .min()
            .unwrap_or(1000)
    }

    pub fn contains_cell(self, cell: GridCell) -> bool {
        self.capabilities().grid.contains(cell)
    }

    /// Directory for one grid cell, relative to the sensor's image directory.
    pub fn cell_directory(self, cell: GridCell) -> String {
        match self.capabilities().cell_naming {
            CellNaming::PathRow => format!("p{:03}/r{:03}", cell.col, cell.row),
            CellNaming::ModisTile => format!("h{:02}/v{:02}", cell.col, cell.row),
        }
    }

    /// Browse image file name for a scene at the given resolution.
    pub fn image_file_name(self, scene: &Scene, resolution: u32) -> String {
        match self.capabilities().image_naming {
            ImageNaming::EntityId => format!("{}_{}.jpg", scene.entity_id(), resolution),
            ImageNaming::ProductDate { product } => {
                let cell = scene.cell();
                format!(
                    "{}.A{}{:03}.h{:02}v{:02}_{}.jpg",
                    product,
                    scene.year(),
                    scene.julian_day(),
                    cell.col,
                    cell.row,
                    resolution
                )
            }
        }
    }

    /// Full browse image URL for a scene.
    pub fn image_url(self, base_url: &str, scene: &Scene, resolution: u32) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            base_url.trim_end_matches('/'),
            self.capabilities().image_dir,
            self.cell_directory(scene.cell()),
            scene.year(),
            self.image_file_name(scene, resolution)
        )
    }

    /// URL of a cell's table of contents.
    pub fn toc_url(self, base_url: &str, cell: GridCell) -> String {
        format!(
            "{}/{}/{}/TOC",
            base_url.trim_end_matches('/'),
            self.capabilities().image_dir,
            self.cell_directory(cell)
        )
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.capabilities().name)
    }
}

impl FromStr for SensorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown sensor '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::AcquisitionDate;

    fn landsat_scene() -> Scene {
        Scene::new(
            "LE70440342020015EDC00",
            GridCell::new(44, 34),
            AcquisitionDate::from_yyyymmdd(20200115).unwrap(),
        )
    }

    #[test]
    fn test_from_name_matches_display_and_dataset() {
        assert_eq!(
            SensorKind::from_name("Landsat 7 ETM+"),
            Some(SensorKind::LandsatEtm)
        );
        assert_eq!(
            SensorKind::from_name("landsat_etm"),
            Some(SensorKind::LandsatEtm)
        );
        assert_eq!(SensorKind::from_name("MOD09GA"), Some(SensorKind::ModisTerra));
        assert_eq!(SensorKind::from_name("SPOT"), None);
    }

    #[test]
    fn test_names_are_unique() {
        for a in SensorKind::ALL {
            for b in SensorKind::ALL {
                if a != b {
                    assert_ne!(a.capabilities().dataset, b.capabilities().dataset);
                    assert_ne!(a.capabilities().name, b.capabilities().name);
                }
            }
        }
    }

    #[test]
    fn test_cell_directory() {
        let cell = GridCell::new(8, 5);
        assert_eq!(SensorKind::LandsatEtm.cell_directory(cell), "p008/r005");
        assert_eq!(SensorKind::ModisTerra.cell_directory(cell), "h08/v05");
    }

    #[test]
    fn test_landsat_image_url() {
        let url = SensorKind::LandsatEtm.image_url("https://glovis.example/", &landsat_scene(), 240);
        assert_eq!(
            url,
            "https://glovis.example/l7/p044/r034/2020/LE70440342020015EDC00_240.jpg"
        );
    }

    #[test]
    fn test_modis_image_name() {
        let scene = Scene::new(
            "MOD09GA.A2020015.h08v05",
            GridCell::new(8, 5),
            AcquisitionDate::from_yyyymmdd(20200115).unwrap(),
        );
        assert_eq!(
            SensorKind::ModisTerra.image_file_name(&scene, 2000),
            "MOD09GA.A2020015.h08v05_2000.jpg"
        );
    }

    #[test]
    fn test_resolutions() {
        assert_eq!(SensorKind::LandsatEtm.lowest_resolution(), 1000);
        assert_eq!(SensorKind::LandsatEtm.highest_resolution(), 240);
        assert_eq!(SensorKind::Aster.highest_resolution(), 155);
    }

    #[test]
    fn test_contains_cell() {
        assert!(SensorKind::LandsatTm.contains_cell(GridCell::new(233, 248)));
        assert!(!SensorKind::LandsatTm.contains_cell(GridCell::new(234, 1)));
        assert!(!SensorKind::ModisTerra.contains_cell(GridCell::new(8, 18)));
    }

    #[test]
    fn test_toc_url() {
        assert_eq!(
            SensorKind::LandsatOli.toc_url("https://glovis.example", GridCell::new(1, 2)),
            "https://glovis.example/l8/p001/r002/TOC"
        );
    }
}
