//! Scene metadata and the per-scene visibility filter.
//!
//! A [`Scene`] is one dated acquisition at one grid cell. Scenes are owned by
//! the [`crate::grid::Tile`] covering their cell and shared as `Arc<Scene>`
//! with the Z-order list and any snapshot handed to an image loader.
//!
//! # Visibility
//!
//! Visibility is the conjunction of ten independent predicates, one bit each
//! in a [`FilterFlags`] word. Each `Scene::filter_to_*` call re-evaluates
//! exactly one predicate:
//!
//! ```text
//! filter_to_cloud_cover(30) ──► CloudCover bit ─┐
//! filter_to_date_range(..)  ──► DateRange bit  ─┼──► flags == 0 ──► visible
//! filter_to_quality(5)      ──► Quality bit    ─┘
//! ```
//!
//! Predicates whose input the sensor does not report (no cloud cover, no
//! quality digits) always pass.

mod date;
mod filter;
mod metadata;

pub use date::{AcquisitionDate, DateError, DateRange};
pub use filter::{FilterFlags, FilterPredicate};
pub use metadata::{CornerOffset, ImageHandle, Scene, ALL_DATA_VERSIONS};
