//! GloVis - scene browsing core for tiled satellite imagery
//!
//! This library holds the state behind a GloVis-style imagery browser: the
//! grid of tiles around the selected cell, the per-scene visibility filter,
//! the date-ordered swath traversal across tiles, the mosaic pixel layout and
//! the Z-order of displayed scenes. Windowing, image decoding and network
//! access are left to the caller through the [`grid::TileSource`],
//! [`projection::ProjectionTransform`] and [`area::UserDefinedArea`] traits.
//!
//! ```text
//!   TileSource ──► TileGrid ──► MosaicCoords ──► screen locations
//!                     │
//!                     ├──► SearchLimits ──► Scene filter flags
//!                     │
//!                     └──► SwathSceneFilter ──► next / prev date
//!                                   │
//!                                   ▼
//!                              ZOrderList ──► snapshot() ──► image loader
//! ```
//!
//! [`session::BrowseSession`] wires these together for one sensor.

pub mod area;
pub mod config;
pub mod coord;
pub mod geometry;
pub mod grid;
pub mod logging;
pub mod mosaic;
pub mod projection;
pub mod scene;
pub mod scene_list;
pub mod search;
pub mod sensor;
pub mod session;
pub mod swath;
pub mod zorder;

/// Crate version, for `--version` output and logs.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
