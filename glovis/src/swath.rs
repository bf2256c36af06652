//! Date-ordered traversal across every tile of the grid.
//!
//! A satellite images adjacent cells along its orbital swath on the same
//! day. Stepping "next date" from one scene should therefore be able to
//! cross tile boundaries. [`SwathSceneFilter`] merges the date-sorted scene
//! lists of all valid tiles into one ordering, then keeps a navigable
//! `[first, last]` window over the scenes that pass the active filters.
//!
//! ```text
//!            build()              filter()
//!  Unbuilt ───────────► Built ───────────► Filtered
//!     ▲                   │  ◄──build()──     │ ▲
//!     └── reset() ────────┘                   └─┘ filter()
//! ```
//!
//! Navigation calls take the scene currently on display. The stored cursor
//! is only a hint: it is re-synchronised against that scene by a linear
//! scan before every step.

use std::sync::Arc;

use tracing::debug;

use crate::area::UserDefinedArea;
use crate::coord::GridCell;
use crate::grid::{Tile, TileGrid};
use crate::scene::{AcquisitionDate, Scene};

/// One position in the swath ordering.
#[derive(Debug, Clone)]
pub struct SwathEntry {
    cell: GridCell,
    date_index: usize,
    scene: Arc<Scene>,
}

impl SwathEntry {
    pub fn cell(&self) -> GridCell {
        self.cell
    }

    /// Index of the scene within its tile's date-sorted list.
    pub fn date_index(&self) -> usize {
        self.date_index
    }

    /// Packed `(col, row)` key of the owning tile.
    pub fn tile_key(&self) -> u32 {
        self.cell.packed()
    }

    pub fn scene(&self) -> &Arc<Scene> {
        &self.scene
    }
}

/// Which scenes navigation may stop on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwathMode {
    /// Only scenes of one cell (single-scene display).
    SelectedCell(GridCell),
    /// Any visible scene (full mosaic display).
    AnyVisible,
    /// Any visible scene; the caller swaps it into its tile's slot.
    OnePerTile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwathState {
    Unbuilt,
    Built,
    Filtered,
}

/// Swath ordering plus the filtered navigation window.
pub struct SwathSceneFilter {
    entries: Vec<SwathEntry>,
    state: SwathState,
    cursor: usize,
    range: Option<(usize, usize)>,
    mode: SwathMode,
    area: Option<Arc<dyn UserDefinedArea>>,
}

impl Default for SwathSceneFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SwathSceneFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwathSceneFilter")
            .field("entries", &self.entries.len())
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .field("range", &self.range)
            .field("mode", &self.mode)
            .field("area", &self.area.is_some())
            .finish()
    }
}

impl SwathSceneFilter {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            state: SwathState::Unbuilt,
            cursor: 0,
            range: None,
            mode: SwathMode::AnyVisible,
            area: None,
        }
    }

    /// Drop the ordering and return to `Unbuilt`.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.state = SwathState::Unbuilt;
        self.cursor = 0;
        self.range = None;
    }

    /// Merge every valid tile's scenes into one date-ordered list.
    ///
    /// Each round picks the earliest unconsumed scene over all tiles. On
    /// equal dates the scene with the greater projection Y (further north)
    /// wins, then the earlier tile in row-major order. The window covers the
    /// whole ordering until [`filter`](Self::filter) narrows it.
    pub fn build(&mut self, grid: &TileGrid) {
        let tiles: Vec<&Tile> = grid.valid_tiles().collect();
        let mut next = vec![0usize; tiles.len()];
        let mut entries = Vec::with_capacity(grid.total_scenes());

        loop {
            let mut best: Option<(usize, &Arc<Scene>)> = None;
            for (t, tile) in tiles.iter().enumerate() {
                let Some(candidate) = tile.scene(next[t]) else {
                    continue;
                };
                let better = match best {
                    None => true,
                    Some((_, current)) => precedes(candidate, current),
                };
                if better {
                    best = Some((t, candidate));
                }
            }

            let Some((t, scene)) = best else {
                break;
            };
            entries.push(SwathEntry {
                cell: tiles[t].cell(),
                date_index: next[t],
                scene: Arc::clone(scene),
            });
            next[t] += 1;
        }

        self.entries = entries;
        self.cursor = 0;
        self.range = if self.entries.is_empty() {
            None
        } else {
            Some((0, self.entries.len() - 1))
        };
        self.mode = SwathMode::AnyVisible;
        self.state = SwathState::Built;
        debug!(
            scenes = self.entries.len(),
            tiles = tiles.len(),
            "Swath ordering built"
        );
    }

    /// Recompute the navigable window for `mode`.
    ///
    /// The window runs from the first to the last qualifying scene. Scenes
    /// outside it are not reachable by stepping even if they qualify later.
    /// A closed `area` additionally requires scenes to intersect it.
    pub fn filter(&mut self, mode: SwathMode, area: Option<Arc<dyn UserDefinedArea>>) {
        if self.state == SwathState::Unbuilt {
            debug!("Swath filter requested before build");
            return;
        }
        self.mode = mode;
        self.area = area;

        let first = self.entries.iter().position(|e| self.qualifies(&e.scene));
        let last = self.entries.iter().rposition(|e| self.qualifies(&e.scene));
        self.range = first.zip(last);
        self.state = SwathState::Filtered;
        debug!(mode = ?mode, range = ?self.range, "Swath filtered");
    }

    pub fn state(&self) -> SwathState {
        self.state
    }

    pub fn mode(&self) -> SwathMode {
        self.mode
    }

    pub fn entries(&self) -> &[SwathEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inclusive navigable window, `None` when nothing qualifies.
    pub fn range(&self) -> Option<(usize, usize)> {
        self.range
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Step to the next qualifying scene after `current`.
    pub fn next_date(&mut self, current: Option<&Arc<Scene>>) -> Option<Arc<Scene>> {
        let (first, last) = self.sync(current)?;
        let mut i = self.cursor;
        while i < last {
            i += 1;
            if i >= first && self.qualifies(&self.entries[i].scene) {
                return Some(self.move_to(i));
            }
        }
        None
    }

    /// Step to the previous qualifying scene before `current`.
    pub fn prev_date(&mut self, current: Option<&Arc<Scene>>) -> Option<Arc<Scene>> {
        let (first, last) = self.sync(current)?;
        let mut i = self.cursor;
        while i > first {
            i -= 1;
            if i <= last && self.qualifies(&self.entries[i].scene) {
                return Some(self.move_to(i));
            }
        }
        None
    }

    /// Jump to the first qualifying scene acquired on or after the first
    /// day of `year`/`month` (calendar month, 1-12).
    ///
    /// Falls back to the last qualifying scene when every scene is older.
    pub fn goto_date(
        &mut self,
        current: Option<&Arc<Scene>>,
        year: i32,
        month: u32,
    ) -> Option<Arc<Scene>> {
        let target = AcquisitionDate::from_ymd(year, month, 1)?;
        let (first, last) = self.sync(current)?;

        let hit = (first..=last).find(|&i| {
            let scene = &self.entries[i].scene;
            scene.date() >= target && self.qualifies(scene)
        });
        let fallback = || {
            (first..=last)
                .rev()
                .find(|&i| self.qualifies(&self.entries[i].scene))
        };
        let index = hit.or_else(fallback)?;
        Some(self.move_to(index))
    }

    pub fn goto_first_date(&mut self, current: Option<&Arc<Scene>>) -> Option<Arc<Scene>> {
        let (first, last) = self.sync(current)?;
        let index = (first..=last).find(|&i| self.qualifies(&self.entries[i].scene))?;
        Some(self.move_to(index))
    }

    pub fn goto_last_date(&mut self, current: Option<&Arc<Scene>>) -> Option<Arc<Scene>> {
        let (first, last) = self.sync(current)?;
        let index = (first..=last)
            .rev()
            .find(|&i| self.qualifies(&self.entries[i].scene))?;
        Some(self.move_to(index))
    }

    /// True if [`next_date`](Self::next_date) could move.
    pub fn is_next_date_available(&mut self, current: Option<&Arc<Scene>>) -> bool {
        match self.sync(current) {
            Some((_, last)) => self.cursor < last,
            None => false,
        }
    }

    /// True if [`prev_date`](Self::prev_date) could move.
    pub fn is_prev_date_available(&mut self, current: Option<&Arc<Scene>>) -> bool {
        match self.sync(current) {
            Some((first, _)) => self.cursor > first,
            None => false,
        }
    }

    fn move_to(&mut self, index: usize) -> Arc<Scene> {
        self.cursor = index;
        Arc::clone(&self.entries[index].scene)
    }

    /// Point the cursor at `current` and return the window.
    fn sync(&mut self, current: Option<&Arc<Scene>>) -> Option<(usize, usize)> {
        if self.state == SwathState::Unbuilt {
            return None;
        }
        if let Some(current) = current {
            let at_cursor = self
                .entries
                .get(self.cursor)
                .is_some_and(|e| Arc::ptr_eq(&e.scene, current));
            if !at_cursor {
                let found = self
                    .entries
                    .iter()
                    .position(|e| Arc::ptr_eq(&e.scene, current))
                    .or_else(|| {
                        self.entries.iter().position(|e| {
                            e.cell == current.cell() && e.scene.entity_id() == current.entity_id()
                        })
                    });
                if let Some(i) = found {
                    self.cursor = i;
                }
            }
        }
        self.range
    }

    fn qualifies(&self, scene: &Scene) -> bool {
        if !scene.is_visible() {
            return false;
        }
        if let Some(area) = &self.area {
            if area.is_closed() && !area.intersects(scene) {
                return false;
            }
        }
        match self.mode {
            SwathMode::SelectedCell(cell) => scene.cell() == cell,
            SwathMode::AnyVisible | SwathMode::OnePerTile => true,
        }
    }
}

/// Merge order: earlier date first, then further north.
fn precedes(a: &Scene, b: &Scene) -> bool {
    match a.date().cmp(&b.date()) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => a.upper_left().y > b.upper_left().y,
    }
}
