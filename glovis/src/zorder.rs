//! Front-to-back paint and selection order of displayed scenes.
//!
//! The list is a doubly-linked list stored in an arena: nodes live in a
//! `Vec` and link to each other by index. Nodes released by [`ZOrderList::empty`]
//! go onto a free-index stack and are reused before the arena grows, so
//! re-stacking on every mouse click does not allocate.
//!
//! ```text
//!   head                                   tail
//!    │                                      │
//!    ▼                                      ▼
//!  ┌────┐ next ┌────┐ next ┌────┐ next    ┌────┐
//!  │ #3 │─────►│ #0 │─────►│ #5 │─ ··· ──►│ #1 │
//!  │    │◄─────│    │◄─────│    │◄─ ··· ──│    │
//!  └────┘ prev └────┘ prev └────┘         └────┘
//!
//!  free: [#2, #4]
//! ```
//!
//! # Node identity
//!
//! In multi-scene mode each node holds a distinct scene (compared by
//! identity). In single-scene mode each node stands for a grid cell: only
//! one date per cell can be stacked, and promoting another date of the
//! same cell replaces the node's scene.
//!
//! The list is not synchronised. A consumer on another thread should work
//! from [`ZOrderList::snapshot`].

use std::sync::Arc;

use tracing::error;

use crate::scene::Scene;

#[derive(Debug)]
struct Node {
    scene: Option<Arc<Scene>>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Arena-backed doubly-linked Z-order list.
#[derive(Debug, Default)]
pub struct ZOrderList {
    nodes: Vec<Node>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    cursor: Option<usize>,
    len: usize,
    single_scene_mode: bool,
}

impl ZOrderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch node identity between per-scene and per-cell.
    ///
    /// Owned by the mosaic view; the list never changes it itself.
    pub fn set_single_scene_mode(&mut self, single: bool) {
        self.single_scene_mode = single;
    }

    pub fn is_single_scene_mode(&self) -> bool {
        self.single_scene_mode
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Nodes ever allocated, in use or on the free list.
    pub fn allocated_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Move `scene` to the front, inserting it if absent.
    pub fn put_on_top(&mut self, scene: &Arc<Scene>) {
        let index = match self.find(scene) {
            Some(index) => {
                if self.head == Some(index) {
                    self.nodes[index].scene = Some(Arc::clone(scene));
                    return;
                }
                self.unlink(index);
                index
            }
            None => self.allocate(scene),
        };
        self.nodes[index].scene = Some(Arc::clone(scene));
        self.link_front(index);
    }

    /// Move `scene` to the back, inserting it if absent.
    pub fn put_on_bottom(&mut self, scene: &Arc<Scene>) {
        let index = match self.find(scene) {
            Some(index) => {
                if self.tail == Some(index) {
                    self.nodes[index].scene = Some(Arc::clone(scene));
                    return;
                }
                self.unlink(index);
                index
            }
            None => self.allocate(scene),
        };
        self.nodes[index].scene = Some(Arc::clone(scene));
        self.link_back(index);
    }

    /// Replace the scene stacked for `scene`'s cell without moving it.
    ///
    /// Single-scene mode only. Returns false if the cell is not stacked.
    pub fn change_scene(&mut self, scene: &Arc<Scene>) -> bool {
        debug_assert!(
            self.single_scene_mode,
            "change_scene requires single-scene mode"
        );
        if !self.single_scene_mode {
            error!(scene = %scene, "change_scene called in multi-scene mode");
            return false;
        }
        match self.find(scene) {
            Some(index) => {
                self.nodes[index].scene = Some(Arc::clone(scene));
                true
            }
            None => false,
        }
    }

    /// Insert keeping the list sorted by ascending cloud cover.
    ///
    /// Assumes the list is already sorted and `scene` is not in it. Used to
    /// populate a full mosaic, so only valid in multi-scene mode. Scenes
    /// without cloud cover sort as clear.
    pub fn insert_by_cloud_cover(&mut self, scene: &Arc<Scene>) {
        debug_assert!(
            !self.single_scene_mode,
            "insert_by_cloud_cover requires multi-scene mode"
        );
        if self.single_scene_mode {
            error!(scene = %scene, "insert_by_cloud_cover called in single-scene mode");
            return;
        }

        let cloud = scene.cloud_cover().unwrap_or(0);
        let mut at = self.head;
        while let Some(i) = at {
            let node_cloud = self.nodes[i]
                .scene
                .as_ref()
                .and_then(|s| s.cloud_cover())
                .unwrap_or(0);
            if node_cloud > cloud {
                break;
            }
            at = self.nodes[i].next;
        }

        let index = self.allocate(scene);
        match at {
            Some(before) => self.link_before(index, before),
            None => self.link_back(index),
        }
    }

    /// Remove `scene` (or its cell's node in single-scene mode).
    pub fn remove(&mut self, scene: &Arc<Scene>) -> bool {
        match self.find(scene) {
            Some(index) => {
                if self.cursor == Some(index) {
                    self.cursor = None;
                }
                self.unlink(index);
                self.release(index);
                true
            }
            None => false,
        }
    }

    /// True if `scene` (or its cell in single-scene mode) is stacked.
    pub fn contains(&self, scene: &Arc<Scene>) -> bool {
        self.find(scene).is_some()
    }

    /// Front-to-back copy of the stacked scenes.
    ///
    /// The returned vector is independent of the list.
    pub fn snapshot(&self) -> Vec<Arc<Scene>> {
        self.iter().cloned().collect()
    }

    /// Front-to-back iterator over the stacked scenes.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            next: self.head,
        }
    }

    /// Reset the cursor to the front and return that scene.
    pub fn top(&mut self) -> Option<Arc<Scene>> {
        self.cursor = self.head;
        self.cursor_scene()
    }

    /// Advance the cursor towards the back.
    pub fn down(&mut self) -> Option<Arc<Scene>> {
        self.cursor = self.cursor.and_then(|i| self.nodes[i].next);
        self.cursor_scene()
    }

    /// Reset the cursor to the back and return that scene.
    pub fn bottom(&mut self) -> Option<Arc<Scene>> {
        self.cursor = self.tail;
        self.cursor_scene()
    }

    /// Advance the cursor towards the front.
    pub fn up(&mut self) -> Option<Arc<Scene>> {
        self.cursor = self.cursor.and_then(|i| self.nodes[i].prev);
        self.cursor_scene()
    }

    /// Front-most scene, without touching the cursor.
    pub fn front(&self) -> Option<&Arc<Scene>> {
        self.head.and_then(|i| self.nodes[i].scene.as_ref())
    }

    /// Drop every scene reference and return all nodes to the free list.
    pub fn empty(&mut self) {
        let mut at = self.head;
        while let Some(i) = at {
            at = self.nodes[i].next;
            self.release(i);
        }
        self.head = None;
        self.tail = None;
        self.cursor = None;
        self.len = 0;
    }

    fn cursor_scene(&self) -> Option<Arc<Scene>> {
        self.cursor.and_then(|i| self.nodes[i].scene.clone())
    }

    fn matches(&self, stored: &Arc<Scene>, scene: &Arc<Scene>) -> bool {
        if self.single_scene_mode {
            stored.cell() == scene.cell()
        } else {
            Arc::ptr_eq(stored, scene)
        }
    }

    fn find(&self, scene: &Arc<Scene>) -> Option<usize> {
        let mut at = self.head;
        while let Some(i) = at {
            if let Some(stored) = &self.nodes[i].scene {
                if self.matches(stored, scene) {
                    return Some(i);
                }
            }
            at = self.nodes[i].next;
        }
        None
    }

    fn allocate(&mut self, scene: &Arc<Scene>) -> usize {
        let node = Node {
            scene: Some(Arc::clone(scene)),
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(i) => {
                self.nodes[i] = node;
                i
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, index: usize) {
        let node = &mut self.nodes[index];
        node.scene = None;
        node.prev = None;
        node.next = None;
        self.free.push(index);
    }

    fn unlink(&mut self, index: usize) {
        let (prev, next) = (self.nodes[index].prev, self.nodes[index].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[index].prev = None;
        self.nodes[index].next = None;
        self.len -= 1;
    }

    fn link_front(&mut self, index: usize) {
        self.nodes[index].prev = None;
        self.nodes[index].next = self.head;
        match self.head {
            Some(h) => self.nodes[h].prev = Some(index),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
        self.len += 1;
    }

    fn link_back(&mut self, index: usize) {
        self.nodes[index].next = None;
        self.nodes[index].prev = self.tail;
        match self.tail {
            Some(t) => self.nodes[t].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
    }

    fn link_before(&mut self, index: usize, before: usize) {
        let prev = self.nodes[before].prev;
        self.nodes[index].prev = prev;
        self.nodes[index].next = Some(before);
        self.nodes[before].prev = Some(index);
        match prev {
            Some(p) => self.nodes[p].next = Some(index),
            None => self.head = Some(index),
        }
        self.len += 1;
    }
}

/// Front-to-back iterator returned by [`ZOrderList::iter`].
pub struct Iter<'a> {
    list: &'a ZOrderList,
    next: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Arc<Scene>;

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.next?;
        let node = &self.list.nodes[i];
        self.next = node.next;
        node.scene.as_ref()
    }
}
