//! User scene lists and their persisted text format.
//!
//! A scene list is the user's shopping basket of acquisitions. It holds
//! detached copies of scenes so it survives the tile grid being rebuilt.
//!
//! # File format
//!
//! ```text
//! GloVis Scene List
//! sensor=Landsat 7 ETM+
//! LE70440342020015EDC00
//! LE70440342020031EDC00
//!
//! sensor=MOD09GA
//! MOD09GA.A2020015.h08v05
//! ```
//!
//! - The first non-blank line must be the header.
//! - `sensor=` (or `dataset=`) starts a block for that sensor.
//! - Every other non-blank line without `=` is an entity ID matching
//!   `^[\w.:-]+$`.
//! - Blank lines and unrecognised `key=value` lines are ignored.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::scene::Scene;
use crate::sensor::SensorKind;

/// First line of every scene-list file.
pub const SCENE_LIST_HEADER: &str = "GloVis Scene List";

/// Errors reading or writing scene-list files.
#[derive(Debug, Error)]
pub enum SceneListError {
    #[error("Failed to read scene list {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write scene list {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("Not a scene list: expected header '{}'", SCENE_LIST_HEADER)]
    MissingHeader,

    #[error("Line {line}: unknown sensor '{name}'")]
    UnknownSensor { line: usize, name: String },

    #[error("Line {line}: entity ID before any sensor= line")]
    MissingSensor { line: usize },

    #[error("Line {line}: invalid entity ID '{value}'")]
    InvalidEntityId { line: usize, value: String },
}

/// Result type for scene-list operations.
pub type SceneListResult<T> = Result<T, SceneListError>;

fn entity_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\w.:-]+$").unwrap())
}

/// True if `id` is a well-formed entity ID.
pub fn is_valid_entity_id(id: &str) -> bool {
    entity_id_pattern().is_match(id)
}

/// Resolves entity IDs back to scenes when a list is loaded.
pub trait SceneLookup {
    fn lookup(&self, sensor: SensorKind, entity_id: &str) -> Option<Scene>;
}

/// Entity IDs for one sensor, as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneListBlock {
    pub sensor: SensorKind,
    pub entity_ids: Vec<String>,
}

/// Parsed contents of a scene-list file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneListFile {
    pub blocks: Vec<SceneListBlock>,
}

impl SceneListFile {
    /// Parse scene-list text.
    pub fn parse(text: &str) -> SceneListResult<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty());

        match lines.next() {
            Some((_, header)) if header == SCENE_LIST_HEADER => {}
            _ => return Err(SceneListError::MissingHeader),
        }

        let mut file = SceneListFile::default();
        for (line_no, line) in lines {
            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "sensor" | "dataset" => {
                        let sensor = SensorKind::from_name(value).ok_or_else(|| {
                            SceneListError::UnknownSensor {
                                line: line_no,
                                name: value.trim().to_string(),
                            }
                        })?;
                        file.block_mut(sensor);
                    }
                    other => debug!(line = line_no, key = other, "Ignoring scene list setting"),
                }
                continue;
            }

            if !is_valid_entity_id(line) {
                return Err(SceneListError::InvalidEntityId {
                    line: line_no,
                    value: line.to_string(),
                });
            }
            let block = file
                .blocks
                .last_mut()
                .ok_or(SceneListError::MissingSensor { line: line_no })?;
            if !block.entity_ids.iter().any(|id| id == line) {
                block.entity_ids.push(line.to_string());
            }
        }

        Ok(file)
    }

    /// Read and parse a scene-list file.
    pub fn load(path: &Path) -> SceneListResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| SceneListError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Write the file to disk.
    pub fn save(&self, path: &Path) -> SceneListResult<()> {
        let write_err = |source| SceneListError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut file = fs::File::create(path).map_err(write_err)?;
        self.write_to(&mut file).map_err(write_err)?;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", SCENE_LIST_HEADER)?;
        for block in &self.blocks {
            writeln!(out, "sensor={}", block.sensor.capabilities().name)?;
            for id in &block.entity_ids {
                writeln!(out, "{}", id)?;
            }
        }
        Ok(())
    }

    /// Total number of entity IDs across all blocks.
    pub fn scene_count(&self) -> usize {
        self.blocks.iter().map(|b| b.entity_ids.len()).sum()
    }

    pub fn block(&self, sensor: SensorKind) -> Option<&SceneListBlock> {
        self.blocks.iter().find(|b| b.sensor == sensor)
    }

    /// Block for `sensor`, created at the end if missing. Repeated blocks
    /// for the same sensor are merged.
    fn block_mut(&mut self, sensor: SensorKind) -> &mut SceneListBlock {
        let index = match self.blocks.iter().position(|b| b.sensor == sensor) {
            Some(i) => {
                // Later IDs belong to this sensor, so it must be the last block.
                let block = self.blocks.remove(i);
                self.blocks.push(block);
                self.blocks.len() - 1
            }
            None => {
                self.blocks.push(SceneListBlock {
                    sensor,
                    entity_ids: Vec::new(),
                });
                self.blocks.len() - 1
            }
        };
        &mut self.blocks[index]
    }
}

/// An in-memory scene list for one sensor.
#[derive(Debug)]
pub struct SceneList {
    sensor: SensorKind,
    scenes: Vec<Arc<Scene>>,
    ids: HashSet<String>,
}

impl SceneList {
    pub fn new(sensor: SensorKind) -> Self {
        Self {
            sensor,
            scenes: Vec::new(),
            ids: HashSet::new(),
        }
    }

    pub fn sensor(&self) -> SensorKind {
        self.sensor
    }

    /// Add a detached copy of `scene`. Returns false if already present.
    pub fn add(&mut self, scene: &Scene) -> bool {
        if !self.ids.insert(scene.entity_id().to_string()) {
            return false;
        }
        self.scenes.push(Arc::new(scene.detached_copy()));
        true
    }

    pub fn remove(&mut self, entity_id: &str) -> bool {
        if !self.ids.remove(entity_id) {
            return false;
        }
        self.scenes.retain(|s| s.entity_id() != entity_id);
        true
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.ids.contains(entity_id)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn clear(&mut self) {
        self.scenes.clear();
        self.ids.clear();
    }

    /// Scenes in the order they were added.
    pub fn scenes(&self) -> &[Arc<Scene>] {
        &self.scenes
    }

    /// Persisted form of this list.
    pub fn to_block(&self) -> SceneListBlock {
        SceneListBlock {
            sensor: self.sensor,
            entity_ids: self
                .scenes
                .iter()
                .map(|s| s.entity_id().to_string())
                .collect(),
        }
    }

    /// Rebuild a list from its persisted block.
    ///
    /// Returns the list and the IDs the lookup could not resolve.
    pub fn resolve(block: &SceneListBlock, lookup: &dyn SceneLookup) -> (Self, Vec<String>) {
        let mut list = Self::new(block.sensor);
        let mut missing = Vec::new();
        for id in &block.entity_ids {
            match lookup.lookup(block.sensor, id) {
                Some(scene) => {
                    list.add(&scene);
                }
                None => {
                    warn!(sensor = %block.sensor, entity_id = %id, "Scene list entry not found");
                    missing.push(id.clone());
                }
            }
        }
        (list, missing)
    }
}
