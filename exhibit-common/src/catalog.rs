//! Clip catalog
//!
//! Ordered, immutable table of clips. A clip's id is its index in the table,
//! so ids are dense and stable for the process lifetime. The catalog is built
//! once at startup and then shared read-only (`Arc<ClipCatalog>`) by every
//! context; no synchronization is needed.

use std::collections::HashSet;
use std::ops::Index;

use crate::clip::{Clip, ClipId};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ClipCatalog {
    clips: Vec<Clip>,
    /// Background loop shown when no foreground clip is active
    default_background: ClipId,
}

impl ClipCatalog {
    /// Build a catalog, validating it
    ///
    /// Each clip's `id` is reassigned to its table position.
    pub fn new(mut clips: Vec<Clip>, default_background: ClipId) -> Result<Self> {
        if clips.is_empty() {
            return Err(Error::Catalog("catalog has no clips".to_string()));
        }

        let mut names = HashSet::new();
        for (index, clip) in clips.iter_mut().enumerate() {
            clip.id = ClipId(index);
            if clip.name.trim().is_empty() {
                return Err(Error::Catalog(format!("clip {} has an empty name", index)));
            }
            if clip.name.parse::<usize>().is_ok() {
                // Numeric names would shadow ids in `play <name|id>`
                return Err(Error::Catalog(format!(
                    "clip name '{}' must not be a number",
                    clip.name
                )));
            }
            if !names.insert(clip.name.clone()) {
                return Err(Error::Catalog(format!("duplicate clip name '{}'", clip.name)));
            }
            if let Some(bounds) = clip.bounds {
                if bounds.end_ms <= bounds.start_ms {
                    return Err(Error::Catalog(format!(
                        "clip '{}' ends ({} ms) before it starts ({} ms)",
                        clip.name, bounds.end_ms, bounds.start_ms
                    )));
                }
            }
        }

        let catalog = Self {
            clips,
            default_background,
        };

        if !catalog.is_valid_loop(default_background) {
            return Err(Error::Catalog(format!(
                "background clip {} must exist and have the loop policy",
                default_background
            )));
        }

        Ok(catalog)
    }

    pub fn lookup(&self, id: ClipId) -> Option<&Clip> {
        self.clips.get(id.index())
    }

    pub fn count(&self) -> usize {
        self.clips.len()
    }

    /// True only if `id` names a clip with the loop policy
    pub fn is_valid_loop(&self, id: ClipId) -> bool {
        self.lookup(id).map(Clip::is_loop).unwrap_or(false)
    }

    pub fn default_background(&self) -> ClipId {
        self.default_background
    }

    /// Resolve a clip by catalog name or numeric id
    ///
    /// Numeric input is returned as an id even when it is out of range; the
    /// scheduler validates ids when it drains a request.
    pub fn find(&self, name_or_id: &str) -> Option<ClipId> {
        if let Ok(id) = name_or_id.parse::<ClipId>() {
            return Some(id);
        }
        self.clips
            .iter()
            .find(|clip| clip.name == name_or_id)
            .map(|clip| clip.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clip> {
        self.clips.iter()
    }
}

/// Indexing by id panics on ids that are not in the catalog; use
/// [`ClipCatalog::lookup`] for ids that have not been validated.
impl Index<ClipId> for ClipCatalog {
    type Output = Clip;

    fn index(&self, id: ClipId) -> &Clip {
        &self.clips[id.index()]
    }
}
