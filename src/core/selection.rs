// src/core/selection.rs
use tracing::debug;

use crate::core::cube::FlowCube;
use crate::core::descriptions;
use crate::core::response::{DescriptionEntry, DescriptionMap};

/// The user-curated set of attached tool cubes plus their annotations.
///
/// Cubes are ordered and deduplicated by `id`. The description map is
/// keyed by display name and kept a subset of the display names of the
/// current cubes: detach removes the entry for the departing cube's
/// display name, and bulk replacement goes through reconciliation.
#[derive(Debug, Clone, Default)]
pub struct ToolSelection {
    cubes: Vec<FlowCube>,
    descriptions: DescriptionMap,
}

impl ToolSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cubes(&self) -> &[FlowCube] {
        &self.cubes
    }

    pub fn descriptions(&self) -> &DescriptionMap {
        &self.descriptions
    }

    pub fn len(&self) -> usize {
        self.cubes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cubes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cubes.iter().any(|c| c.id == id)
    }

    /// Display names of the attached cubes, in attach order.
    pub fn display_names(&self) -> Vec<&str> {
        self.cubes.iter().map(|c| c.display_name()).collect()
    }

    /// Appends a cube unless one with the same `id` is already attached.
    /// Duplicates are ignored silently; returns whether the cube was added.
    pub fn attach(&mut self, cube: FlowCube) -> bool {
        if self.contains(&cube.id) {
            debug!("tool '{}' already attached, ignoring", cube.display_name());
            return false;
        }
        self.cubes.push(cube);
        true
    }

    /// Removes the cube with the given id, along with the description
    /// entry keyed by its display name at time of removal. No-op when the
    /// id is not attached.
    pub fn detach(&mut self, id: &str) -> Option<FlowCube> {
        let position = self.cubes.iter().position(|c| c.id == id)?;
        let cube = self.cubes.remove(position);
        self.descriptions.remove(cube.display_name());
        Some(cube)
    }

    /// The annotation entry for one attached cube, created empty on first
    /// use. `None` when no attached cube has that display name.
    pub fn note_mut(&mut self, display_name: &str) -> Option<&mut DescriptionEntry> {
        if !self.cubes.iter().any(|c| c.display_name() == display_name) {
            return None;
        }
        Some(self.descriptions.entry(display_name.to_string()).or_default())
    }

    /// Replaces the description map, pruning entries that do not belong
    /// to a currently attached cube.
    pub fn set_descriptions(&mut self, candidate: DescriptionMap) {
        self.descriptions = descriptions::reconcile(&candidate, &self.cubes);
    }
}
