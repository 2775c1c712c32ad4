//! Registry of camp positions that creatures keep away from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CampPosition {
    pub x: f32,
    pub z: f32,
}

impl CampPosition {
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    pub fn distance_to(&self, x: f32, z: f32) -> f32 {
        let dx = self.x - x;
        let dz = self.z - z;
        (dx * dx + dz * dz).sqrt()
    }
}

/// Host-pushed positions plus one entry per live settlement.
///
/// Written only between ticks; `update` reads a snapshot.
#[derive(Debug, Clone, Default)]
pub struct CampRegistry {
    external: Vec<CampPosition>,
    settlements: BTreeMap<u32, CampPosition>,
}

impl CampRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the host-supplied positions.
    pub fn set_external(&mut self, positions: &[CampPosition]) {
        self.external = positions.to_vec();
    }

    pub fn set_settlement(&mut self, project_id: u32, position: CampPosition) {
        self.settlements.insert(project_id, position);
    }

    pub fn remove_settlement(&mut self, project_id: u32) {
        self.settlements.remove(&project_id);
    }

    pub fn clear_settlements(&mut self) {
        self.settlements.clear();
    }

    pub fn snapshot(&self) -> Vec<CampPosition> {
        self.external
            .iter()
            .chain(self.settlements.values())
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.external.len() + self.settlements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
