//! Lake geometry shared by terrain, creatures, and avoidance.

use serde::{Deserialize, Serialize};

/// Circular lake with a sloped shore band around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LakeConfig {
    pub center_x: f32,
    pub center_z: f32,
    pub radius: f32,
    pub depth: f32,
    pub shore_width: f32,
}

impl Default for LakeConfig {
    fn default() -> Self {
        Self {
            center_x: 25.0,
            center_z: -15.0,
            radius: 22.0,
            depth: 5.0,
            shore_width: 8.0,
        }
    }
}

impl LakeConfig {
    /// Surface height of the water. Derived, never stored.
    pub fn water_level(&self) -> f32 {
        -self.depth * 0.2
    }

    pub fn distance_to_center(&self, x: f32, z: f32) -> f32 {
        let dx = x - self.center_x;
        let dz = z - self.center_z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Signed distance to the waterline; negative inside the lake.
    pub fn distance_to_edge(&self, x: f32, z: f32) -> f32 {
        self.distance_to_center(x, z) - self.radius
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        self.distance_to_center(x, z) < self.radius
    }

    /// Outer edge of the shore band measured from the center.
    pub fn shore_outer_radius(&self) -> f32 {
        self.radius + self.shore_width
    }
}

/// Free-function form of [`LakeConfig::water_level`].
pub fn water_level(lake: &LakeConfig) -> f32 {
    lake.water_level()
}
