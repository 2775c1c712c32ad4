//! Terrain height field and forest density.
//!
//! Height is a pure function of `(x, z)`, the [`LakeConfig`] and the
//! [`TerrainParams`]. Three FBM layers (broad hills, base terrain, fine
//! detail) are summed over a positive baseline, then reshaped by distance to
//! the lake center:
//!
//! | Zone | Distance `d` | Shape |
//! |------|--------------|-------|
//! | lake | `d < R` | bowl, deepest at the center, plus lakebed noise that vanishes at the waterline |
//! | shore | `R <= d < R + S` | smoothstep from the water level up to the depressed terrain |
//! | basin | `d >= R + S` | terrain pulled toward the water level, fading out over `R * basin_width_factor` |
//!
//! Each zone evaluates to the same value as its neighbour on the shared
//! boundary, so the field is continuous everywhere.

use serde::{Deserialize, Serialize};

use crate::lake::LakeConfig;
use crate::noise::{fbm, perlin_2d};

/// Tuning constants for the height field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub hill_scale: f32,
    pub hill_amplitude: f32,
    pub base_scale: f32,
    pub base_amplitude: f32,
    pub detail_scale: f32,
    pub detail_amplitude: f32,
    /// Height added to every sample before lake shaping.
    pub baseline: f32,
    /// Width of the basin beyond the shore, as a multiple of the lake radius.
    pub basin_width_factor: f32,
    /// Fraction of the above-water height removed at the shore's outer edge.
    pub basin_depression: f32,
    pub lakebed_noise: f32,
    /// Terrain spans `[-half_extent, half_extent]` on both axes.
    pub half_extent: f32,
    pub forest_scale: f32,
    /// Distance beyond the shore over which forest fades in.
    pub forest_fade_margin: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            hill_scale: 0.012,
            hill_amplitude: 5.0,
            base_scale: 0.035,
            base_amplitude: 1.8,
            detail_scale: 0.12,
            detail_amplitude: 0.35,
            baseline: 2.5,
            basin_width_factor: 1.5,
            basin_depression: 0.35,
            lakebed_noise: 0.25,
            half_extent: 100.0,
            forest_scale: 0.025,
            forest_fade_margin: 10.0,
        }
    }
}

/// Hermite smoothstep of `t` clamped to [0, 1].
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Unshaped terrain: the three FBM layers over the baseline.
pub fn raw_height(x: f32, z: f32, params: &TerrainParams) -> f32 {
    let hills = (fbm(x, z, 2, 0.5, 2.0, params.hill_scale) + 1.0) * 0.5 * params.hill_amplitude;
    let base = fbm(x, z, 4, 0.5, 2.0, params.base_scale) * params.base_amplitude;
    let detail = fbm(x, z, 2, 0.5, 2.0, params.detail_scale) * params.detail_amplitude;
    params.baseline + hills + base + detail
}

/// Terrain height at `(x, z)`.
pub fn height(x: f32, z: f32, lake: &LakeConfig, params: &TerrainParams) -> f32 {
    let water = lake.water_level();
    let d = lake.distance_to_center(x, z);

    if d < lake.radius {
        let t = if lake.radius > 0.0 { d / lake.radius } else { 1.0 };
        let bowl = water - lake.depth * (1.0 - t * t);
        let bed = perlin_2d(x * 0.15, z * 0.15) * params.lakebed_noise * (1.0 - t);
        return bowl + bed;
    }

    let raw = raw_height(x, z, params);
    let outer = lake.shore_outer_radius();

    if d < outer {
        let t = if lake.shore_width > 0.0 {
            smoothstep((d - lake.radius) / lake.shore_width)
        } else {
            1.0
        };
        let depressed = water + (raw - water) * (1.0 - params.basin_depression);
        return water + (depressed - water) * t;
    }

    let basin_width = lake.radius * params.basin_width_factor;
    let fade = if basin_width > 0.0 {
        smoothstep((d - outer) / basin_width)
    } else {
        1.0
    };
    let keep = 1.0 - params.basin_depression * (1.0 - fade);
    water + (raw - water) * keep
}

/// Forest density in [0, 1]. Zero over the lake and shore band.
pub fn forest_density(x: f32, z: f32, lake: &LakeConfig, params: &TerrainParams) -> f32 {
    let d = lake.distance_to_center(x, z);
    let outer = lake.shore_outer_radius();
    if d < outer {
        return 0.0;
    }
    let n = fbm(x + 1000.0, z - 1000.0, 3, 0.5, 2.0, params.forest_scale);
    let density = (0.5 + n * 1.2).clamp(0.0, 1.0);
    let fade = if params.forest_fade_margin > 0.0 {
        smoothstep((d - outer) / params.forest_fade_margin)
    } else {
        1.0
    };
    density * fade
}

/// Height source consumed by the creature engine.
pub trait TerrainSource: Send + Sync {
    fn height(&self, x: f32, z: f32) -> f32;

    /// Forest density in [0, 1], if this source models forest.
    fn forest_density(&self, _x: f32, _z: f32) -> Option<f32> {
        None
    }

    fn half_extent(&self) -> f32;

    /// True when `(x, z)` lies at least `margin` inside the terrain edge.
    fn in_bounds(&self, x: f32, z: f32, margin: f32) -> bool {
        let limit = self.half_extent() - margin;
        x.abs() <= limit && z.abs() <= limit
    }
}

/// The procedural height field bound to one lake.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    pub lake: LakeConfig,
    pub params: TerrainParams,
}

impl Terrain {
    pub fn new(lake: LakeConfig, params: TerrainParams) -> Self {
        Self { lake, params }
    }
}

impl TerrainSource for Terrain {
    fn height(&self, x: f32, z: f32) -> f32 {
        height(x, z, &self.lake, &self.params)
    }

    fn forest_density(&self, x: f32, z: f32) -> Option<f32> {
        Some(forest_density(x, z, &self.lake, &self.params))
    }

    fn half_extent(&self) -> f32 {
        self.params.half_extent
    }
}
