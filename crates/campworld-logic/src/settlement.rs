//! Settlement layout generation.
//!
//! A project's settlement is the **full potential** set of structure
//! placements for that project. Progress never changes where anything goes.
//! It only decides which slots are visible. Every slot carries the
//! completed-task count at which it appears (`min_tasks_threshold`), and the
//! caller filters on it.
//!
//! Generation order (all draws come from one [`SeededRandom`] seeded with
//! `project_id * 31337 + 12345`):
//!
//! 1. Campfire anchor at the origin with a random facing.
//! 2. Tents along an arc, facing the campfire.
//! 3. Crates, then rocks, scattered in radius bands.
//! 4. Torches on the side opposite the tents.
//! 5. One log bench near the fire, facing it.
//!
//! Each structure is retried up to its placement budget until it clears the
//! pairwise spacing test, and is omitted if it never does.

use std::f32::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::rng::SeededRandom;

/// Seed used for ghost/placeholder layouts that belong to no project.
pub const PREVIEW_SEED: u32 = 42;

/// Structure kinds a settlement can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Campfire,
    Tent,
    Crate,
    Rock,
    Torch,
    LogBench,
}

impl AssetType {
    pub const ALL: [AssetType; 6] = [
        AssetType::Campfire,
        AssetType::Tent,
        AssetType::Crate,
        AssetType::Rock,
        AssetType::Torch,
        AssetType::LogBench,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AssetType::Campfire => "campfire",
            AssetType::Tent => "tent",
            AssetType::Crate => "crate",
            AssetType::Rock => "rock",
            AssetType::Torch => "torch",
            AssetType::LogBench => "log_bench",
        }
    }

    /// Completed-task counts at which each successive instance unlocks.
    pub fn breakpoints(&self) -> &'static [u32] {
        match self {
            AssetType::Campfire => &[0],
            AssetType::Tent => &[0, 3, 8, 15, 25],
            AssetType::Crate => &[0, 2, 6, 12],
            AssetType::Rock => &[0, 0, 5, 18],
            AssetType::Torch => &[4, 10, 20],
            AssetType::LogBench => &[7],
        }
    }

    /// Footprint used by the spacing test.
    pub fn spacing(&self) -> f32 {
        match self {
            AssetType::Campfire => 3.0,
            AssetType::Tent => 3.5,
            AssetType::Crate => 1.2,
            AssetType::Rock => 1.0,
            AssetType::Torch => 1.5,
            AssetType::LogBench => 2.0,
        }
    }
}

/// Minimum center distance between two structures.
///
/// Rocks may touch rocks and crates may touch crates; every other pair keeps
/// the larger of the two footprints.
pub fn min_spacing(a: AssetType, b: AssetType) -> f32 {
    match (a, b) {
        (AssetType::Rock, AssetType::Rock) | (AssetType::Crate, AssetType::Crate) => 0.0,
        _ => a.spacing().max(b.spacing()),
    }
}

/// Number of instances of `asset` visible at `completed_tasks`.
pub fn asset_count(asset: AssetType, completed_tasks: u32) -> usize {
    asset
        .breakpoints()
        .iter()
        .filter(|&&b| b <= completed_tasks)
        .count()
}

/// Visible instance count for every asset type.
pub fn asset_counts(completed_tasks: u32) -> Vec<(AssetType, usize)> {
    AssetType::ALL
        .iter()
        .map(|&a| (a, asset_count(a, completed_tasks)))
        .collect()
}

/// Coarse growth stage of a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementLevel {
    Campsite,
    Camp,
    Hamlet,
    Village,
}

pub fn settlement_level(completed_tasks: u32) -> SettlementLevel {
    match completed_tasks {
        0..=2 => SettlementLevel::Campsite,
        3..=7 => SettlementLevel::Camp,
        8..=14 => SettlementLevel::Hamlet,
        _ => SettlementLevel::Village,
    }
}

/// One potential structure placement, relative to the settlement anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementSlot {
    pub asset: AssetType,
    pub local_x: f32,
    pub local_z: f32,
    /// Yaw in radians.
    pub rotation: f32,
    pub scale: f32,
    pub required: bool,
    pub min_tasks_threshold: u32,
}

impl PlacementSlot {
    pub fn is_visible(&self, completed_tasks: u32) -> bool {
        completed_tasks >= self.min_tasks_threshold
    }

    pub fn distance_from_anchor(&self) -> f32 {
        (self.local_x * self.local_x + self.local_z * self.local_z).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementLayout {
    pub level: SettlementLevel,
    pub slots: Vec<PlacementSlot>,
    /// Footprint radius around the anchor, covering every potential slot.
    pub radius: f32,
}

impl SettlementLayout {
    /// Slots whose threshold is met at `completed_tasks`.
    pub fn visible_slots(&self, completed_tasks: u32) -> impl Iterator<Item = &PlacementSlot> {
        self.slots
            .iter()
            .filter(move |s| s.is_visible(completed_tasks))
    }

    pub fn count_of(&self, asset: AssetType) -> usize {
        self.slots.iter().filter(|s| s.asset == asset).count()
    }
}

/// Placement retry budgets and footprint margin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub arc_attempts: u32,
    pub cluster_attempts: u32,
    pub oriented_attempts: u32,
    pub radius_margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            arc_attempts: 15,
            cluster_attempts: 20,
            oriented_attempts: 30,
            radius_margin: 2.0,
        }
    }
}

pub fn layout_seed(project_id: u32) -> u32 {
    project_id.wrapping_mul(31337).wrapping_add(12345)
}

/// Full potential layout for a project.
pub fn generate_camp_layout(project_id: u32, completed_tasks: u32) -> SettlementLayout {
    generate_camp_layout_with(project_id, completed_tasks, &LayoutConfig::default())
}

pub fn generate_camp_layout_with(
    project_id: u32,
    completed_tasks: u32,
    config: &LayoutConfig,
) -> SettlementLayout {
    generate_from_seed(layout_seed(project_id), completed_tasks, config)
}

/// Layout for a placeholder settlement not yet bound to a project.
pub fn generate_preview_layout(completed_tasks: u32) -> SettlementLayout {
    generate_preview_layout_with(completed_tasks, &LayoutConfig::default())
}

pub fn generate_preview_layout_with(completed_tasks: u32, config: &LayoutConfig) -> SettlementLayout {
    generate_from_seed(PREVIEW_SEED, completed_tasks, config)
}

// ── Placement ──────────────────────────────────────────────────────────

const TENT_ARC_SPAN: f32 = PI * 0.9;
const TENT_RADIUS: (f32, f32) = (5.0, 7.5);
const TENT_ANGLE_JITTER: f32 = 0.25;
const CRATE_BAND: (f32, f32) = (2.5, 5.5);
const ROCK_BAND: (f32, f32) = (7.0, 10.0);
const TORCH_ARC_SPAN: f32 = PI * 0.6;
const TORCH_RADIUS: (f32, f32) = (8.0, 9.5);
const TORCH_ANGLE_JITTER: f32 = 0.15;
const BENCH_RADIUS: (f32, f32) = (3.0, 4.0);

struct Placer<'a> {
    rng: SeededRandom,
    config: &'a LayoutConfig,
    slots: Vec<PlacementSlot>,
}

impl Placer<'_> {
    fn clear_of_others(&self, asset: AssetType, x: f32, z: f32) -> bool {
        self.slots.iter().all(|s| {
            let dx = s.local_x - x;
            let dz = s.local_z - z;
            (dx * dx + dz * dz).sqrt() >= min_spacing(asset, s.asset)
        })
    }

    fn push(&mut self, asset: AssetType, x: f32, z: f32, rotation: f32, scale: f32, threshold: u32) {
        self.slots.push(PlacementSlot {
            asset,
            local_x: x,
            local_z: z,
            rotation,
            scale,
            required: false,
            min_tasks_threshold: threshold,
        });
    }

    fn anchor(&mut self) {
        let rotation = self.rng.range_f32(0.0, TAU);
        self.slots.push(PlacementSlot {
            asset: AssetType::Campfire,
            local_x: 0.0,
            local_z: 0.0,
            rotation,
            scale: 1.0,
            required: true,
            min_tasks_threshold: 0,
        });
    }

    /// Tents spread over an arc centered on `arc_center`, facing the anchor.
    fn arc(&mut self, arc_center: f32) {
        let thresholds = AssetType::Tent.breakpoints();
        let n = thresholds.len() as f32;
        for (i, &threshold) in thresholds.iter().enumerate() {
            let base = arc_center - TENT_ARC_SPAN / 2.0 + TENT_ARC_SPAN * (i as f32 + 0.5) / n;
            for _ in 0..self.config.arc_attempts {
                let angle = base + self.rng.range_f32(-TENT_ANGLE_JITTER, TENT_ANGLE_JITTER);
                let radius = self.rng.range_f32(TENT_RADIUS.0, TENT_RADIUS.1);
                let (x, z) = (angle.cos() * radius, angle.sin() * radius);
                if self.clear_of_others(AssetType::Tent, x, z) {
                    let scale = self.rng.range_f32(0.9, 1.1);
                    self.push(AssetType::Tent, x, z, facing_origin(x, z), scale, threshold);
                    break;
                }
            }
        }
    }

    /// Uniform scatter in a radius band with random facing.
    fn cluster(&mut self, asset: AssetType, band: (f32, f32), scale: (f32, f32)) {
        for &threshold in asset.breakpoints() {
            for _ in 0..self.config.cluster_attempts {
                let angle = self.rng.range_f32(0.0, TAU);
                let radius = self.rng.range_f32(band.0, band.1);
                let (x, z) = (angle.cos() * radius, angle.sin() * radius);
                if self.clear_of_others(asset, x, z) {
                    let rotation = self.rng.range_f32(0.0, TAU);
                    let s = self.rng.range_f32(scale.0, scale.1);
                    self.push(asset, x, z, rotation, s, threshold);
                    break;
                }
            }
        }
    }

    /// Torches on the far side of the fire from the tents.
    fn perimeter(&mut self, arc_center: f32) {
        let opposite = arc_center + PI;
        let thresholds = AssetType::Torch.breakpoints();
        let n = thresholds.len() as f32;
        for (i, &threshold) in thresholds.iter().enumerate() {
            let base = opposite - TORCH_ARC_SPAN / 2.0 + TORCH_ARC_SPAN * (i as f32 + 0.5) / n;
            for _ in 0..self.config.arc_attempts {
                let angle = base + self.rng.range_f32(-TORCH_ANGLE_JITTER, TORCH_ANGLE_JITTER);
                let radius = self.rng.range_f32(TORCH_RADIUS.0, TORCH_RADIUS.1);
                let (x, z) = (angle.cos() * radius, angle.sin() * radius);
                if self.clear_of_others(AssetType::Torch, x, z) {
                    let scale = self.rng.range_f32(0.95, 1.05);
                    self.push(AssetType::Torch, x, z, 0.0, scale, threshold);
                    break;
                }
            }
        }
    }

    /// A single bench close to the fire, turned toward it.
    fn oriented(&mut self) {
        for &threshold in AssetType::LogBench.breakpoints() {
            for _ in 0..self.config.oriented_attempts {
                let angle = self.rng.range_f32(0.0, TAU);
                let radius = self.rng.range_f32(BENCH_RADIUS.0, BENCH_RADIUS.1);
                let (x, z) = (angle.cos() * radius, angle.sin() * radius);
                if self.clear_of_others(AssetType::LogBench, x, z) {
                    self.push(AssetType::LogBench, x, z, facing_origin(x, z), 1.0, threshold);
                    break;
                }
            }
        }
    }
}

/// Yaw that turns an object at `(x, z)` to face the origin.
fn facing_origin(x: f32, z: f32) -> f32 {
    (-x).atan2(-z)
}

fn generate_from_seed(seed: u32, completed_tasks: u32, config: &LayoutConfig) -> SettlementLayout {
    let mut placer = Placer {
        rng: SeededRandom::new(seed),
        config,
        slots: Vec::new(),
    };

    placer.anchor();
    let arc_center = placer.rng.range_f32(0.0, TAU);
    placer.arc(arc_center);
    placer.cluster(AssetType::Crate, CRATE_BAND, (0.8, 1.2));
    placer.cluster(AssetType::Rock, ROCK_BAND, (0.6, 1.4));
    placer.perimeter(arc_center);
    placer.oriented();

    let extent = placer
        .slots
        .iter()
        .map(PlacementSlot::distance_from_anchor)
        .fold(0.0_f32, f32::max);

    SettlementLayout {
        level: settlement_level(completed_tasks),
        slots: placer.slots,
        radius: extent + config.radius_margin,
    }
}
