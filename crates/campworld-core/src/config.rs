//! World configuration.
//!
//! Every tunable lives here with a default matching the stock world. All
//! structs are `#[serde(default)]`, so a JSON document only needs the fields
//! it overrides:
//!
//! ```
//! use campworld_core::config::WorldConfig;
//!
//! let config = WorldConfig::from_json(r#"{ "seed": 9, "fish": { "count": 3 } }"#).unwrap();
//! assert_eq!(config.fish.count, 3);
//! assert_eq!(config.birds.count, WorldConfig::default().birds.count);
//! ```

use campworld_logic::lake::LakeConfig;
use campworld_logic::settlement::LayoutConfig;
use campworld_logic::terrain::TerrainParams;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Closed-open range sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        if self.max <= self.min {
            self.min
        } else {
            rng.gen_range(self.min..self.max)
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::InvalidRange {
                field,
                min: self.min,
                max: self.max,
            });
        }
        if self.min < 0.0 {
            return Err(ConfigError::NonPositive {
                field,
                value: self.min,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BirdConfig {
    pub count: usize,
    pub speed: f32,
    pub min_flight_time: f32,
    pub max_arc_height: f32,
    pub perch_dwell: Span,
    pub float_dwell: Span,
    pub tree_weight: f32,
    pub lake_weight: f32,
    pub sky_weight: f32,
    /// Samples tried when looking for a tree to perch on.
    pub tree_attempts: u32,
    pub min_tree_density: f32,
    /// Perch height above the ground.
    pub perch_height: f32,
    /// Open-sky target altitude above the ground.
    pub sky_altitude: Span,
    /// Float targets lie within this fraction of the lake radius.
    pub lake_target_fraction: f32,
    /// Minimum height above terrain while airborne.
    pub clearance: f32,
    pub max_bank: f32,
    pub max_pitch: f32,
}

impl Default for BirdConfig {
    fn default() -> Self {
        Self {
            count: 6,
            speed: 6.0,
            min_flight_time: 2.0,
            max_arc_height: 8.0,
            perch_dwell: Span::new(16.0, 40.0),
            float_dwell: Span::new(20.0, 50.0),
            tree_weight: 0.40,
            lake_weight: 0.35,
            sky_weight: 0.25,
            tree_attempts: 20,
            min_tree_density: 0.55,
            perch_height: 6.0,
            sky_altitude: Span::new(14.0, 28.0),
            lake_target_fraction: 0.7,
            clearance: 1.0,
            max_bank: 0.5,
            max_pitch: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FishConfig {
    pub count: usize,
    pub swim_speed: f32,
    pub dart_speed: f32,
    pub swim_duration: Span,
    pub dart_duration: Span,
    pub rest_duration: Span,
    pub dart_chance: f32,
    pub rest_chance: f32,
    /// Fish stay within this fraction of the lake radius.
    pub radius_fraction: f32,
    /// Gap kept below the surface and above the lakebed.
    pub depth_margin: f32,
}

impl Default for FishConfig {
    fn default() -> Self {
        Self {
            count: 8,
            swim_speed: 1.4,
            dart_speed: 5.0,
            swim_duration: Span::new(3.0, 8.0),
            dart_duration: Span::new(0.6, 1.5),
            rest_duration: Span::new(2.0, 5.0),
            dart_chance: 0.15,
            rest_chance: 0.25,
            radius_fraction: 0.85,
            depth_margin: 0.3,
        }
    }
}

/// Relative weights of the individual sheep states.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SheepWeights {
    pub walk: f32,
    pub graze: f32,
    pub idle: f32,
    pub drink: f32,
}

impl SheepWeights {
    pub fn total(&self) -> f32 {
        self.walk + self.graze + self.idle + self.drink
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        for value in [self.walk, self.graze, self.idle, self.drink] {
            if value < 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if self.total() <= 0.0 {
            return Err(ConfigError::NonPositive {
                field,
                value: self.total(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheepConfig {
    pub herd_count: usize,
    pub herd_size_min: usize,
    pub herd_size_max: usize,
    pub herd_speed: f32,
    pub wander_interval: Span,
    pub wander_radius: f32,
    /// Chance per wander cycle that the herd heads for the lake.
    pub lake_chance: f32,
    pub lake_dwell: Span,
    /// Shore targets sit this far from the waterline.
    pub shore_offset: f32,
    /// Radius of the cloud of member offsets around the center.
    pub spread: f32,
    pub walk_speed: f32,
    pub graze_speed: f32,
    pub catch_up_distance: f32,
    pub catch_up_speed: f32,
    pub walk_duration: Span,
    pub graze_duration: Span,
    pub idle_duration: Span,
    pub drink_duration: Span,
    pub roaming_weights: SheepWeights,
    pub lake_weights: SheepWeights,
}

impl Default for SheepConfig {
    fn default() -> Self {
        Self {
            herd_count: 2,
            herd_size_min: 4,
            herd_size_max: 7,
            herd_speed: 0.8,
            wander_interval: Span::new(8.0, 16.0),
            wander_radius: 25.0,
            lake_chance: 0.2,
            lake_dwell: Span::new(20.0, 40.0),
            shore_offset: 3.0,
            spread: 4.0,
            walk_speed: 1.0,
            graze_speed: 0.25,
            catch_up_distance: 3.0,
            catch_up_speed: 2.4,
            walk_duration: Span::new(3.0, 7.0),
            graze_duration: Span::new(5.0, 12.0),
            idle_duration: Span::new(3.0, 8.0),
            drink_duration: Span::new(6.0, 14.0),
            roaming_weights: SheepWeights {
                walk: 0.2,
                graze: 0.5,
                idle: 0.3,
                drink: 0.0,
            },
            lake_weights: SheepWeights {
                walk: 0.1,
                graze: 0.0,
                idle: 0.2,
                drink: 0.7,
            },
        }
    }
}

/// Exclusion rules for spawn, wander and target points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvoidanceConfig {
    /// Minimum distance from the waterline. Also the herd's shore threshold.
    pub lake_distance: f32,
    pub camp_distance: f32,
    pub max_forest_density: f32,
    /// Distance kept from the terrain edge.
    pub bounds_margin: f32,
    pub retry_budget: u32,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            lake_distance: 6.0,
            camp_distance: 14.0,
            max_forest_density: 0.7,
            bounds_margin: 8.0,
            retry_budget: 30,
        }
    }
}

/// Top-level configuration for a [`crate::engine::WorldSimulation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub seed: u32,
    pub lake: LakeConfig,
    pub terrain: TerrainParams,
    pub birds: BirdConfig,
    pub fish: FishConfig,
    pub sheep: SheepConfig,
    pub avoidance: AvoidanceConfig,
    pub layout: LayoutConfig,
    pub max_pending_events: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            lake: LakeConfig::default(),
            terrain: TerrainParams::default(),
            birds: BirdConfig::default(),
            fish: FishConfig::default(),
            sheep: SheepConfig::default(),
            avoidance: AvoidanceConfig::default(),
            layout: LayoutConfig::default(),
            max_pending_events: 256,
        }
    }
}

fn probability(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

impl WorldConfig {
    /// Parse and validate a JSON document. No I/O is performed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("lake.radius", self.lake.radius)?;
        positive("lake.depth", self.lake.depth)?;
        if self.lake.shore_width < 0.0 {
            return Err(ConfigError::NonPositive {
                field: "lake.shore_width",
                value: self.lake.shore_width,
            });
        }
        positive("terrain.half_extent", self.terrain.half_extent)?;
        probability("terrain.basin_depression", self.terrain.basin_depression)?;

        let b = &self.birds;
        positive("birds.speed", b.speed)?;
        b.perch_dwell.validate("birds.perch_dwell")?;
        b.float_dwell.validate("birds.float_dwell")?;
        b.sky_altitude.validate("birds.sky_altitude")?;
        probability("birds.tree_weight", b.tree_weight)?;
        probability("birds.lake_weight", b.lake_weight)?;
        probability("birds.sky_weight", b.sky_weight)?;
        positive("birds.weights", b.tree_weight + b.lake_weight + b.sky_weight)?;
        probability("birds.min_tree_density", b.min_tree_density)?;
        probability("birds.lake_target_fraction", b.lake_target_fraction)?;

        let f = &self.fish;
        positive("fish.swim_speed", f.swim_speed)?;
        positive("fish.dart_speed", f.dart_speed)?;
        f.swim_duration.validate("fish.swim_duration")?;
        f.dart_duration.validate("fish.dart_duration")?;
        f.rest_duration.validate("fish.rest_duration")?;
        probability("fish.dart_chance", f.dart_chance)?;
        probability("fish.rest_chance", f.rest_chance)?;
        probability("fish.dart_chance + fish.rest_chance", f.dart_chance + f.rest_chance)?;
        probability("fish.radius_fraction", f.radius_fraction)?;

        let s = &self.sheep;
        if s.herd_size_min > s.herd_size_max {
            return Err(ConfigError::InvalidRange {
                field: "sheep.herd_size",
                min: s.herd_size_min as f32,
                max: s.herd_size_max as f32,
            });
        }
        positive("sheep.herd_speed", s.herd_speed)?;
        positive("sheep.catch_up_speed", s.catch_up_speed)?;
        s.wander_interval.validate("sheep.wander_interval")?;
        s.lake_dwell.validate("sheep.lake_dwell")?;
        s.walk_duration.validate("sheep.walk_duration")?;
        s.graze_duration.validate("sheep.graze_duration")?;
        s.idle_duration.validate("sheep.idle_duration")?;
        s.drink_duration.validate("sheep.drink_duration")?;
        probability("sheep.lake_chance", s.lake_chance)?;
        s.roaming_weights.validate("sheep.roaming_weights")?;
        s.lake_weights.validate("sheep.lake_weights")?;

        let a = &self.avoidance;
        positive("avoidance.lake_distance", a.lake_distance)?;
        probability("avoidance.max_forest_density", a.max_forest_density)?;
        if a.camp_distance < 0.0 {
            return Err(ConfigError::NonPositive {
                field: "avoidance.camp_distance",
                value: a.camp_distance,
            });
        }
        if s.shore_offset >= a.lake_distance {
            return Err(ConfigError::InvalidRange {
                field: "sheep.shore_offset",
                min: s.shore_offset,
                max: a.lake_distance,
            });
        }
        Ok(())
    }
}
