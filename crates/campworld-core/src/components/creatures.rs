//! Creature components: birds, fish, sheep and the herds they follow.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::common::{StateTimer, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Bird,
    Fish,
    Sheep,
}

impl Species {
    pub const ALL: [Species; 3] = [Species::Bird, Species::Fish, Species::Sheep];
}

// ── Birds ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BirdState {
    Flying,
    Floating,
    Perched,
}

/// What the bird does once its current flight lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BirdDestination {
    Perch,
    Float,
    Sky,
}

/// Which of the bird's two renderables is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirdVisuals {
    pub flying_visible: bool,
    pub floating_visible: bool,
}

impl BirdVisuals {
    pub const FLYING: Self = Self {
        flying_visible: true,
        floating_visible: false,
    };
    pub const FLOATING: Self = Self {
        flying_visible: false,
        floating_visible: true,
    };
    pub const HIDDEN: Self = Self {
        flying_visible: false,
        floating_visible: false,
    };
}

/// Parametric flight between two points with a vertical arc.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightPath {
    pub start: Vec3,
    pub end: Vec3,
    pub arc_height: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bird {
    pub state: BirdState,
    /// While flying the timer tracks flight progress.
    pub timer: StateTimer,
    pub flight: Option<FlightPath>,
    pub destination: BirdDestination,
    pub visuals: BirdVisuals,
}

// ── Fish ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FishState {
    Swimming,
    Darting,
    Resting,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fish {
    pub state: FishState,
    pub timer: StateTimer,
    pub target: Vec3,
}

// ── Sheep ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheepState {
    Walking,
    Grazing,
    Idle,
    Drinking,
}

/// One sheep. Follows `offset` relative to its herd's center.
#[derive(Debug, Clone)]
pub struct Sheep {
    pub herd: Entity,
    pub state: SheepState,
    pub timer: StateTimer,
    /// Target offset (x, z) from the herd center.
    pub offset: (f32, f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HerdState {
    Roaming,
    AtLake,
}

/// Group-level wander state shared by a herd's sheep.
#[derive(Debug, Clone)]
pub struct Herd {
    pub members: Vec<Entity>,
    pub center: Vec3,
    pub target: Vec3,
    pub wander_timer: StateTimer,
    pub state: HerdState,
    /// Roaming toward a shore point after electing to visit the lake.
    pub heading_to_lake: bool,
    /// Dwell at the lake; once expired the herd walks back out.
    pub lake_timer: StateTimer,
    pub leaving: bool,
}

impl Herd {
    pub fn new(center: Vec3, wander_duration: f32) -> Self {
        Self {
            members: Vec::new(),
            center,
            target: center,
            wander_timer: StateTimer::new(wander_duration),
            state: HerdState::Roaming,
            heading_to_lake: false,
            lake_timer: StateTimer::default(),
            leaving: false,
        }
    }

    pub fn is_at_lake(&self) -> bool {
        self.state == HerdState::AtLake
    }
}

/// Any species' state, for events and views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatureState {
    Bird(BirdState),
    Fish(FishState),
    Sheep(SheepState),
}

impl CreatureState {
    pub fn species(&self) -> Species {
        match self {
            CreatureState::Bird(_) => Species::Bird,
            CreatureState::Fish(_) => Species::Fish,
            CreatureState::Sheep(_) => Species::Sheep,
        }
    }
}
