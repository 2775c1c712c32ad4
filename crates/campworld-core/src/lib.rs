//! Campworld Core - Living Miniature World Simulation
//!
//! An ECS-based simulation of a small lakeside world: birds that perch,
//! float and circle, fish that patrol the lake, sheep that wander in herds,
//! and project settlements that grow as tasks are completed.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Birds, fish, sheep, herds, settlements, structures
//! - **Components**: Pure data attached to entities (Transform, Bird, Herd, etc.)
//! - **Systems**: Logic that queries and updates components
//!
//! Terrain, layout generation and random numbers live in `campworld-logic`
//! and have no ECS dependency.
//!
//! # Example
//!
//! ```rust,no_run
//! use campworld_core::prelude::*;
//! use campworld_logic::progress::ProjectProgress;
//!
//! let mut sim = WorldSimulation::new(WorldConfig::default()).unwrap();
//!
//! // Grow a settlement for project 7
//! sim.sync_settlement(&ProjectProgress::new(7, -40.0, 35.0, 12));
//!
//! // Run simulation
//! loop {
//!     sim.update(1.0 / 60.0); // 60 FPS
//!     for view in sim.creature_views() {
//!         let _ = (view.state, view.transform);
//!     }
//! }
//! ```

pub mod assets;
pub mod camps;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::assets::{AssetCache, AssetInstancer, AssetTemplate, InstanceHandle};
    pub use crate::camps::CampPosition;
    pub use crate::components::*;
    pub use crate::config::WorldConfig;
    pub use crate::engine::{CreatureView, StructureView, WorldBuilder, WorldSimulation};
    pub use crate::error::{BuildError, ConfigError};
    pub use crate::events::SimEvent;
}
