//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems.

mod common;
mod creatures;
mod settlement;

pub use common::*;
pub use creatures::*;
pub use settlement::*;
