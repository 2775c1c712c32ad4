//! Systems - logic that operates on components

mod avoidance;
mod birds;
mod fish;
mod movement;
mod settlements;
mod sheep;

pub use avoidance::*;
pub use birds::*;
pub use fish::*;
pub use movement::*;
pub use settlements::*;
pub use sheep::*;
