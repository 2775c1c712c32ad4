//! Pure world-generation logic for Campworld.
//!
//! This crate contains everything that is independent of the entity
//! simulation: functions take plain data and return results, so they are
//! deterministic, unit-testable, and usable from any host.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`lake`] | Lake geometry, water level, signed edge distance |
//! | [`noise`] | Fixed-table Perlin noise and FBM |
//! | [`progress`] | Task status and per-project progress records |
//! | [`rng`] | mulberry32 seeded PRNG (`rand::RngCore` compatible) |
//! | [`settlement`] | Deterministic settlement layouts and growth breakpoints |
//! | [`terrain`] | Lake-shaped height field, forest density, `TerrainSource` |

pub mod lake;
pub mod noise;
pub mod progress;
pub mod rng;
pub mod settlement;
pub mod terrain;
