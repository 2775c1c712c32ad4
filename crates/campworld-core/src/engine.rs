//! Simulation engine - main entry point for running the world

use std::collections::HashSet;

use campworld_logic::progress::ProjectProgress;
use campworld_logic::rng::SeededRandom;
use campworld_logic::settlement::{
    generate_camp_layout_with, generate_preview_layout_with, AssetType, SettlementLayout,
};
use campworld_logic::terrain::{Terrain, TerrainSource};
use hecs::{Entity, World};

use crate::assets::{AssetCache, AssetInstancer, InstanceHandle};
use crate::camps::{CampPosition, CampRegistry};
use crate::components::*;
use crate::config::WorldConfig;
use crate::error::BuildError;
use crate::events::{EventLog, SimEvent};
use crate::systems::*;

/// Per-creature output for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatureView {
    pub entity: Entity,
    pub state: CreatureState,
    pub transform: Transform,
    /// Only birds swap renderables.
    pub visuals: Option<BirdVisuals>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureView {
    pub entity: Entity,
    pub project_id: u32,
    pub asset: AssetType,
    pub transform: Transform,
    pub instance: Option<InstanceHandle>,
}

/// Builder for [`WorldSimulation`]. A terrain source is required.
pub struct WorldBuilder {
    config: WorldConfig,
    terrain: Option<Box<dyn TerrainSource>>,
    assets: AssetCache,
    instancer: Option<Box<dyn AssetInstancer>>,
    camps: Vec<CampPosition>,
}

impl WorldBuilder {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            terrain: None,
            assets: AssetCache::new(),
            instancer: None,
            camps: Vec::new(),
        }
    }

    pub fn terrain(mut self, terrain: impl TerrainSource + 'static) -> Self {
        self.terrain = Some(Box::new(terrain));
        self
    }

    /// Use the built-in height field for the configured lake.
    pub fn procedural_terrain(self) -> Self {
        let terrain = Terrain::new(self.config.lake, self.config.terrain);
        self.terrain(terrain)
    }

    pub fn assets(mut self, assets: AssetCache) -> Self {
        self.assets = assets;
        self
    }

    pub fn instancer(mut self, instancer: impl AssetInstancer + 'static) -> Self {
        self.instancer = Some(Box::new(instancer));
        self
    }

    pub fn camps(mut self, camps: &[CampPosition]) -> Self {
        self.camps = camps.to_vec();
        self
    }

    /// Validate the configuration, then spawn every species.
    pub fn build(self) -> Result<WorldSimulation, BuildError> {
        self.config.validate()?;
        let terrain = self.terrain.ok_or(BuildError::MissingTerrain)?;

        let mut sim = WorldSimulation {
            world: World::new(),
            sim_time: 0.0,
            rng: SeededRandom::new(self.config.seed),
            events: EventLog::new(self.config.max_pending_events),
            config: self.config,
            terrain,
            assets: self.assets,
            instancer: self.instancer,
            camps: CampRegistry::new(),
            time_scale: 1.0,
            disposed_species: HashSet::new(),
            disposed: false,
        };
        sim.camps.set_external(&self.camps);
        sim.spawn_creatures();

        log::info!(
            "world built: seed {}, {} birds, {} fish, {} herds ({} sheep)",
            sim.config.seed,
            sim.bird_count(),
            sim.fish_count(),
            sim.herd_count(),
            sim.sheep_count()
        );
        Ok(sim)
    }
}

/// Main simulation engine
pub struct WorldSimulation {
    /// ECS world containing all entities
    pub world: World,
    /// Simulated seconds since construction
    pub sim_time: f64,
    config: WorldConfig,
    terrain: Box<dyn TerrainSource>,
    assets: AssetCache,
    instancer: Option<Box<dyn AssetInstancer>>,
    camps: CampRegistry,
    events: EventLog,
    rng: SeededRandom,
    time_scale: f32,
    disposed_species: HashSet<Species>,
    disposed: bool,
}

impl WorldSimulation {
    pub fn builder(config: WorldConfig) -> WorldBuilder {
        WorldBuilder::new(config)
    }

    /// World with the built-in terrain and no asset instancing.
    pub fn new(config: WorldConfig) -> Result<Self, BuildError> {
        WorldBuilder::new(config).procedural_terrain().build()
    }

    fn spawn_creatures(&mut self) {
        let camps = self.camps.snapshot();
        let env = Environment::new(
            self.terrain.as_ref(),
            &self.config.lake,
            &camps,
            &self.config.avoidance,
        );
        spawn_birds(&mut self.world, &env, &self.config.birds, &mut self.rng);
        spawn_fish(&mut self.world, &env, &self.config.fish, &mut self.rng);
        spawn_herds(
            &mut self.world,
            &env,
            &self.config.sheep,
            &mut self.rng,
            &mut self.events,
        );
    }

    /// Update the simulation by delta_seconds
    pub fn update(&mut self, delta_seconds: f32) {
        if self.disposed || delta_seconds.is_nan() || delta_seconds <= 0.0 {
            return;
        }
        let dt = delta_seconds * self.time_scale;
        if dt <= 0.0 {
            return;
        }
        self.sim_time += dt as f64;

        let birds = self.is_active(Species::Bird);
        let fish = self.is_active(Species::Fish);
        let sheep = self.is_active(Species::Sheep);

        let camps = self.camps.snapshot();
        let env = Environment::new(
            self.terrain.as_ref(),
            &self.config.lake,
            &camps,
            &self.config.avoidance,
        );

        if birds {
            bird_system(
                &mut self.world,
                &env,
                &self.config.birds,
                &mut self.rng,
                dt,
                &mut self.events,
            );
        }
        if fish {
            fish_system(
                &mut self.world,
                &env,
                &self.config.fish,
                &mut self.rng,
                dt,
                &mut self.events,
            );
        }
        if sheep {
            let herds = snapshot_herds(&self.world);
            herd_system(
                &mut self.world,
                &env,
                &self.config.sheep,
                &mut self.rng,
                dt,
                &mut self.events,
            );
            sheep_system(
                &mut self.world,
                &env,
                &self.config.sheep,
                &mut self.rng,
                dt,
                &herds,
                &mut self.events,
            );
        }
    }

    /// Full potential layout for a project. Pure; callable at any time.
    pub fn generate_camp_layout(&self, project_id: u32, completed_tasks: u32) -> SettlementLayout {
        generate_camp_layout_with(project_id, completed_tasks, &self.config.layout)
    }

    pub fn generate_preview_layout(&self, completed_tasks: u32) -> SettlementLayout {
        generate_preview_layout_with(completed_tasks, &self.config.layout)
    }

    /// Make every fish within `radius` of `(x, z)` dart toward it.
    pub fn attract_to_point(&mut self, x: f32, z: f32, radius: f32) -> usize {
        if !self.is_active(Species::Fish) {
            return 0;
        }
        let camps = self.camps.snapshot();
        let env = Environment::new(
            self.terrain.as_ref(),
            &self.config.lake,
            &camps,
            &self.config.avoidance,
        );
        attract_fish(
            &mut self.world,
            &env,
            &self.config.fish,
            &mut self.rng,
            x,
            z,
            radius,
            &mut self.events,
        )
    }

    /// Replace the host-supplied camp positions.
    pub fn update_camp_positions(&mut self, positions: &[CampPosition]) {
        self.camps.set_external(positions);
    }

    /// Create or update a project's settlement.
    pub fn sync_settlement(&mut self, progress: &ProjectProgress) -> Option<Entity> {
        if self.disposed {
            return None;
        }
        let mut ctx = SettlementContext {
            terrain: self.terrain.as_ref(),
            layout: &self.config.layout,
            assets: &self.assets,
            instancer: &mut self.instancer,
            events: &mut self.events,
        };
        let entity = sync_settlement(&mut self.world, progress, &mut ctx);
        self.camps.set_settlement(
            progress.project_id,
            CampPosition::new(progress.position_x, progress.position_z),
        );
        Some(entity)
    }

    pub fn remove_settlement(&mut self, project_id: u32) -> bool {
        let mut ctx = SettlementContext {
            terrain: self.terrain.as_ref(),
            layout: &self.config.layout,
            assets: &self.assets,
            instancer: &mut self.instancer,
            events: &mut self.events,
        };
        let removed = remove_settlement(&mut self.world, project_id, &mut ctx);
        self.camps.remove_settlement(project_id);
        removed
    }

    /// Stop one species and despawn its entities. Idempotent.
    pub fn dispose_species(&mut self, species: Species) {
        if !self.disposed_species.insert(species) {
            return;
        }
        let doomed: Vec<Entity> = match species {
            Species::Bird => self.world.query::<&Bird>().iter().map(|(e, _)| e).collect(),
            Species::Fish => self.world.query::<&Fish>().iter().map(|(e, _)| e).collect(),
            Species::Sheep => self
                .world
                .query::<&Sheep>()
                .iter()
                .map(|(e, _)| e)
                .chain(self.world.query::<&Herd>().iter().map(|(e, _)| e))
                .collect(),
        };
        let count = doomed.len();
        for e in doomed {
            let _ = self.world.despawn(e);
        }
        log::info!("disposed {:?}: {} entities despawned", species, count);
    }

    /// Tear everything down. Further updates are no-ops. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for species in Species::ALL {
            self.dispose_species(species);
        }
        let mut ctx = SettlementContext {
            terrain: self.terrain.as_ref(),
            layout: &self.config.layout,
            assets: &self.assets,
            instancer: &mut self.instancer,
            events: &mut self.events,
        };
        let removed = remove_all_settlements(&mut self.world, &mut ctx);
        self.camps.clear_settlements();
        self.disposed = true;
        log::info!("world disposed ({} settlements removed)", removed);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_active(&self, species: Species) -> bool {
        !self.disposed && !self.disposed_species.contains(&species)
    }

    /// Transforms and states for every creature.
    pub fn creature_views(&self) -> Vec<CreatureView> {
        let mut views = Vec::new();
        for (entity, (t, bird)) in self.world.query::<(&Transform, &Bird)>().iter() {
            views.push(CreatureView {
                entity,
                state: CreatureState::Bird(bird.state),
                transform: *t,
                visuals: Some(bird.visuals),
            });
        }
        for (entity, (t, fish)) in self.world.query::<(&Transform, &Fish)>().iter() {
            views.push(CreatureView {
                entity,
                state: CreatureState::Fish(fish.state),
                transform: *t,
                visuals: None,
            });
        }
        for (entity, (t, sheep)) in self.world.query::<(&Transform, &Sheep)>().iter() {
            views.push(CreatureView {
                entity,
                state: CreatureState::Sheep(sheep.state),
                transform: *t,
                visuals: None,
            });
        }
        views
    }

    pub fn structure_views(&self) -> Vec<StructureView> {
        self.world
            .query::<(&Transform, &Structure)>()
            .iter()
            .map(|(entity, (t, s))| StructureView {
                entity,
                project_id: s.project_id,
                asset: s.asset(),
                transform: *t,
                instance: s.instance,
            })
            .collect()
    }

    /// Herd entity, center and group state.
    pub fn herd_views(&self) -> Vec<(Entity, Vec3, HerdState)> {
        self.world
            .query::<&Herd>()
            .iter()
            .map(|(e, h)| (e, h.center, h.state))
            .collect()
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn terrain(&self) -> &dyn TerrainSource {
        self.terrain.as_ref()
    }

    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetCache {
        &mut self.assets
    }

    pub fn camp_positions(&self) -> Vec<CampPosition> {
        self.camps.snapshot()
    }

    pub fn bird_count(&self) -> usize {
        self.world.query::<&Bird>().iter().count()
    }

    pub fn fish_count(&self) -> usize {
        self.world.query::<&Fish>().iter().count()
    }

    pub fn sheep_count(&self) -> usize {
        self.world.query::<&Sheep>().iter().count()
    }

    pub fn herd_count(&self) -> usize {
        self.world.query::<&Herd>().iter().count()
    }

    pub fn settlement_count(&self) -> usize {
        self.world.query::<&Settlement>().iter().count()
    }

    pub fn structure_count(&self) -> usize {
        self.world.query::<&Structure>().iter().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_creation() {
        let sim = WorldSimulation::new(WorldConfig::default()).unwrap();
        assert_eq!(sim.bird_count(), 6);
        assert_eq!(sim.fish_count(), 8);
        assert_eq!(sim.sim_time(), 0.0);
    }

    #[test]
    fn test_missing_terrain_fails() {
        let result = WorldSimulation::builder(WorldConfig::default()).build();
        assert!(matches!(result, Err(BuildError::MissingTerrain)));
    }

    #[test]
    fn test_invalid_config_fails() {
        let mut config = WorldConfig::default();
        config.fish.dart_chance = 2.0;
        let result = WorldSimulation::new(config);
        assert!(matches!(result, Err(BuildError::Config(_))));
    }

    #[test]
    fn test_time_scale() {
        let mut sim = WorldSimulation::new(WorldConfig::default()).unwrap();
        sim.set_time_scale(2.0);
        sim.update(1.0);
        assert!((sim.sim_time() - 2.0).abs() < 1e-9);

        sim.set_time_scale(0.0);
        sim.update(1.0);
        assert!((sim.sim_time() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_positive_delta_is_ignored() {
        let mut sim = WorldSimulation::new(WorldConfig::default()).unwrap();
        let before = sim.creature_views();
        sim.update(0.0);
        sim.update(-5.0);
        assert_eq!(sim.sim_time(), 0.0);
        assert_eq!(sim.creature_views(), before);
    }

    #[test]
    fn test_same_seed_same_world() {
        let mut a = WorldSimulation::new(WorldConfig::default()).unwrap();
        let mut b = WorldSimulation::new(WorldConfig::default()).unwrap();
        for _ in 0..200 {
            a.update(0.1);
            b.update(0.1);
        }
        let va: Vec<_> = a.creature_views().into_iter().map(|v| (v.state, v.transform)).collect();
        let vb: Vec<_> = b.creature_views().into_iter().map(|v| (v.state, v.transform)).collect();
        assert_eq!(va, vb);
    }
}
