//! Integration tests for the running world simulation.
//!
//! Exercises: WorldBuilder → creature systems → settlements → dispose
//!
//! All tests drive the public engine API with fixed seeds; no renderer.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use campworld_core::prelude::*;
use campworld_logic::lake::LakeConfig;
use campworld_logic::progress::ProjectProgress;
use campworld_logic::settlement::AssetType;
use campworld_logic::terrain::TerrainSource;

// ── Helpers ────────────────────────────────────────────────────────────

fn default_sim() -> WorldSimulation {
    WorldSimulation::new(WorldConfig::default()).unwrap()
}

fn states_seen(sim: &mut WorldSimulation, ticks: usize, dt: f32) -> HashSet<CreatureState> {
    let mut seen = HashSet::new();
    for _ in 0..ticks {
        sim.update(dt);
        for view in sim.creature_views() {
            seen.insert(view.state);
        }
        sim.drain_events();
    }
    seen
}

#[derive(Default)]
struct Recorded {
    next_id: u64,
    groups: Vec<(String, Vec3)>,
    live: BTreeMap<u64, String>,
    released: Vec<u64>,
}

/// Instancer that records every call into shared state.
#[derive(Clone, Default)]
struct RecordingInstancer {
    state: Arc<Mutex<Recorded>>,
}

impl AssetInstancer for RecordingInstancer {
    fn create_group(&mut self, name: &str, position: Vec3) -> Option<InstanceHandle> {
        let mut s = self.state.lock().unwrap();
        s.next_id += 1;
        let id = s.next_id;
        s.groups.push((name.to_string(), position));
        s.live.insert(id, name.to_string());
        Some(InstanceHandle(id))
    }

    fn create_instance(
        &mut self,
        template: &AssetTemplate,
        name: &str,
        _transform: &Transform,
        parent: Option<InstanceHandle>,
    ) -> Option<InstanceHandle> {
        assert!(parent.is_some(), "structures are parented to their group");
        let mut s = self.state.lock().unwrap();
        s.next_id += 1;
        let id = s.next_id;
        s.live.insert(id, format!("{}:{}", template.name, name));
        Some(InstanceHandle(id))
    }

    fn release_instance(&mut self, handle: InstanceHandle) {
        let mut s = self.state.lock().unwrap();
        assert!(s.live.remove(&handle.0).is_some(), "double release of {:?}", handle);
        s.released.push(handle.0);
    }
}

fn full_asset_cache() -> AssetCache {
    let mut cache = AssetCache::new();
    for asset in AssetType::ALL {
        cache.register(AssetTemplate::new(asset, asset.name(), format!("models/{}.glb", asset.name())));
    }
    cache
}

fn settlement_sim() -> (WorldSimulation, RecordingInstancer) {
    let instancer = RecordingInstancer::default();
    let sim = WorldSimulation::builder(WorldConfig::default())
        .procedural_terrain()
        .assets(full_asset_cache())
        .instancer(instancer.clone())
        .build()
        .unwrap();
    (sim, instancer)
}

fn structures_by_slot(sim: &WorldSimulation, project_id: u32) -> BTreeMap<usize, Transform> {
    sim.world
        .query::<(&Transform, &Structure)>()
        .iter()
        .filter(|(_, (_, s))| s.project_id == project_id)
        .map(|(_, (t, s))| (s.slot_index, *t))
        .collect()
}

struct Flat {
    half_extent: f32,
}

impl TerrainSource for Flat {
    fn height(&self, _x: f32, _z: f32) -> f32 {
        0.0
    }

    fn half_extent(&self) -> f32 {
        self.half_extent
    }
}

// ── Construction ───────────────────────────────────────────────────────

#[test]
fn default_world_spawns_every_species() {
    let sim = default_sim();
    let config = sim.config().clone();
    assert_eq!(sim.bird_count(), config.birds.count);
    assert_eq!(sim.fish_count(), config.fish.count);
    assert_eq!(sim.herd_count(), config.sheep.herd_count);
    assert!(sim.sheep_count() >= config.sheep.herd_count * config.sheep.herd_size_min);
    assert!(sim.sheep_count() <= config.sheep.herd_count * config.sheep.herd_size_max);
}

#[test]
fn builder_without_terrain_is_an_error() {
    let err = WorldSimulation::builder(WorldConfig::default())
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, BuildError::MissingTerrain));
    assert!(err.to_string().contains("terrain"));
}

#[test]
fn json_config_builds_the_same_world() {
    let json = WorldConfig::default().to_json().unwrap();
    let parsed = WorldConfig::from_json(&json).unwrap();
    let mut a = WorldSimulation::new(parsed).unwrap();
    let mut b = default_sim();
    for _ in 0..50 {
        a.update(0.2);
        b.update(0.2);
    }
    assert_eq!(a.creature_views(), b.creature_views());
}

#[test]
fn different_seeds_diverge() {
    let mut config = WorldConfig::default();
    config.seed = 99;
    let a = WorldSimulation::new(config).unwrap();
    let b = default_sim();
    let pa: Vec<_> = a.creature_views().iter().map(|v| v.transform.position).collect();
    let pb: Vec<_> = b.creature_views().iter().map(|v| v.transform.position).collect();
    assert_ne!(pa, pb);
}

#[test]
fn herds_spawn_away_from_supplied_camps() {
    let camps = [CampPosition::new(-30.0, 30.0), CampPosition::new(-30.0, -30.0)];
    let config = WorldConfig::default();
    let camp_distance = config.avoidance.camp_distance;
    let sim = WorldSimulation::builder(config)
        .terrain(Flat { half_extent: 80.0 })
        .camps(&camps)
        .build()
        .unwrap();
    for (_, center, _) in sim.herd_views() {
        for camp in &camps {
            assert!(camp.distance_to(center.x, center.z) >= camp_distance);
        }
    }
}

// ── State machines ─────────────────────────────────────────────────────

#[test]
fn every_creature_state_is_reachable() {
    let mut config = WorldConfig::default();
    config.sheep.lake_chance = 0.5;
    let mut sim = WorldSimulation::new(config).unwrap();
    let seen = states_seen(&mut sim, 16_000, 0.5);

    for state in [BirdState::Flying, BirdState::Perched, BirdState::Floating] {
        assert!(seen.contains(&CreatureState::Bird(state)), "bird never {:?}", state);
    }
    for state in [FishState::Swimming, FishState::Darting, FishState::Resting] {
        assert!(seen.contains(&CreatureState::Fish(state)), "fish never {:?}", state);
    }
    for state in [
        SheepState::Walking,
        SheepState::Grazing,
        SheepState::Idle,
        SheepState::Drinking,
    ] {
        assert!(seen.contains(&CreatureState::Sheep(state)), "sheep never {:?}", state);
    }
}

#[test]
fn flat_world_without_forest_never_perches() {
    let mut sim = WorldSimulation::builder(WorldConfig::default())
        .terrain(Flat { half_extent: 80.0 })
        .build()
        .unwrap();
    let seen = states_seen(&mut sim, 2_000, 0.5);
    assert!(!seen.contains(&CreatureState::Bird(BirdState::Perched)));
    assert!(seen.contains(&CreatureState::Bird(BirdState::Floating)));
}

#[test]
fn perched_bird_stays_hidden_for_the_full_dwell() {
    let mut sim = default_sim();
    let dt = 0.25;

    let mut perched = None;
    for _ in 0..8_000 {
        sim.update(dt);
        perched = sim
            .creature_views()
            .into_iter()
            .find(|v| v.state == CreatureState::Bird(BirdState::Perched));
        if perched.is_some() {
            break;
        }
    }
    let perched = perched.expect("some bird should perch");
    let dwell = sim.world.get::<&Bird>(perched.entity).unwrap().timer.duration;
    let config = sim.config().birds.clone();
    assert!(config.perch_dwell.contains(dwell));
    assert_eq!(perched.visuals, Some(BirdVisuals::HIDDEN));

    let mut held = 0.0f32;
    loop {
        sim.update(dt);
        held += dt;
        let view = sim
            .creature_views()
            .into_iter()
            .find(|v| v.entity == perched.entity)
            .unwrap();
        if view.state != CreatureState::Bird(BirdState::Perched) {
            assert_eq!(view.state, CreatureState::Bird(BirdState::Flying));
            assert_eq!(view.visuals, Some(BirdVisuals::FLYING));
            break;
        }
        assert_eq!(view.visuals, Some(BirdVisuals::HIDDEN));
        assert_eq!(view.transform.position, perched.transform.position);
        assert!(held < dwell + dt);
    }
    assert!(held >= dwell - 1e-3, "left after {held}s of a {dwell}s dwell");
}

#[test]
fn state_changes_are_reported_as_events() {
    let mut sim = default_sim();
    let mut changes = 0;
    for _ in 0..400 {
        sim.update(0.5);
        for event in sim.drain_events() {
            if let SimEvent::StateChanged { from, to, .. } = event {
                assert_ne!(from, to);
                assert_eq!(from.species(), to.species());
                changes += 1;
            }
        }
    }
    assert!(changes > 0);
}

// ── Avoidance ──────────────────────────────────────────────────────────

#[test]
fn creatures_respect_their_regions() {
    let mut sim = default_sim();
    let config = sim.config().clone();
    let lake = config.lake;
    let band = config.avoidance.lake_distance;

    for _ in 0..4_000 {
        sim.update(0.5);
        sim.drain_events();

        for (_, center, state) in sim.herd_views() {
            assert!(sim.terrain().in_bounds(center.x, center.z, 0.0));
            if state == HerdState::Roaming {
                assert!(lake.distance_to_edge(center.x, center.z) >= band - 1e-3);
            }
        }
        for view in sim.creature_views() {
            let p = view.transform.position;
            match view.state {
                CreatureState::Fish(_) => {
                    let max_r = lake.radius * config.fish.radius_fraction;
                    assert!(lake.distance_to_center(p.x, p.z) <= max_r + 1e-3);
                    assert!(p.y <= lake.water_level());
                }
                CreatureState::Bird(BirdState::Flying) => {
                    let floor = sim.terrain().height(p.x, p.z) + config.birds.clearance;
                    assert!(p.y >= floor - 1e-3);
                }
                _ => {}
            }
        }
    }
}

#[test]
fn sheep_never_stand_in_the_lake() {
    let mut config = WorldConfig::default();
    config.sheep.lake_chance = 1.0;
    let lake = config.lake;
    let mut sim = WorldSimulation::new(config).unwrap();

    let mut visited = false;
    for _ in 0..400 {
        sim.update(5.0);
        sim.drain_events();
        visited |= sim.herd_views().iter().any(|(_, _, state)| *state == HerdState::AtLake);

        for view in sim.creature_views() {
            if let CreatureState::Sheep(_) = view.state {
                let p = view.transform.position;
                assert!(lake.distance_to_edge(p.x, p.z) >= 0.0);
            }
        }
    }
    assert!(visited);
}

#[test]
fn fish_attraction_pulls_nearby_fish() {
    let mut config = WorldConfig::default();
    config.lake = LakeConfig {
        center_x: 12.0,
        center_z: 4.0,
        ..LakeConfig::default()
    };
    let mut sim = WorldSimulation::new(config).unwrap();

    let fish = sim
        .creature_views()
        .into_iter()
        .find(|v| v.state.species() == Species::Fish)
        .unwrap()
        .entity;
    sim.world.get::<&mut Transform>(fish).unwrap().position = Vec3::new(11.0, -2.0, 6.0);

    let nearby = sim
        .creature_views()
        .iter()
        .filter(|v| v.state.species() == Species::Fish)
        .filter(|v| v.transform.position.horizontal_distance(&Vec3::new(10.0, 0.0, 5.0)) <= 3.0)
        .count();
    let attracted = sim.attract_to_point(10.0, 5.0, 3.0);
    assert_eq!(attracted, nearby);
    assert!(attracted >= 1);

    let target = Vec3::new(10.0, 0.0, 5.0);
    let before = sim.world.get::<&Transform>(fish).unwrap().position.horizontal_distance(&target);
    {
        let f = sim.world.get::<&Fish>(fish).unwrap();
        assert_eq!(f.state, FishState::Darting);
        assert_eq!((f.target.x, f.target.z), (10.0, 5.0));

        let margin = sim.config().fish.depth_margin;
        let lo = sim.terrain().height(10.0, 5.0) + margin;
        let hi = sim.config().lake.water_level() - margin;
        assert!(f.target.y >= lo - 1e-4 && f.target.y <= hi + 1e-4);
    }

    sim.update(0.2);
    let after = sim.world.get::<&Transform>(fish).unwrap().position.horizontal_distance(&target);
    assert!(after < before);
    assert_eq!(sim.world.get::<&Fish>(fish).unwrap().state, FishState::Darting);
}

// ── Settlements ────────────────────────────────────────────────────────

#[test]
fn settlement_grows_without_moving_existing_structures() {
    let (mut sim, instancer) = settlement_sim();
    let id = 7;
    let mut previous = BTreeMap::new();

    for tasks in [0, 3, 8, 15, 25] {
        sim.sync_settlement(&ProjectProgress::new(id, -40.0, 35.0, tasks)).unwrap();
        let current = structures_by_slot(&sim, id);
        assert!(current.len() >= previous.len());
        for (slot, transform) in &previous {
            assert_eq!(current.get(slot), Some(transform), "slot {slot} moved at {tasks} tasks");
        }
        previous = current;
    }

    assert_eq!(sim.settlement_count(), 1);
    let recorded = instancer.state.lock().unwrap();
    assert_eq!(recorded.groups.len(), 1);
    assert_eq!(recorded.groups[0].0, "settlement-7");
    // One live group plus one instance per structure.
    assert_eq!(recorded.live.len(), sim.structure_count() + 1);
}

#[test]
fn asset_cache_tracks_live_structures() {
    let (mut sim, _instancer) = settlement_sim();
    sim.sync_settlement(&ProjectProgress::new(3, -40.0, 35.0, 25)).unwrap();

    for asset in AssetType::ALL {
        let placed = sim.structure_views().iter().filter(|v| v.asset == asset).count();
        assert_eq!(sim.assets().live_instances(asset), placed, "{:?}", asset);
    }
    assert!(sim.structure_views().iter().all(|v| v.instance.is_some()));

    sim.remove_settlement(3);
    assert_eq!(sim.structure_count(), 0);
    assert_eq!(sim.assets_mut().release_unused(), AssetType::ALL.len());
}

#[test]
fn losing_progress_releases_structures() {
    let (mut sim, instancer) = settlement_sim();
    sim.sync_settlement(&ProjectProgress::new(5, 40.0, 50.0, 25)).unwrap();
    let full = sim.structure_count();
    sim.sync_settlement(&ProjectProgress::new(5, 40.0, 50.0, 0)).unwrap();
    let reduced = sim.structure_count();
    assert!(reduced < full);

    let layout = sim.generate_camp_layout(5, 0);
    assert_eq!(reduced, layout.visible_slots(0).count());
    assert_eq!(instancer.state.lock().unwrap().released.len(), full - reduced);
}

#[test]
fn moved_settlement_is_rebuilt_at_new_anchor() {
    let (mut sim, instancer) = settlement_sim();
    sim.sync_settlement(&ProjectProgress::new(9, -40.0, 35.0, 10)).unwrap();
    let before = structures_by_slot(&sim, 9);
    sim.sync_settlement(&ProjectProgress::new(9, -30.0, 45.0, 10)).unwrap();
    let after = structures_by_slot(&sim, 9);

    assert_eq!(sim.settlement_count(), 1);
    assert_eq!(before.len(), after.len());
    for (slot, t) in &before {
        let moved = after[slot];
        assert!((moved.position.x - t.position.x - 10.0).abs() < 1e-3);
        assert!((moved.position.z - t.position.z - 10.0).abs() < 1e-3);
    }
    assert_eq!(instancer.state.lock().unwrap().groups.len(), 2);
    assert_eq!(sim.camp_positions(), vec![CampPosition::new(-30.0, 45.0)]);
}

#[test]
fn settlements_without_instancer_still_place_structures() {
    let mut sim = default_sim();
    sim.sync_settlement(&ProjectProgress::new(1, -40.0, 35.0, 8)).unwrap();
    assert!(sim.structure_count() > 0);
    assert!(sim.structure_views().iter().all(|v| v.instance.is_none()));
    let placed = sim
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SimEvent::StructurePlaced { .. }))
        .count();
    assert_eq!(placed, sim.structure_count());
}

// ── Disposal ───────────────────────────────────────────────────────────

#[test]
fn dispose_species_stops_only_that_species() {
    let mut sim = default_sim();
    sim.dispose_species(Species::Fish);
    sim.dispose_species(Species::Fish);
    assert_eq!(sim.fish_count(), 0);
    assert_eq!(sim.attract_to_point(25.0, -15.0, 50.0), 0);

    let birds_before: Vec<_> = sim.creature_views().iter().map(|v| v.transform).collect();
    sim.update(0.5);
    let birds_after: Vec<_> = sim.creature_views().iter().map(|v| v.transform).collect();
    assert_ne!(birds_before, birds_after);
}

#[test]
fn dispose_is_idempotent_and_final() {
    let (mut sim, instancer) = settlement_sim();
    sim.sync_settlement(&ProjectProgress::new(2, -40.0, 35.0, 15)).unwrap();

    sim.dispose();
    sim.dispose();
    assert!(sim.is_disposed());
    assert_eq!(sim.bird_count() + sim.fish_count() + sim.sheep_count() + sim.herd_count(), 0);
    assert_eq!(sim.structure_count(), 0);
    assert_eq!(sim.settlement_count(), 0);
    assert!(sim.camp_positions().is_empty());
    assert!(instancer.state.lock().unwrap().live.is_empty());

    sim.update(1.0);
    assert_eq!(sim.sim_time(), 0.0);
    assert!(sim.sync_settlement(&ProjectProgress::new(2, -40.0, 35.0, 15)).is_none());
    assert_eq!(sim.world.len(), 0);
}
