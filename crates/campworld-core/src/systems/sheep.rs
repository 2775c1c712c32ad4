//! Sheep system - herds that roam, visit the lake and graze together
//!
//! Each herd is an entity with a [`Herd`] component holding the group's
//! center and wander target. Sheep never steer toward absolute positions:
//! each one follows an offset from its herd's center, which keeps the group
//! cohesive while individuals graze, idle, walk or drink.
//!
//! Herd lifecycle:
//!
//! 1. **Roaming**: every wander cycle the herd either picks a new valid
//!    wander target or (with `lake_chance`) a point on the shore. A roaming
//!    herd is pushed back out of the lake-avoidance band.
//! 2. **AtLake**: entered the moment a lake-bound herd's center crosses
//!    into the band. After the dwell the herd walks straight out and
//!    becomes Roaming again once clear of the band.
//!
//! Sheep read herd state from a snapshot taken at tick start.

use std::collections::HashMap;

use hecs::{Entity, World};
use rand::Rng;

use super::avoidance::Environment;
use super::movement::steer_toward;
use crate::components::{
    CreatureState, Herd, HerdState, Orientation, Sheep, SheepState, StateTimer, Transform, Vec3,
};
use crate::config::{SheepConfig, SheepWeights};
use crate::events::{EventLog, SimEvent};

/// Outcome of a sheep's state timer expiring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SheepPlan {
    /// Walk to a new offset from the herd center.
    Walk { offset: (f32, f32) },
    Graze,
    Idle,
    Drink,
}

impl SheepPlan {
    pub fn state(&self) -> SheepState {
        match self {
            SheepPlan::Walk { .. } => SheepState::Walking,
            SheepPlan::Graze => SheepState::Grazing,
            SheepPlan::Idle => SheepState::Idle,
            SheepPlan::Drink => SheepState::Drinking,
        }
    }
}

/// Herd center and state as of tick start.
#[derive(Debug, Clone, Copy)]
pub struct HerdSnapshot {
    pub center: Vec3,
    pub state: HerdState,
}

pub fn snapshot_herds(world: &World) -> HashMap<Entity, HerdSnapshot> {
    world
        .query::<&Herd>()
        .iter()
        .map(|(e, h)| {
            (
                e,
                HerdSnapshot {
                    center: h.center,
                    state: h.state,
                },
            )
        })
        .collect()
}

fn random_offset(spread: f32, rng: &mut impl Rng) -> (f32, f32) {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let r = spread.max(0.0) * rng.gen::<f32>().sqrt();
    (angle.cos() * r, angle.sin() * r)
}

/// Weighted pick gated by the herd's state.
pub fn choose_sheep_plan(config: &SheepConfig, herd_state: HerdState, rng: &mut impl Rng) -> SheepPlan {
    let weights: &SheepWeights = match herd_state {
        HerdState::Roaming => &config.roaming_weights,
        HerdState::AtLake => &config.lake_weights,
    };
    let mut roll = rng.gen::<f32>() * weights.total();

    if roll < weights.drink {
        return SheepPlan::Drink;
    }
    roll -= weights.drink;
    if roll < weights.graze {
        return SheepPlan::Graze;
    }
    roll -= weights.graze;
    if roll < weights.idle {
        return SheepPlan::Idle;
    }
    SheepPlan::Walk {
        offset: random_offset(config.spread, rng),
    }
}

fn duration_for(state: SheepState, config: &SheepConfig, rng: &mut impl Rng) -> f32 {
    match state {
        SheepState::Walking => config.walk_duration.sample(rng),
        SheepState::Grazing => config.graze_duration.sample(rng),
        SheepState::Idle => config.idle_duration.sample(rng),
        SheepState::Drinking => config.drink_duration.sample(rng),
    }
}

fn speed_for(state: SheepState, config: &SheepConfig) -> f32 {
    match state {
        SheepState::Walking => config.walk_speed,
        SheepState::Grazing => config.graze_speed,
        SheepState::Idle | SheepState::Drinking => 0.0,
    }
}

/// Spawn `herd_count` herds at valid points. Herds with no valid spawn
/// point are skipped.
pub fn spawn_herds(
    world: &mut World,
    env: &Environment,
    config: &SheepConfig,
    rng: &mut impl Rng,
    events: &mut EventLog,
) -> Vec<Entity> {
    let mut herds = Vec::with_capacity(config.herd_count);
    for index in 0..config.herd_count {
        let Some((x, z)) = env.sample_spawn_point(rng) else {
            log::warn!("herd {} found no valid spawn point; skipping", index);
            events.push(SimEvent::AvoidanceExhausted {
                entity: None,
                species: crate::components::Species::Sheep,
            });
            continue;
        };

        let center = Vec3::new(x, env.height(x, z), z);
        let herd_entity = world.spawn((
            Transform::at(center),
            Herd::new(center, config.wander_interval.sample(rng)),
        ));

        let size = rng.gen_range(config.herd_size_min..=config.herd_size_max);
        let mut members = Vec::with_capacity(size);
        for _ in 0..size {
            let offset = random_offset(config.spread, rng);
            let (sx, sz) = (x + offset.0, z + offset.1);
            let sheep = Sheep {
                herd: herd_entity,
                state: SheepState::Grazing,
                timer: StateTimer::new(config.graze_duration.sample(rng)),
                offset,
            };
            let transform = Transform::at(Vec3::new(sx, env.height(sx, sz), sz))
                .with_yaw(rng.gen_range(0.0..std::f32::consts::TAU));
            members.push(world.spawn((transform, sheep)));
        }

        if let Ok(mut herd) = world.get::<&mut Herd>(herd_entity) {
            herd.members = members;
        }
        herds.push(herd_entity);
    }
    herds
}

/// Gap kept between a sheep and the waterline.
const SHORE_MARGIN: f32 = 0.05;

/// Move a point along the lake radius to distance `keep` from the center.
fn push_from_center(env: &Environment, p: Vec3, keep: f32) -> Vec3 {
    let lake = env.lake;
    let dx = p.x - lake.center_x;
    let dz = p.z - lake.center_z;
    let d = (dx * dx + dz * dz).sqrt();
    if d <= 0.0 {
        return p;
    }
    let k = keep / d;
    Vec3::new(lake.center_x + dx * k, p.y, lake.center_z + dz * k)
}

/// Push a point out of the lake-avoidance band along the lake radius.
fn project_out_of_band(env: &Environment, p: Vec3) -> Vec3 {
    push_from_center(env, p, env.lake.radius + env.avoidance.lake_distance)
}

/// Keep a point on dry ground. Herd offsets near the shore can otherwise
/// reach past the waterline.
fn keep_ashore(env: &Environment, p: Vec3) -> Vec3 {
    if env.lake.distance_to_edge(p.x, p.z) < SHORE_MARGIN {
        push_from_center(env, p, env.lake.radius + SHORE_MARGIN)
    } else {
        p
    }
}

/// Advance every herd's group state by `dt` seconds.
pub fn herd_system(
    world: &mut World,
    env: &Environment,
    config: &SheepConfig,
    rng: &mut impl Rng,
    dt: f32,
    events: &mut EventLog,
) {
    let band = env.avoidance.lake_distance;

    for (entity, (transform, herd)) in world.query_mut::<(&mut Transform, &mut Herd)>() {
        match herd.state {
            HerdState::Roaming => {
                if herd.wander_timer.advance(dt) {
                    herd.wander_timer.reset(config.wander_interval.sample(rng));
                    if !herd.heading_to_lake {
                        pick_roaming_target(entity, herd, env, config, rng, events);
                    }
                }

                let (mut center, _) = steer_toward(herd.center, herd.target, config.herd_speed, dt);
                let edge = env.lake.distance_to_edge(center.x, center.z);
                if herd.heading_to_lake && edge <= band {
                    herd.state = HerdState::AtLake;
                    herd.heading_to_lake = false;
                    herd.leaving = false;
                    herd.lake_timer.reset(config.lake_dwell.sample(rng));
                    herd.target = center;
                    log::debug!("herd {:?}: Roaming -> AtLake", entity);
                    events.push(SimEvent::HerdStateChanged {
                        herd: entity,
                        from: HerdState::Roaming,
                        to: HerdState::AtLake,
                    });
                } else if !herd.heading_to_lake && edge < band {
                    center = project_out_of_band(env, center);
                }
                herd.center = center;
            }
            HerdState::AtLake => {
                if !herd.leaving {
                    if herd.lake_timer.advance(dt) {
                        herd.leaving = true;
                        let lake = env.lake;
                        let dx = herd.center.x - lake.center_x;
                        let dz = herd.center.z - lake.center_z;
                        let d = (dx * dx + dz * dz).sqrt().max(1e-3);
                        let out = lake.radius + band + config.spread;
                        herd.target = Vec3::new(
                            lake.center_x + dx / d * out,
                            herd.center.y,
                            lake.center_z + dz / d * out,
                        );
                    }
                } else {
                    let (center, _) = steer_toward(herd.center, herd.target, config.herd_speed, dt);
                    herd.center = center;
                    if env.lake.distance_to_edge(center.x, center.z) > band {
                        herd.state = HerdState::Roaming;
                        herd.leaving = false;
                        herd.target = center;
                        herd.wander_timer.reset(config.wander_interval.min);
                        log::debug!("herd {:?}: AtLake -> Roaming", entity);
                        events.push(SimEvent::HerdStateChanged {
                            herd: entity,
                            from: HerdState::AtLake,
                            to: HerdState::Roaming,
                        });
                    }
                }
            }
        }

        herd.center.y = env.height(herd.center.x, herd.center.z);
        transform.position = herd.center;
    }
}

fn pick_roaming_target(
    entity: Entity,
    herd: &mut Herd,
    env: &Environment,
    config: &SheepConfig,
    rng: &mut impl Rng,
    events: &mut EventLog,
) {
    let to_lake = rng.gen::<f32>() < config.lake_chance;
    let picked = if to_lake {
        env.sample_shore_point(rng, config.shore_offset)
    } else {
        env.sample_wander_target(rng, herd.center.x, herd.center.z, config.wander_radius)
    };

    match picked {
        Some((x, z)) => {
            herd.target = Vec3::new(x, env.height(x, z), z);
            herd.heading_to_lake = to_lake;
        }
        None => {
            herd.target = herd.center;
            events.push(SimEvent::AvoidanceExhausted {
                entity: Some(entity),
                species: crate::components::Species::Sheep,
            });
        }
    }
}

/// Advance every sheep by `dt` seconds against the tick-start herd snapshot.
pub fn sheep_system(
    world: &mut World,
    env: &Environment,
    config: &SheepConfig,
    rng: &mut impl Rng,
    dt: f32,
    herds: &HashMap<Entity, HerdSnapshot>,
    events: &mut EventLog,
) {
    for (entity, (transform, sheep)) in world.query_mut::<(&mut Transform, &mut Sheep)>() {
        let Some(herd) = herds.get(&sheep.herd) else {
            continue;
        };

        if sheep.timer.advance(dt) {
            let from = sheep.state;
            let plan = choose_sheep_plan(config, herd.state, rng);
            if let SheepPlan::Walk { offset } = plan {
                sheep.offset = offset;
            }
            sheep.state = plan.state();
            sheep.timer.reset(duration_for(sheep.state, config, rng));
            if from != sheep.state {
                log::debug!("sheep {:?}: {:?} -> {:?}", entity, from, sheep.state);
                events.push(SimEvent::StateChanged {
                    entity,
                    from: CreatureState::Sheep(from),
                    to: CreatureState::Sheep(sheep.state),
                });
            }
        }

        let goal = keep_ashore(
            env,
            Vec3::new(herd.center.x + sheep.offset.0, 0.0, herd.center.z + sheep.offset.1),
        );
        let current = transform.position;
        let mut speed = speed_for(sheep.state, config);
        if current.horizontal_distance(&goal) > config.catch_up_distance {
            speed = config.catch_up_speed;
        }

        let (next, _) = steer_toward(current, goal, speed, dt);
        let mut next = keep_ashore(env, next);
        next.y = env.height(next.x, next.z);
        let dx = next.x - current.x;
        let dz = next.z - current.z;
        if dx * dx + dz * dz > 1e-8 {
            transform.orientation = Orientation::from_yaw(Orientation::yaw_toward(dx, dz));
        }
        transform.position = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AvoidanceConfig;
    use campworld_logic::rng::SeededRandom;
    use campworld_logic::terrain::{Terrain, TerrainSource};

    #[test]
    fn test_plan_gated_by_herd_state() {
        let config = SheepConfig::default();
        let mut rng = SeededRandom::new(3);
        for _ in 0..500 {
            let roaming = choose_sheep_plan(&config, HerdState::Roaming, &mut rng);
            assert_ne!(roaming, SheepPlan::Drink);
            let at_lake = choose_sheep_plan(&config, HerdState::AtLake, &mut rng);
            assert_ne!(at_lake, SheepPlan::Graze);
        }
    }

    #[test]
    fn test_roaming_weights_roughly_hold() {
        let config = SheepConfig::default();
        let mut rng = SeededRandom::new(10);
        let n = 4000;
        let grazing = (0..n)
            .filter(|_| choose_sheep_plan(&config, HerdState::Roaming, &mut rng) == SheepPlan::Graze)
            .count();
        let share = grazing as f32 / n as f32;
        assert!((0.45..0.55).contains(&share), "graze share {share}");
    }

    #[test]
    fn test_lost_sheep_catch_up() {
        let terrain = Terrain::default();
        let avoidance = AvoidanceConfig::default();
        let env = Environment::new(&terrain, &terrain.lake, &[], &avoidance);
        let config = SheepConfig::default();
        let mut rng = SeededRandom::new(6);
        let mut world = World::new();
        let mut events = EventLog::new(16);

        let herd = world.spawn((Transform::default(), Herd::new(Vec3::new(-50.0, 0.0, 50.0), 10.0)));
        let sheep = world.spawn((
            Transform::at(Vec3::new(-60.0, 0.0, 50.0)),
            Sheep {
                herd,
                state: SheepState::Idle,
                timer: StateTimer::new(100.0),
                offset: (0.0, 0.0),
            },
        ));

        let herds = snapshot_herds(&world);
        sheep_system(&mut world, &env, &config, &mut rng, 1.0, &herds, &mut events);
        let t = world.get::<&Transform>(sheep).unwrap();
        assert!((t.position.x - (-60.0 + config.catch_up_speed)).abs() < 1e-4);
        assert!((t.position.y - terrain.height(t.position.x, t.position.z)).abs() < 1e-4);
    }

    #[test]
    fn test_roaming_herd_pushed_out_of_band() {
        let terrain = Terrain::default();
        let avoidance = AvoidanceConfig::default();
        let env = Environment::new(&terrain, &terrain.lake, &[], &avoidance);
        let config = SheepConfig::default();
        let mut rng = SeededRandom::new(6);
        let mut world = World::new();
        let mut events = EventLog::new(16);
        let lake = terrain.lake;

        let start = Vec3::new(lake.center_x + lake.radius + 10.0, 0.0, lake.center_z);
        let mut herd = Herd::new(start, 100.0);
        herd.target = Vec3::new(lake.center_x, 0.0, lake.center_z);
        let e = world.spawn((Transform::at(start), herd));

        for _ in 0..50 {
            herd_system(&mut world, &env, &config, &mut rng, 1.0, &mut events);
            let h = world.get::<&Herd>(e).unwrap();
            assert_eq!(h.state, HerdState::Roaming);
            assert!(lake.distance_to_edge(h.center.x, h.center.z) >= avoidance.lake_distance - 1e-3);
        }
    }

    #[test]
    fn test_lake_visit_cycle() {
        let terrain = Terrain::default();
        let avoidance = AvoidanceConfig::default();
        let env = Environment::new(&terrain, &terrain.lake, &[], &avoidance);
        let config = SheepConfig::default();
        let mut rng = SeededRandom::new(6);
        let mut world = World::new();
        let mut events = EventLog::new(64);
        let lake = terrain.lake;

        let start = Vec3::new(lake.center_x, 0.0, lake.center_z + lake.radius + 12.0);
        let mut herd = Herd::new(start, 100.0);
        herd.heading_to_lake = true;
        herd.target = Vec3::new(lake.center_x, 0.0, lake.center_z + lake.radius + config.shore_offset);
        let e = world.spawn((Transform::at(start), herd));

        let mut entered = false;
        let mut left = false;
        for _ in 0..400 {
            herd_system(&mut world, &env, &config, &mut rng, 0.5, &mut events);
            let h = world.get::<&Herd>(e).unwrap();
            let edge = lake.distance_to_edge(h.center.x, h.center.z);
            if h.is_at_lake() {
                entered = true;
            } else {
                assert!(edge >= avoidance.lake_distance - 1e-3);
                if entered {
                    left = true;
                    break;
                }
            }
        }
        assert!(entered && left);
    }

    #[test]
    fn test_sheep_at_lake_stay_on_shore() {
        let terrain = Terrain::default();
        let avoidance = AvoidanceConfig::default();
        let env = Environment::new(&terrain, &terrain.lake, &[], &avoidance);
        let config = SheepConfig::default();
        let mut rng = SeededRandom::new(9);
        let mut world = World::new();
        let mut events = EventLog::new(16);
        let lake = terrain.lake;

        // Herd parked at the shore target, offset pointing at the water.
        let center = Vec3::new(lake.center_x + lake.radius + config.shore_offset, 0.0, lake.center_z);
        let mut herd = Herd::new(center, 100.0);
        herd.state = HerdState::AtLake;
        let herd = world.spawn((Transform::at(center), herd));
        let sheep = world.spawn((
            Transform::at(center),
            Sheep {
                herd,
                state: SheepState::Walking,
                timer: StateTimer::new(100.0),
                offset: (-config.spread, 0.0),
            },
        ));

        let herds = snapshot_herds(&world);
        for _ in 0..5 {
            sheep_system(&mut world, &env, &config, &mut rng, 5.0, &herds, &mut events);
            let t = world.get::<&Transform>(sheep).unwrap();
            assert!(lake.distance_to_edge(t.position.x, t.position.z) >= 0.0);
        }
        let t = world.get::<&Transform>(sheep).unwrap();
        assert!(t.position.x < center.x);
    }
}
