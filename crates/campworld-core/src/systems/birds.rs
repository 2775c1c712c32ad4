//! Bird system - flight between trees, the lake and open sky
//!
//! Birds are always in one of three states:
//!
//! - **Flying**: following a [`FlightPath`]. The state timer tracks flight
//!   progress, so the flight lands exactly when the timer expires.
//! - **Perched**: sitting in a tree, both renderables hidden.
//! - **Floating**: resting on the water, floating renderable shown, pitch
//!   and roll flattened.
//!
//! The destination class is chosen when a flight starts and resolves on
//! landing. Open-sky flights chain straight into a new flight.

use hecs::{Entity, World};
use rand::Rng;

use super::avoidance::Environment;
use crate::components::{
    Bird, BirdDestination, BirdState, BirdVisuals, CreatureState, FlightPath, Orientation,
    StateTimer, Transform, Vec3,
};
use crate::config::BirdConfig;
use crate::events::{EventLog, SimEvent};

/// Next flight chosen on take-off or after an open-sky leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BirdPlan {
    /// Land in a tree at the given perch point.
    Perch(Vec3),
    /// Land on the water surface.
    Float(Vec3),
    /// Fly through this point and pick again.
    Sky(Vec3),
}

impl BirdPlan {
    pub fn target(&self) -> Vec3 {
        match *self {
            BirdPlan::Perch(t) | BirdPlan::Float(t) | BirdPlan::Sky(t) => t,
        }
    }

    pub fn destination(&self) -> BirdDestination {
        match self {
            BirdPlan::Perch(_) => BirdDestination::Perch,
            BirdPlan::Float(_) => BirdDestination::Float,
            BirdPlan::Sky(_) => BirdDestination::Sky,
        }
    }
}

fn random_xz(env: &Environment, rng: &mut impl Rng) -> (f32, f32) {
    let limit = (env.terrain.half_extent() - env.avoidance.bounds_margin).max(1.0);
    (rng.gen_range(-limit..limit), rng.gen_range(-limit..limit))
}

fn tree_target(env: &Environment, config: &BirdConfig, rng: &mut impl Rng) -> Option<Vec3> {
    for _ in 0..config.tree_attempts {
        let (x, z) = random_xz(env, rng);
        let dense = env
            .terrain
            .forest_density(x, z)
            .map(|d| d >= config.min_tree_density)
            .unwrap_or(false);
        if dense {
            return Some(Vec3::new(x, env.height(x, z) + config.perch_height, z));
        }
    }
    None
}

fn lake_target(env: &Environment, config: &BirdConfig, rng: &mut impl Rng) -> Vec3 {
    let lake = env.lake;
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let r = lake.radius * config.lake_target_fraction * rng.gen::<f32>().sqrt();
    Vec3::new(
        lake.center_x + angle.cos() * r,
        lake.water_level(),
        lake.center_z + angle.sin() * r,
    )
}

fn sky_target(env: &Environment, config: &BirdConfig, rng: &mut impl Rng) -> Vec3 {
    let (x, z) = random_xz(env, rng);
    Vec3::new(x, env.height(x, z) + config.sky_altitude.sample(rng), z)
}

/// Weighted pick: tree, lake or open sky. A failed tree search falls back to sky.
pub fn choose_bird_plan(env: &Environment, config: &BirdConfig, rng: &mut impl Rng) -> BirdPlan {
    let total = config.tree_weight + config.lake_weight + config.sky_weight;
    let roll = rng.gen::<f32>() * total;

    if roll < config.tree_weight {
        if let Some(perch) = tree_target(env, config, rng) {
            return BirdPlan::Perch(perch);
        }
        return BirdPlan::Sky(sky_target(env, config, rng));
    }
    if roll < config.tree_weight + config.lake_weight {
        return BirdPlan::Float(lake_target(env, config, rng));
    }
    BirdPlan::Sky(sky_target(env, config, rng))
}

fn start_flight(bird: &mut Bird, from: Vec3, plan: BirdPlan, config: &BirdConfig) {
    let path = FlightPath::new(from, plan.target(), config.max_arc_height);
    bird.timer = StateTimer::new(path.duration(config.speed, config.min_flight_time));
    bird.flight = Some(path);
    bird.destination = plan.destination();
    bird.state = BirdState::Flying;
}

/// Spawn `config.count` birds in flight at random altitudes.
pub fn spawn_birds(
    world: &mut World,
    env: &Environment,
    config: &BirdConfig,
    rng: &mut impl Rng,
) -> Vec<Entity> {
    let mut spawned = Vec::with_capacity(config.count);
    for _ in 0..config.count {
        let start = sky_target(env, config, rng);
        let plan = choose_bird_plan(env, config, rng);
        let mut bird = Bird {
            state: BirdState::Flying,
            timer: StateTimer::default(),
            flight: None,
            destination: BirdDestination::Sky,
            visuals: BirdVisuals::FLYING,
        };
        start_flight(&mut bird, start, plan, config);
        spawned.push(world.spawn((Transform::at(start), bird)));
    }
    spawned
}

/// Advance every bird by `dt` seconds.
pub fn bird_system(
    world: &mut World,
    env: &Environment,
    config: &BirdConfig,
    rng: &mut impl Rng,
    dt: f32,
    events: &mut EventLog,
) {
    for (entity, (transform, bird)) in world.query_mut::<(&mut Transform, &mut Bird)>() {
        match bird.state {
            BirdState::Flying => {
                let landed = bird.timer.advance(dt);
                let Some(path) = bird.flight else {
                    // No path: pick one from where we are.
                    let plan = choose_bird_plan(env, config, rng);
                    start_flight(bird, transform.position, plan, config);
                    continue;
                };

                if landed {
                    transform.position = path.end;
                    land(entity, transform, bird, env, config, rng, events);
                    continue;
                }

                let t = bird.timer.progress();
                let mut pos = path.position_at(t);
                let floor = env.height(pos.x, pos.z) + config.clearance;
                if pos.y < floor {
                    pos.y = floor;
                }
                transform.orientation =
                    path.orientation_at(t, transform.orientation.yaw, config.max_pitch, config.max_bank);
                transform.position = pos;
            }
            BirdState::Perched | BirdState::Floating => {
                if bird.timer.advance(dt) {
                    let from = bird.state;
                    let plan = choose_bird_plan(env, config, rng);
                    start_flight(bird, transform.position, plan, config);
                    bird.visuals = BirdVisuals::FLYING;
                    report(entity, from, BirdState::Flying, bird.visuals, events);
                }
            }
        }
    }
}

fn land(
    entity: Entity,
    transform: &mut Transform,
    bird: &mut Bird,
    env: &Environment,
    config: &BirdConfig,
    rng: &mut impl Rng,
    events: &mut EventLog,
) {
    match bird.destination {
        BirdDestination::Perch => {
            bird.state = BirdState::Perched;
            bird.visuals = BirdVisuals::HIDDEN;
            bird.timer.reset(config.perch_dwell.sample(rng));
            bird.flight = None;
            transform.orientation = transform.orientation.flattened();
            report(entity, BirdState::Flying, BirdState::Perched, bird.visuals, events);
        }
        BirdDestination::Float => {
            bird.state = BirdState::Floating;
            bird.visuals = BirdVisuals::FLOATING;
            bird.timer.reset(config.float_dwell.sample(rng));
            bird.flight = None;
            transform.orientation = transform.orientation.flattened();
            report(entity, BirdState::Flying, BirdState::Floating, bird.visuals, events);
        }
        BirdDestination::Sky => {
            let plan = choose_bird_plan(env, config, rng);
            start_flight(bird, transform.position, plan, config);
        }
    }
}

fn report(entity: Entity, from: BirdState, to: BirdState, visuals: BirdVisuals, events: &mut EventLog) {
    log::debug!("bird {:?}: {:?} -> {:?}", entity, from, to);
    events.push(SimEvent::StateChanged {
        entity,
        from: CreatureState::Bird(from),
        to: CreatureState::Bird(to),
    });
    events.push(SimEvent::VisualSwap { entity, visuals });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AvoidanceConfig;
    use campworld_logic::rng::SeededRandom;
    use campworld_logic::terrain::Terrain;

    #[test]
    fn test_plan_weights_roughly_hold() {
        let terrain = Terrain::default();
        let avoidance = AvoidanceConfig::default();
        let env = Environment::new(&terrain, &terrain.lake, &[], &avoidance);
        let config = BirdConfig::default();
        let mut rng = SeededRandom::new(8);

        let mut lake = 0;
        let n = 2000;
        for _ in 0..n {
            if let BirdPlan::Float(t) = choose_bird_plan(&env, &config, &mut rng) {
                lake += 1;
                assert!(terrain.lake.distance_to_center(t.x, t.z) <= terrain.lake.radius * 0.7 + 1e-3);
                assert_eq!(t.y, terrain.lake.water_level());
            }
        }
        let share = lake as f32 / n as f32;
        assert!((0.28..0.42).contains(&share), "lake share {share}");
    }

    #[test]
    fn test_no_forest_falls_back_to_sky() {
        struct Flat;
        impl campworld_logic::terrain::TerrainSource for Flat {
            fn height(&self, _x: f32, _z: f32) -> f32 {
                0.0
            }
            fn half_extent(&self) -> f32 {
                50.0
            }
        }
        let lake = campworld_logic::lake::LakeConfig::default();
        let avoidance = AvoidanceConfig::default();
        let env = Environment::new(&Flat, &lake, &[], &avoidance);
        let config = BirdConfig {
            tree_weight: 1.0,
            lake_weight: 0.0,
            sky_weight: 0.0,
            ..Default::default()
        };
        let mut rng = SeededRandom::new(2);
        for _ in 0..50 {
            assert!(matches!(choose_bird_plan(&env, &config, &mut rng), BirdPlan::Sky(_)));
        }
    }

    #[test]
    fn test_perch_hides_both_visuals() {
        let terrain = Terrain::default();
        let avoidance = AvoidanceConfig::default();
        let env = Environment::new(&terrain, &terrain.lake, &[], &avoidance);
        let config = BirdConfig::default();
        let mut rng = SeededRandom::new(4);
        let mut world = World::new();
        let mut events = EventLog::new(64);

        let start = Vec3::new(-50.0, 20.0, 50.0);
        let mut bird = Bird {
            state: BirdState::Flying,
            timer: StateTimer::default(),
            flight: None,
            destination: BirdDestination::Sky,
            visuals: BirdVisuals::FLYING,
        };
        start_flight(&mut bird, start, BirdPlan::Perch(Vec3::new(-40.0, 15.0, 50.0)), &config);
        let e = world.spawn((Transform::at(start), bird));

        bird_system(&mut world, &env, &config, &mut rng, 1000.0, &mut events);
        let bird = world.get::<&Bird>(e).unwrap();
        assert_eq!(bird.state, BirdState::Perched);
        assert_eq!(bird.visuals, BirdVisuals::HIDDEN);
        assert!(config.perch_dwell.contains(bird.timer.duration));
        drop(bird);

        let drained = events.drain();
        assert!(drained.contains(&SimEvent::VisualSwap {
            entity: e,
            visuals: BirdVisuals::HIDDEN
        }));
    }
}
