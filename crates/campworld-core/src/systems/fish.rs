//! Fish system - swimming, darting and resting inside the lake

use hecs::{Entity, World};
use rand::Rng;

use super::avoidance::Environment;
use super::movement::steer_toward;
use crate::components::{CreatureState, Fish, FishState, Orientation, StateTimer, Transform, Vec3};
use crate::config::FishConfig;
use crate::events::{EventLog, SimEvent};

/// Outcome of a fish's state timer expiring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FishPlan {
    Swim(Vec3),
    Dart(Vec3),
    Rest,
}

/// Valid vertical range at `(x, z)`: above the lakebed, below the surface.
///
/// Where the water is too shallow for both margins the band collapses to
/// its midpoint.
pub fn depth_band(env: &Environment, config: &FishConfig, x: f32, z: f32) -> (f32, f32) {
    let lo = env.height(x, z) + config.depth_margin;
    let hi = env.lake.water_level() - config.depth_margin;
    if lo > hi {
        let mid = (lo + hi) * 0.5;
        (mid, mid)
    } else {
        (lo, hi)
    }
}

fn clamp_to_band(env: &Environment, config: &FishConfig, p: Vec3) -> Vec3 {
    let (lo, hi) = depth_band(env, config, p.x, p.z);
    p.with_y(p.y.clamp(lo, hi))
}

/// Keep a fish inside the swimmable disc.
fn clamp_to_lake(env: &Environment, config: &FishConfig, p: Vec3) -> Vec3 {
    let lake = env.lake;
    let max_r = lake.radius * config.radius_fraction;
    let dx = p.x - lake.center_x;
    let dz = p.z - lake.center_z;
    let d = (dx * dx + dz * dz).sqrt();
    if d <= max_r || d <= 0.0 {
        return p;
    }
    let k = max_r / d;
    Vec3::new(lake.center_x + dx * k, p.y, lake.center_z + dz * k)
}

/// Random point in the swimmable disc, at a random depth in the band.
pub fn random_lake_point(env: &Environment, config: &FishConfig, rng: &mut impl Rng) -> Vec3 {
    let lake = env.lake;
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let r = lake.radius * config.radius_fraction * rng.gen::<f32>().sqrt();
    let x = lake.center_x + angle.cos() * r;
    let z = lake.center_z + angle.sin() * r;
    let (lo, hi) = depth_band(env, config, x, z);
    let y = if hi > lo { rng.gen_range(lo..hi) } else { lo };
    Vec3::new(x, y, z)
}

/// Weighted pick: dart, rest, otherwise swim.
pub fn choose_fish_plan(env: &Environment, config: &FishConfig, rng: &mut impl Rng) -> FishPlan {
    let roll = rng.gen::<f32>();
    if roll < config.dart_chance {
        FishPlan::Dart(random_lake_point(env, config, rng))
    } else if roll < config.dart_chance + config.rest_chance {
        FishPlan::Rest
    } else {
        FishPlan::Swim(random_lake_point(env, config, rng))
    }
}

fn speed_for(state: FishState, config: &FishConfig) -> f32 {
    match state {
        FishState::Swimming => config.swim_speed,
        FishState::Darting => config.dart_speed,
        FishState::Resting => 0.0,
    }
}

fn apply_plan(fish: &mut Fish, plan: FishPlan, config: &FishConfig, rng: &mut impl Rng) {
    match plan {
        FishPlan::Swim(target) => {
            fish.state = FishState::Swimming;
            fish.target = target;
            fish.timer.reset(config.swim_duration.sample(rng));
        }
        FishPlan::Dart(target) => {
            fish.state = FishState::Darting;
            fish.target = target;
            fish.timer.reset(config.dart_duration.sample(rng));
        }
        FishPlan::Rest => {
            fish.state = FishState::Resting;
            fish.timer.reset(config.rest_duration.sample(rng));
        }
    }
}

pub fn spawn_fish(
    world: &mut World,
    env: &Environment,
    config: &FishConfig,
    rng: &mut impl Rng,
) -> Vec<Entity> {
    let mut spawned = Vec::with_capacity(config.count);
    for _ in 0..config.count {
        let position = random_lake_point(env, config, rng);
        let fish = Fish {
            state: FishState::Swimming,
            timer: StateTimer::new(config.swim_duration.sample(rng)),
            target: random_lake_point(env, config, rng),
        };
        spawned.push(world.spawn((Transform::at(position), fish)));
    }
    spawned
}

/// Advance every fish by `dt` seconds.
pub fn fish_system(
    world: &mut World,
    env: &Environment,
    config: &FishConfig,
    rng: &mut impl Rng,
    dt: f32,
    events: &mut EventLog,
) {
    for (entity, (transform, fish)) in world.query_mut::<(&mut Transform, &mut Fish)>() {
        if fish.timer.advance(dt) {
            let from = fish.state;
            let plan = choose_fish_plan(env, config, rng);
            apply_plan(fish, plan, config, rng);
            if from != fish.state {
                log::debug!("fish {:?}: {:?} -> {:?}", entity, from, fish.state);
                events.push(SimEvent::StateChanged {
                    entity,
                    from: CreatureState::Fish(from),
                    to: CreatureState::Fish(fish.state),
                });
            }
        }

        let speed = speed_for(fish.state, config);
        if speed <= 0.0 {
            transform.position = clamp_to_band(env, config, transform.position);
            continue;
        }

        let current = transform.position;
        let (mut next, _) = steer_toward(current, fish.target, speed, dt);
        let dy = fish.target.y - current.y;
        let max_dy = speed * dt;
        next.y = current.y + dy.clamp(-max_dy, max_dy);
        next = clamp_to_band(env, config, clamp_to_lake(env, config, next));

        let dx = next.x - current.x;
        let dz = next.z - current.z;
        if dx * dx + dz * dz > 1e-8 {
            transform.orientation = Orientation::from_yaw(Orientation::yaw_toward(dx, dz));
        }
        transform.position = next;
    }
}

/// Force every fish within `radius` of `(x, z)` to dart toward it.
///
/// The target is `(x, z)` pulled into the swimmable disc. It keeps the
/// fish's depth, clamped into the band at that pulled-in point.
/// Returns how many fish were attracted.
#[allow(clippy::too_many_arguments)]
pub fn attract_fish(
    world: &mut World,
    env: &Environment,
    config: &FishConfig,
    rng: &mut impl Rng,
    x: f32,
    z: f32,
    radius: f32,
    events: &mut EventLog,
) -> usize {
    let point = Vec3::new(x, 0.0, z);
    let goal = clamp_to_lake(env, config, point);
    let (lo, hi) = depth_band(env, config, goal.x, goal.z);
    let mut attracted = 0;

    for (entity, (transform, fish)) in world.query_mut::<(&Transform, &mut Fish)>() {
        if transform.position.horizontal_distance(&point) > radius {
            continue;
        }
        let from = fish.state;
        fish.state = FishState::Darting;
        fish.target = goal.with_y(transform.position.y.clamp(lo, hi));
        fish.timer.reset(config.dart_duration.sample(rng));
        attracted += 1;

        if from != FishState::Darting {
            log::debug!("fish {:?}: {:?} -> Darting (attracted)", entity, from);
            events.push(SimEvent::StateChanged {
                entity,
                from: CreatureState::Fish(from),
                to: CreatureState::Fish(FishState::Darting),
            });
        }
    }
    attracted
}
