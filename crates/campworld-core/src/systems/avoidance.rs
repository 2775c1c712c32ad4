//! Environmental exclusion tests and bounded point searches.
//!
//! A candidate point is rejected if it is outside the terrain (minus a
//! margin), too close to the waterline, too close to any camp, or in forest
//! denser than the configured maximum. Searches draw candidates until one
//! passes or the retry budget runs out; an exhausted search returns `None`
//! and the caller leaves its entity where it is.

use campworld_logic::lake::LakeConfig;
use campworld_logic::terrain::TerrainSource;
use rand::Rng;

use crate::camps::CampPosition;
use crate::config::AvoidanceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    OutOfBounds,
    NearLake,
    NearCamp,
    DenseForest,
}

/// Read-only view of the world captured at tick start.
pub struct Environment<'a> {
    pub terrain: &'a dyn TerrainSource,
    pub lake: &'a LakeConfig,
    pub camps: &'a [CampPosition],
    pub avoidance: &'a AvoidanceConfig,
}

impl<'a> Environment<'a> {
    pub fn new(
        terrain: &'a dyn TerrainSource,
        lake: &'a LakeConfig,
        camps: &'a [CampPosition],
        avoidance: &'a AvoidanceConfig,
    ) -> Self {
        Self {
            terrain,
            lake,
            camps,
            avoidance,
        }
    }

    pub fn height(&self, x: f32, z: f32) -> f32 {
        self.terrain.height(x, z)
    }

    pub fn in_bounds(&self, x: f32, z: f32) -> bool {
        self.terrain.in_bounds(x, z, self.avoidance.bounds_margin)
    }

    pub fn near_camp(&self, x: f32, z: f32) -> bool {
        self.camps
            .iter()
            .any(|c| c.distance_to(x, z) < self.avoidance.camp_distance)
    }

    pub fn too_dense(&self, x: f32, z: f32) -> bool {
        self.terrain
            .forest_density(x, z)
            .map(|d| d > self.avoidance.max_forest_density)
            .unwrap_or(false)
    }

    /// Full check for land creatures.
    pub fn check(&self, x: f32, z: f32) -> Result<(), Rejection> {
        if !self.in_bounds(x, z) {
            return Err(Rejection::OutOfBounds);
        }
        if self.lake.distance_to_edge(x, z) < self.avoidance.lake_distance {
            return Err(Rejection::NearLake);
        }
        if self.near_camp(x, z) {
            return Err(Rejection::NearCamp);
        }
        if self.too_dense(x, z) {
            return Err(Rejection::DenseForest);
        }
        Ok(())
    }

    /// Check for shore targets: the lake test is skipped.
    pub fn check_shore(&self, x: f32, z: f32) -> Result<(), Rejection> {
        if !self.in_bounds(x, z) {
            return Err(Rejection::OutOfBounds);
        }
        if self.near_camp(x, z) {
            return Err(Rejection::NearCamp);
        }
        if self.too_dense(x, z) {
            return Err(Rejection::DenseForest);
        }
        Ok(())
    }

    /// Draw candidates from `sample` until `accept` passes, within the retry budget.
    pub fn find_point<R, S, A>(&self, rng: &mut R, mut sample: S, accept: A) -> Option<(f32, f32)>
    where
        R: Rng,
        S: FnMut(&mut R) -> (f32, f32),
        A: Fn(f32, f32) -> bool,
    {
        for _ in 0..self.avoidance.retry_budget {
            let (x, z) = sample(rng);
            if accept(x, z) {
                return Some((x, z));
            }
        }
        None
    }

    /// Anywhere on the terrain that passes [`Self::check`].
    pub fn sample_spawn_point(&self, rng: &mut impl Rng) -> Option<(f32, f32)> {
        let limit = (self.terrain.half_extent() - self.avoidance.bounds_margin).max(0.0);
        self.find_point(
            rng,
            |r| {
                if limit <= 0.0 {
                    (0.0, 0.0)
                } else {
                    (r.gen_range(-limit..limit), r.gen_range(-limit..limit))
                }
            },
            |x, z| self.check(x, z).is_ok(),
        )
    }

    /// A point within `radius` of `(x, z)` that passes [`Self::check`].
    pub fn sample_wander_target(&self, rng: &mut impl Rng, x: f32, z: f32, radius: f32) -> Option<(f32, f32)> {
        self.find_point(
            rng,
            |r| {
                let angle = r.gen_range(0.0..std::f32::consts::TAU);
                let dist = radius.max(0.0) * r.gen::<f32>().sqrt();
                (x + angle.cos() * dist, z + angle.sin() * dist)
            },
            |px, pz| self.check(px, pz).is_ok(),
        )
    }

    /// A point `offset` beyond the waterline that passes [`Self::check_shore`].
    pub fn sample_shore_point(&self, rng: &mut impl Rng, offset: f32) -> Option<(f32, f32)> {
        let ring = self.lake.radius + offset;
        let (cx, cz) = (self.lake.center_x, self.lake.center_z);
        self.find_point(
            rng,
            |r| {
                let angle = r.gen_range(0.0..std::f32::consts::TAU);
                (cx + angle.cos() * ring, cz + angle.sin() * ring)
            },
            |x, z| self.check_shore(x, z).is_ok(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campworld_logic::rng::SeededRandom;
    use campworld_logic::terrain::Terrain;

    fn env_parts() -> (Terrain, AvoidanceConfig) {
        (Terrain::default(), AvoidanceConfig::default())
    }

    #[test]
    fn test_check_rejections() {
        let (terrain, avoidance) = env_parts();
        let camps = [CampPosition::new(-60.0, 60.0)];
        let env = Environment::new(&terrain, &terrain.lake, &camps, &avoidance);

        assert_eq!(env.check(99.0, 0.0), Err(Rejection::OutOfBounds));
        assert_eq!(
            env.check(terrain.lake.center_x, terrain.lake.center_z),
            Err(Rejection::NearLake)
        );
        assert_eq!(env.check(-60.0, 65.0), Err(Rejection::NearCamp));
    }

    #[test]
    fn test_spawn_points_pass_all_checks() {
        let (terrain, avoidance) = env_parts();
        let camps = [CampPosition::new(-30.0, -30.0), CampPosition::new(40.0, 50.0)];
        let env = Environment::new(&terrain, &terrain.lake, &camps, &avoidance);
        let mut rng = SeededRandom::new(11);
        let mut found = 0;
        for _ in 0..200 {
            if let Some((x, z)) = env.sample_spawn_point(&mut rng) {
                found += 1;
                assert!(terrain.lake.distance_to_edge(x, z) >= avoidance.lake_distance);
                for c in &camps {
                    assert!(c.distance_to(x, z) >= avoidance.camp_distance);
                }
            }
        }
        assert!(found > 150);
    }

    #[test]
    fn test_exhausted_budget_returns_none() {
        let (terrain, _) = env_parts();
        let avoidance = AvoidanceConfig {
            retry_budget: 0,
            ..Default::default()
        };
        let env = Environment::new(&terrain, &terrain.lake, &[], &avoidance);
        let mut rng = SeededRandom::new(1);
        assert!(env.sample_spawn_point(&mut rng).is_none());
    }

    #[test]
    fn test_shore_points_sit_in_band() {
        let (terrain, avoidance) = env_parts();
        let env = Environment::new(&terrain, &terrain.lake, &[], &avoidance);
        let mut rng = SeededRandom::new(5);
        let (x, z) = env.sample_shore_point(&mut rng, 3.0).unwrap();
        let d = terrain.lake.distance_to_edge(x, z);
        assert!((d - 3.0).abs() < 1e-3);
        assert!(d < avoidance.lake_distance);
    }

    #[test]
    fn test_wander_targets_avoid_lake_and_camps() {
        let (terrain, avoidance) = env_parts();
        let lake = terrain.lake;
        // Start just outside the band, with a camp between the herd and open ground.
        let (sx, sz) = (lake.center_x, lake.center_z + lake.radius + 8.0);
        let camps = [CampPosition::new(sx + 12.0, sz + 6.0), CampPosition::new(sx - 15.0, sz - 2.0)];
        let env = Environment::new(&terrain, &lake, &camps, &avoidance);
        let mut rng = SeededRandom::new(17);

        let mut found = 0;
        for _ in 0..300 {
            if let Some((x, z)) = env.sample_wander_target(&mut rng, sx, sz, 25.0) {
                found += 1;
                assert!((x - sx).hypot(z - sz) <= 25.0 + 1e-3);
                assert!(env.in_bounds(x, z));
                assert!(lake.distance_to_edge(x, z) >= avoidance.lake_distance);
                for c in &camps {
                    assert!(c.distance_to(x, z) >= avoidance.camp_distance);
                }
            }
        }
        assert!(found > 200);
    }
}
