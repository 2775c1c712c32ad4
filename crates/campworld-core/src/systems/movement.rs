//! Shared movement primitives: capped steering and parametric flight.

use crate::components::{FlightPath, Orientation, Vec3};

/// Step from `current` toward `target` by at most `speed * dt`.
///
/// Returns the new position and whether the target was reached. Only x/z
/// are steered; the caller clamps y afterwards.
pub fn steer_toward(current: Vec3, target: Vec3, speed: f32, dt: f32) -> (Vec3, bool) {
    let diff = Vec3::new(target.x - current.x, 0.0, target.z - current.z);
    let distance = diff.horizontal_length();
    let step = speed.max(0.0) * dt;

    if distance < 0.05 || step >= distance {
        return (Vec3::new(target.x, current.y, target.z), true);
    }

    let direction = diff * (1.0 / distance);
    (current + direction * step, false)
}

/// Smooth 0→1 ramp with zero slope at both ends.
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

impl FlightPath {
    /// Flight with an arc proportional to distance, capped at `max_arc`.
    pub fn new(start: Vec3, end: Vec3, max_arc: f32) -> Self {
        let arc_height = (start.horizontal_distance(&end) * 0.2).min(max_arc);
        Self {
            start,
            end,
            arc_height,
        }
    }

    /// Seconds the flight takes at `speed`, never shorter than `min_time`.
    pub fn duration(&self, speed: f32, min_time: f32) -> f32 {
        let distance = self.start.distance(&self.end);
        if speed > 0.0 {
            (distance / speed).max(min_time)
        } else {
            min_time
        }
    }

    /// Position at progress `t` in [0, 1].
    pub fn position_at(&self, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        let base = self.start.lerp(&self.end, ease_in_out(t));
        base.with_y(base.y + (t * std::f32::consts::PI).sin() * self.arc_height)
    }

    /// Orientation facing the instantaneous travel direction at `t`.
    ///
    /// Pitch follows the climb angle; bank leans into the change of heading
    /// from `previous_yaw`. Both are clamped.
    pub fn orientation_at(&self, t: f32, previous_yaw: f32, max_pitch: f32, max_bank: f32) -> Orientation {
        const PROBE: f32 = 0.01;
        let (a, b) = if t + PROBE <= 1.0 {
            (self.position_at(t), self.position_at(t + PROBE))
        } else {
            (self.position_at(t - PROBE), self.position_at(t))
        };
        let d = b - a;
        let horizontal = d.horizontal_length();
        if horizontal < 1e-6 && d.y.abs() < 1e-6 {
            return Orientation::from_yaw(previous_yaw);
        }

        let yaw = if horizontal > 1e-6 {
            Orientation::yaw_toward(d.x, d.z)
        } else {
            previous_yaw
        };
        let pitch = (-d.y).atan2(horizontal).clamp(-max_pitch, max_pitch);
        let roll = (-wrap_angle(yaw - previous_yaw) * 4.0).clamp(-max_bank, max_bank);
        Orientation { yaw, pitch, roll }
    }
}

/// Wrap an angle into (-PI, PI].
pub fn wrap_angle(a: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let mut a = a % TAU;
    if a > PI {
        a -= TAU;
    } else if a <= -PI {
        a += TAU;
    }
    a
}
