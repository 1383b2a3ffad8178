//! Fundamental geometric and simulation types.
//!
//! Vectors and orientations are `glam` f64 types. Body frame: +X is the
//! nose, +Z is "up". World frame is an arbitrary inertial Cartesian frame.

use serde::{Deserialize, Serialize};

pub use glam::{DQuat as Quat, DVec3 as Vec3};

/// Index of a ship in the battle's ship arena. Ships are never removed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ShipId(pub u32);

/// Monotonically assigned projectile identifier (first projectile is 1).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProjectileId(pub u64);

/// Weak reference to a battle entity, used by events and targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum EntityRef {
    Ship(ShipId),
    Projectile(ProjectileId),
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl ShipId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ShipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ship#{}", self.0)
    }
}

impl std::fmt::Display for ProjectileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "proj#{}", self.0)
    }
}

impl SimTime {
    /// Seconds per tick at the fixed tick rate.
    pub fn dt(&self) -> f64 {
        crate::constants::DT
    }

    /// Advance by one tick.
    ///
    /// Elapsed time is derived from the tick count rather than accumulated,
    /// so long battles do not drift.
    pub fn advance(&mut self) {
        self.tick += 1;
        self.elapsed_secs = self.tick as f64 * self.dt();
    }
}

/// Nose direction of a body with the given orientation.
pub fn forward(orientation: Quat) -> Vec3 {
    orientation * Vec3::X
}

/// True when every component is finite.
pub fn is_finite_vec(v: Vec3) -> bool {
    v.is_finite()
}

/// Rotate `desired` toward `axis` so that the angle between them is at most
/// `half_angle` radians. Degenerate inputs fall back to `axis`.
pub fn clip_to_cone(axis: Vec3, desired: Vec3, half_angle: f64) -> Vec3 {
    let axis = axis.normalize_or_zero();
    let desired = desired.normalize_or_zero();
    if desired == Vec3::ZERO {
        return axis;
    }
    if axis == Vec3::ZERO {
        return desired;
    }

    let angle = axis.angle_between(desired);
    if angle <= half_angle {
        return desired;
    }

    let mut rot_axis = axis.cross(desired);
    if rot_axis.length_squared() < 1e-18 {
        // Anti-parallel: any perpendicular axis is as good as another.
        rot_axis = axis.any_orthonormal_vector();
    }
    Quat::from_axis_angle(rot_axis.normalize(), half_angle.max(0.0)) * axis
}

/// Integrate an orientation by a body angular velocity over `dt`, renormalizing
/// to keep the quaternion on the unit sphere.
pub fn integrate_orientation(orientation: Quat, angular_velocity: Vec3, dt: f64) -> Quat {
    let delta = Quat::from_scaled_axis(angular_velocity * dt);
    (delta * orientation).normalize()
}

/// Orientation whose nose points along `direction` (identity for a zero vector).
pub fn facing(direction: Vec3) -> Quat {
    let dir = direction.normalize_or_zero();
    if dir == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(Vec3::X, dir)
}
