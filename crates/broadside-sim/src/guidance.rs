//! Guidance and intercept geometry.
//!
//! Provides true proportional navigation (PN) for terminal homing, a
//! collision-course steering law for midcourse, closest-approach geometry,
//! and lead predicted-intercept-point (PIP) calculation for unguided rounds.

use broadside_core::constants::LEAD_ITERATIONS;
use broadside_core::types::Vec3;

/// Clip a vector to a maximum magnitude.
pub fn clip_magnitude(v: Vec3, max: f64) -> Vec3 {
    let len = v.length();
    if len > max && len > 0.0 {
        v * (max / len)
    } else {
        v
    }
}

/// True Proportional Navigation acceleration command.
///
/// `a = N * Vc * (omega × LOS_hat)`, perpendicular to the line of sight and
/// clipped to `max_accel`. Falls back to pure pursuit when not closing.
pub fn proportional_navigation(
    missile_pos: Vec3,
    missile_vel: Vec3,
    target_pos: Vec3,
    target_vel: Vec3,
    navigation_constant: f64,
    max_accel: f64,
) -> Vec3 {
    let los = target_pos - missile_pos;
    let range_sq = los.length_squared();
    let range = range_sq.sqrt();
    if range < 1.0 {
        return Vec3::ZERO;
    }
    let los_hat = los / range;

    // Relative velocity (target w.r.t. missile)
    let v_rel = target_vel - missile_vel;

    // Closing velocity (positive when approaching)
    let v_closing = -v_rel.dot(los_hat);
    if v_closing < 10.0 {
        return pure_pursuit(los_hat, max_accel);
    }

    // LOS angular rate: omega = (LOS × V_rel) / |R|²
    let omega = los.cross(v_rel) / range_sq;

    let accel = navigation_constant * v_closing * omega.cross(los_hat);
    clip_magnitude(accel, max_accel)
}

/// Pure pursuit fallback: full acceleration straight down the line of sight.
fn pure_pursuit(los_hat: Vec3, max_accel: f64) -> Vec3 {
    los_hat * max_accel
}

/// Midcourse steering: drive the relative velocity onto the line of sight
/// (a collision course against a constant-velocity target) while adding
/// closing speed.
pub fn collision_course(
    missile_pos: Vec3,
    missile_vel: Vec3,
    target_pos: Vec3,
    target_vel: Vec3,
    max_accel: f64,
    dt: f64,
) -> Vec3 {
    let los = target_pos - missile_pos;
    let range = los.length();
    if range < 1.0 || dt <= 0.0 {
        return Vec3::ZERO;
    }
    let los_hat = los / range;

    // Missile velocity relative to the target
    let v_rel = missile_vel - target_vel;
    let desired = los_hat * (v_rel.length() + max_accel * dt);
    clip_magnitude((desired - v_rel) / dt, max_accel)
}

/// Calculate the lead predicted intercept point for a round fired at
/// `projectile_speed` relative to the shooter.
///
/// `target_rel_pos` / `target_rel_vel` are the target's position and
/// velocity relative to the shooter. Returns the aim point (shooter frame)
/// and the estimated flight time. Iterates to refine the prediction for
/// target motion during flight.
pub fn calculate_lead_pip(
    target_rel_pos: Vec3,
    target_rel_vel: Vec3,
    projectile_speed: f64,
) -> (Vec3, f64) {
    if projectile_speed <= 0.0 {
        return (target_rel_pos, f64::MAX);
    }
    let mut tti = target_rel_pos.length() / projectile_speed;

    for _ in 0..LEAD_ITERATIONS {
        let pred = target_rel_pos + target_rel_vel * tti;
        tti = pred.length() / projectile_speed;
    }

    (target_rel_pos + target_rel_vel * tti, tti)
}

/// Time and distance of closest approach for two bodies in linear motion.
///
/// Returns `(t_cpa, miss_distance)`; `t_cpa` is clamped to be non-negative.
pub fn closest_approach(rel_pos: Vec3, rel_vel: Vec3) -> (f64, f64) {
    let speed_sq = rel_vel.length_squared();
    if speed_sq < 1e-12 {
        return (0.0, rel_pos.length());
    }
    let t = (-rel_pos.dot(rel_vel) / speed_sq).max(0.0);
    (t, (rel_pos + rel_vel * t).length())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 0.1;

    /// Fly a torpedo-like body with a fixed acceleration cap toward a target.
    fn fly(
        mut m_pos: Vec3,
        mut m_vel: Vec3,
        mut t_pos: Vec3,
        t_vel: impl Fn(f64) -> Vec3,
        max_accel: f64,
        steps: usize,
    ) -> f64 {
        let mut min_range = f64::MAX;
        for step in 0..steps {
            let range = (t_pos - m_pos).length();
            min_range = min_range.min(range);
            if range < 50.0 {
                break;
            }
            let tv = t_vel(step as f64 * DT);
            let accel = if range > 10_000.0 {
                collision_course(m_pos, m_vel, t_pos, tv, max_accel, DT)
            } else {
                proportional_navigation(m_pos, m_vel, t_pos, tv, 3.0, max_accel)
            };
            m_vel += accel * DT;
            m_pos += m_vel * DT;
            t_pos += tv * DT;
        }
        min_range
    }

    #[test]
    fn test_pn_intercepts_head_on_target() {
        let min_range = fly(
            Vec3::ZERO,
            Vec3::new(3_000.0, 0.0, 0.0),
            Vec3::new(200_000.0, 5_000.0, 0.0),
            |_| Vec3::new(-2_000.0, 0.0, 0.0),
            100.0,
            20_000,
        );
        assert!(
            min_range < 50.0,
            "Guidance should converge on head-on target, min range: {min_range:.1}m"
        );
    }

    #[test]
    fn test_pn_intercepts_crossing_target() {
        let min_range = fly(
            Vec3::ZERO,
            Vec3::new(2_000.0, 0.0, 0.0),
            Vec3::new(150_000.0, 60_000.0, 0.0),
            |_| Vec3::new(0.0, -1_500.0, 300.0),
            100.0,
            20_000,
        );
        assert!(
            min_range < 50.0,
            "Guidance should converge on crossing target, min range: {min_range:.1}m"
        );
    }

    #[test]
    fn test_pn_intercepts_maneuvering_target() {
        let min_range = fly(
            Vec3::ZERO,
            Vec3::new(2_500.0, 0.0, 0.0),
            Vec3::new(120_000.0, 10_000.0, 0.0),
            |t| Vec3::new(-1_000.0, 200.0 * (t * 0.2).sin(), 0.0),
            150.0,
            20_000,
        );
        assert!(
            min_range < 60.0,
            "Guidance should converge on weaving target, min range: {min_range:.1}m"
        );
    }

    #[test]
    fn test_pn_accel_is_clipped() {
        let accel = proportional_navigation(
            Vec3::ZERO,
            Vec3::new(5_000.0, 0.0, 0.0),
            Vec3::new(2_000.0, 500.0, 0.0),
            Vec3::new(0.0, 3_000.0, 0.0),
            3.0,
            50.0,
        );
        assert!(accel.length() <= 50.0 + 1e-9, "PN accel: {:.1}", accel.length());
    }

    #[test]
    fn test_lead_pip_ahead_of_target() {
        let t_pos = Vec3::new(50_000.0, 0.0, 0.0);
        let t_vel = Vec3::new(0.0, 2_000.0, 0.0);
        let (pip, tti) = calculate_lead_pip(t_pos, t_vel, 10_000.0);
        assert!(pip.y > 0.0, "PIP should lead the target: pip.y={:.0}", pip.y);
        assert!(tti > 0.0, "TTI should be positive");
        // A round flying at 10 km/s toward the PIP arrives with the target.
        let miss = (pip - (t_pos + t_vel * tti)).length();
        assert!(miss < 1e-6, "PIP should lie on the target track: {miss}");
        let flight = pip.length() / 10_000.0;
        assert!((flight - tti).abs() < 0.05, "Flight {flight:.3}s vs tti {tti:.3}s");
    }

    #[test]
    fn test_lead_pip_stationary_target_is_exact() {
        let t_pos = Vec3::new(5_000.0, 0.0, 0.0);
        let (pip, tti) = calculate_lead_pip(t_pos, Vec3::ZERO, 10_000.0);
        assert_eq!(pip, t_pos);
        assert!((tti - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_closest_approach() {
        let (t, miss) = closest_approach(Vec3::new(-1_000.0, 30.0, 0.0), Vec3::new(100.0, 0.0, 0.0));
        assert!((t - 10.0).abs() < 1e-9);
        assert!((miss - 30.0).abs() < 1e-9);

        let (t, _) = closest_approach(Vec3::new(1_000.0, 0.0, 0.0), Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(t, 0.0, "Receding bodies are closest now");
    }
}
