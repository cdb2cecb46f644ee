//! Force law for a charge in crossed uniform fields
//!
//! E points along +y, B along x (out of the (y, z) plane). The resulting
//! acceleration depends on velocity only, never on position, which lets the
//! integrators treat the velocity equation independently of the position one.

use crate::simulation::params::FieldParameters;
use crate::simulation::states::NVec2;

/// Acceleration of a particle moving with velocity `v`:
/// a = (q/m) * (E - B vz, B vy)
///
/// Total over real inputs. Non-finite inputs give non-finite output,
/// detection is left to the caller.
pub fn lorentz_acceleration(v: &NVec2, params: &FieldParameters) -> NVec2 {
    let factor = params.charge() / params.mass(); // q/m
    let b = params.b_field();

    let ay = factor * (params.e_field() - b * v.y); // electric push minus magnetic term from vz
    let az = factor * b * v.x; // magnetic term from vy

    NVec2::new(ay, az)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::config::Method;

    #[test]
    fn unit_fields_give_exact_rotation() {
        let p = FieldParameters::new(1.0, 1.0, 1.0, 1.0, 0.01, 1.0, 1.0, Method::Euler).unwrap();

        for (vy, vz) in [(0.0, 0.0), (0.25, -3.5), (-2.0, 1.0), (1e6, 7.0)] {
            let a = lorentz_acceleration(&NVec2::new(vy, vz), &p);
            assert_eq!(a, NVec2::new(1.0 - vz, vy));
        }
    }

    #[test]
    fn drift_velocity_is_force_free() {
        let p = FieldParameters::new(3.0, 2.0, 5.0, 0.5, 0.01, 1.0, 1.0, Method::Euler).unwrap();
        let a = lorentz_acceleration(&NVec2::new(0.0, p.drift_velocity()), &p);
        assert!(a.norm() < 1e-15);
    }
}
