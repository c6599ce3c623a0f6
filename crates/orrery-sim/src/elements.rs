//! Keplerian orbital elements and conversions

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Osculating Keplerian elements at one instant (AU, radians)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    /// Semi-major axis (AU)
    pub a: f64,
    /// Eccentricity (dimensionless, 0 = circular)
    pub e: f64,
    /// Inclination to the J2000 ecliptic (radians)
    pub i: f64,
    /// Longitude of ascending node (radians)
    pub omega_big: f64,
    /// Argument of perihelion (radians)
    pub omega_small: f64,
    /// Mean anomaly (radians)
    pub mean_anomaly: f64,
}

impl OrbitalElements {
    /// Solve Kepler's equation: M = E - e*sin(E)
    /// Returns eccentric anomaly E
    pub fn eccentric_anomaly(&self) -> f64 {
        let m = normalize_angle(self.mean_anomaly);
        let e = self.e;

        // Newton-Raphson iteration
        let mut ea = if e < 0.8 { m } else { PI };

        for _ in 0..50 {
            let f = ea - e * ea.sin() - m;
            let fp = 1.0 - e * ea.cos();
            let delta = f / fp;
            ea -= delta;

            if delta.abs() < 1e-12 {
                break;
            }
        }

        ea
    }

    /// True anomaly from eccentric anomaly
    pub fn true_anomaly(&self, eccentric_anomaly: f64) -> f64 {
        let (sin_e, cos_e) = eccentric_anomaly.sin_cos();
        let y = (1.0 - self.e * self.e).sqrt() * sin_e;
        y.atan2(cos_e - self.e)
    }

    /// Position in the orbital plane, x toward perihelion (AU)
    pub fn position_perifocal(&self) -> (f64, f64) {
        let ea = self.eccentric_anomaly();
        let x = self.a * (ea.cos() - self.e);
        let y = self.a * (1.0 - self.e * self.e).sqrt() * ea.sin();
        (x, y)
    }

    /// Rotation matrix from perifocal to heliocentric ecliptic J2000
    pub fn perifocal_to_ecliptic(&self) -> Matrix3<f64> {
        let (sin_o, cos_o) = self.omega_big.sin_cos();
        let (sin_i, cos_i) = self.i.sin_cos();
        let (sin_w, cos_w) = self.omega_small.sin_cos();

        // Combined rotation: R_z(-Ω) * R_x(-i) * R_z(-ω)
        Matrix3::new(
            cos_o * cos_w - sin_o * sin_w * cos_i,
            -cos_o * sin_w - sin_o * cos_w * cos_i,
            sin_o * sin_i,

            sin_o * cos_w + cos_o * sin_w * cos_i,
            -sin_o * sin_w + cos_o * cos_w * cos_i,
            -cos_o * sin_i,

            sin_w * sin_i,
            cos_w * sin_i,
            cos_i,
        )
    }

    /// Heliocentric position in the J2000 ecliptic frame (AU)
    pub fn position_ecliptic(&self) -> Vector3<f64> {
        let (x, y) = self.position_perifocal();
        self.perifocal_to_ecliptic() * Vector3::new(x, y, 0.0)
    }
}

/// Mean elements at J2000 with linear rates per Julian century.
///
/// Values follow the JPL "approximate positions of the planets" table
/// (valid 1800-2050): a in AU, angles in degrees, `mean_longitude` L and
/// `perihelion_longitude` ϖ rather than M and ω.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeanElements {
    pub a: [f64; 2],
    pub e: [f64; 2],
    pub i: [f64; 2],
    pub mean_longitude: [f64; 2],
    pub perihelion_longitude: [f64; 2],
    pub node_longitude: [f64; 2],
}

impl MeanElements {
    /// Osculating elements at `jc` Julian centuries from J2000
    pub fn at(&self, jc: f64) -> OrbitalElements {
        let eval = |[v0, rate]: [f64; 2]| v0 + rate * jc;

        let l = eval(self.mean_longitude);
        let peri = eval(self.perihelion_longitude);
        let node = eval(self.node_longitude);

        OrbitalElements {
            a: eval(self.a),
            e: eval(self.e).clamp(0.0, 0.99),
            i: eval(self.i).to_radians(),
            omega_big: normalize_angle(node.to_radians()),
            omega_small: normalize_angle((peri - node).to_radians()),
            mean_anomaly: normalize_angle((l - peri).to_radians()),
        }
    }
}

/// Normalize angle to [0, 2π)
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    if a >= TAU { 0.0 } else { a }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circular(mean_anomaly: f64) -> OrbitalElements {
        OrbitalElements { a: 1.0, e: 0.0, i: 0.0, omega_big: 0.0, omega_small: 0.0, mean_anomaly }
    }

    #[test]
    fn test_kepler_circular() {
        // Circular orbit: e=0 means E=M=ν
        let elements = circular(PI / 4.0);
        let ea = elements.eccentric_anomaly();
        let nu = elements.true_anomaly(ea);

        assert!((ea - PI / 4.0).abs() < 1e-10);
        assert!((nu - PI / 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_kepler_eccentric() {
        let mut elements = OrbitalElements { e: 0.0167, ..circular(0.0) };

        // At perihelion (M=0), E=0
        assert!(elements.eccentric_anomaly().abs() < 1e-10);

        // At aphelion (M=π), E=π
        elements.mean_anomaly = PI;
        assert!((elements.eccentric_anomaly() - PI).abs() < 1e-10);

        // Kepler's equation holds at an arbitrary point
        elements.mean_anomaly = 1.234;
        let ea = elements.eccentric_anomaly();
        assert!((ea - elements.e * ea.sin() - 1.234).abs() < 1e-12);
    }

    #[test]
    fn test_perihelion_and_aphelion_distance() {
        let mut elements = OrbitalElements { a: 2.0, e: 0.25, ..circular(0.0) };
        assert!((elements.position_ecliptic().norm() - 1.5).abs() < 1e-12);
        elements.mean_anomaly = PI;
        assert!((elements.position_ecliptic().norm() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_inclined_orbit_leaves_ecliptic() {
        // Quarter orbit past the node on a 90° inclined circle points at the ecliptic pole
        let elements = OrbitalElements { i: PI / 2.0, ..circular(PI / 2.0) };
        let p = elements.position_ecliptic();
        assert!((p.z - 1.0).abs() < 1e-12, "{p:?}");
    }
}
