//! Circular-orbit stand-in used when no authoritative backend answers
//!
//! Every body moves on a coplanar circle at its mean rate, so longitudes are
//! continuous and planets still show retrograde loops, but positions can be
//! off by several degrees.

use super::model::BodyModel;
use hifitime::Epoch;
use nalgebra::Vector3;
use orrery_core::constants::{AU_KM, J2000_JD};
use orrery_core::time::julian_day;
use orrery_core::Provenance;
use orrery_sim::{Body, BodyState};

/// Earth's mean daily motion (degrees/day)
const EARTH_RATE: f64 = 0.985_647_4;
/// Geocentric solar longitude at J2000
const SUN_LONGITUDE_J2000: f64 = 280.46;
const MOON_LONGITUDE_J2000: f64 = 218.316;
const MOON_RATE: f64 = 13.176_396;
const MOON_DISTANCE_KM: f64 = 384_400.0;

/// (orbit radius AU, mean motion relative to Earth)
fn circle(body: Body) -> (f64, f64) {
    match body {
        Body::Mercury => (0.387, 4.152_1),
        Body::Venus => (0.723, 1.625_5),
        Body::Mars => (1.524, 0.531_7),
        Body::Jupiter => (5.203, 0.084_3),
        Body::Saturn => (9.537, 0.033_9),
        Body::Uranus => (19.19, 0.011_9),
        Body::Neptune => (30.07, 0.006_07),
        Body::Pluto => (39.48, 0.004_03),
        Body::Sun | Body::Moon | Body::Earth => (1.0, 1.0),
    }
}

fn on_circle(radius: f64, longitude_deg: f64) -> Vector3<f64> {
    let (s, c) = longitude_deg.to_radians().sin_cos();
    Vector3::new(radius * c, radius * s, 0.0)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticModel;

impl BodyModel for SyntheticModel {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn provenance(&self) -> Provenance {
        Provenance::Synthetic
    }

    fn state(&self, body: Body, instant: Epoch) -> BodyState {
        let d = julian_day(instant) - J2000_JD;
        let earth = on_circle(1.0, SUN_LONGITUDE_J2000 + 180.0 + EARTH_RATE * d);

        let heliocentric = match body {
            Body::Sun => Vector3::zeros(),
            Body::Earth => earth,
            Body::Moon => {
                earth + on_circle(MOON_DISTANCE_KM / AU_KM, MOON_LONGITUDE_J2000 + MOON_RATE * d)
            }
            _ => {
                let (radius, rate) = circle(body);
                // Spread the starting longitudes 30° apart
                let start = SUN_LONGITUDE_J2000 + body.index() as f64 * 30.0;
                on_circle(radius, start + EARTH_RATE * d * rate)
            }
        };

        BodyState { body, heliocentric, geocentric: heliocentric - earth }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sun_mean_longitude() {
        let j2000 = Epoch::from_gregorian_tai(2000, 1, 1, 12, 0, 0, 0);
        let state = SyntheticModel.state(Body::Sun, j2000);
        let lon = state.ecliptic_j2000().longitude.rem_euclid(360.0);
        assert!((lon - SUN_LONGITUDE_J2000).abs() < 0.01, "{lon}");
        assert!((state.distance_au() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_longitudes_continuous() {
        let t0 = Epoch::from_gregorian_utc(2024, 3, 1, 0, 0, 0, 0);
        for body in Body::observable() {
            let a = SyntheticModel.longitude(*body, t0);
            let b = SyntheticModel.longitude(*body, t0 + hifitime::Duration::from_hours(1.0));
            let delta = orrery_core::coordinates::wrap_degrees(b - a).abs();
            assert!(delta < 1.0, "{body} jumped {delta}°");
        }
    }

    #[test]
    fn test_moon_geocentric_distance() {
        let t = Epoch::from_gregorian_utc(2024, 3, 1, 0, 0, 0, 0);
        let km = SyntheticModel.state(Body::Moon, t).distance_au() * AU_KM;
        assert!((km - MOON_DISTANCE_KM).abs() < 1.0);
    }
}
