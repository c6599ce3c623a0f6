use super::model::BodyModel;
use super::types::{ObserverLocation, PlanetaryPosition, ZodiacSign};
use hifitime::{Duration, Epoch};
use orrery_core::coordinates::{normalize_degrees, wrap_degrees};
use orrery_core::time::{julian_day, local_sidereal_degrees};
use orrery_core::transform::{equatorial_to_horizontal, precess};
use orrery_sim::{epoch_to_jc, Body};

/// Geocentric positions in request order
pub fn positions(
    model: &dyn BodyModel,
    bodies: &[Body],
    instant: Epoch,
    observer: Option<ObserverLocation>,
) -> Vec<PlanetaryPosition> {
    let jc = epoch_to_jc(instant);
    let jd = julian_day(instant);
    let tomorrow = instant + Duration::from_days(1.0);

    bodies
        .iter()
        .map(|&body| {
            let state = model.state(body, instant);
            let ecliptic = state.ecliptic_of_date(jc);
            let longitude = normalize_degrees(ecliptic.longitude);
            let equatorial = state.equatorial_j2000();

            let horizontal = observer.map(|obs| {
                let of_date = precess(&equatorial, jd);
                equatorial_to_horizontal(&of_date, obs.latitude, local_sidereal_degrees(jd, obs.longitude))
            });

            let retrograde = wrap_degrees(model.longitude(body, tomorrow) - longitude) < 0.0;
            let (sign, degree) = ZodiacSign::from_longitude(longitude);

            PlanetaryPosition {
                body,
                equatorial,
                horizontal,
                ecliptic_longitude: longitude,
                ecliptic_latitude: ecliptic.latitude,
                distance_au: state.distance_au(),
                angular_diameter_arcsec: state.angular_diameter_arcsec(),
                phase: state.phase_fraction(),
                retrograde,
                sign,
                degree,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::model::KeplerianModel;

    #[test]
    fn test_request_order_and_fields() {
        let t = Epoch::from_gregorian_utc(2025, 1, 1, 0, 0, 0, 0);
        let obs = ObserverLocation { latitude: 40.7128, longitude: -74.006 };
        let out = positions(&KeplerianModel, &[Body::Mars, Body::Sun, Body::Moon], t, Some(obs));
        assert_eq!(out.iter().map(|p| p.body).collect::<Vec<_>>(), [Body::Mars, Body::Sun, Body::Moon]);

        let mars = &out[0];
        assert!(mars.retrograde, "Mars retrograde Dec 2024 - Feb 2025");
        assert!((115.0..125.0).contains(&mars.ecliptic_longitude), "{}", mars.ecliptic_longitude);
        assert!(mars.horizontal.is_some());

        let sun = &out[1];
        assert!(!sun.retrograde);
        assert_eq!(sun.sign, ZodiacSign::Capricorn);
        assert!(sun.horizontal.unwrap().altitude < 0.0, "midnight UTC is evening in New York");
        assert!((0.0..30.0).contains(&sun.degree));
    }
}
