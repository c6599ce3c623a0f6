use super::model::BodyModel;
use super::types::{MoonPhase, MoonPhaseName};
use hifitime::{Duration, Epoch};
use orrery_core::constants::{AU_KM, SYNODIC_MONTH_DAYS};
use orrery_core::coordinates::normalize_degrees;
use orrery_sim::Body;

/// Lunar phase from the Sun-Moon elongation in ecliptic longitude
pub fn moon_phase(model: &dyn BodyModel, instant: Epoch) -> MoonPhase {
    let elongation =
        normalize_degrees(model.longitude(Body::Moon, instant) - model.longitude(Body::Sun, instant));
    let moon = model.state(Body::Moon, instant);

    let name = MoonPhaseName::from_elongation(elongation);
    let next_phase = name.next();
    let mut to_next = next_phase.elongation() - elongation;
    if to_next <= 0.0 {
        to_next += 360.0;
    }

    MoonPhase {
        name,
        elongation,
        illumination: (1.0 - elongation.to_radians().cos()) / 2.0,
        age_days: elongation / 360.0 * SYNODIC_MONTH_DAYS,
        distance_km: moon.distance_au() * AU_KM,
        angular_diameter_arcsec: moon.angular_diameter_arcsec(),
        next_phase,
        next_phase_at: instant + Duration::from_days(to_next / 360.0 * SYNODIC_MONTH_DAYS),
    }
}
