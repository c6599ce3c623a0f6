//! Body models the ephemeris operations are computed from

use hifitime::Epoch;
use orrery_core::coordinates::normalize_degrees;
use orrery_core::Provenance;
use orrery_sim::{epoch_to_jc, Body, BodyState, SolarSystem};
use std::fmt;

/// Geocentric state of any observable body at an instant
pub trait BodyModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn provenance(&self) -> Provenance;

    fn state(&self, body: Body, instant: Epoch) -> BodyState;

    /// Ecliptic longitude of date, [0, 360)
    fn longitude(&self, body: Body, instant: Epoch) -> f64 {
        normalize_degrees(self.state(body, instant).ecliptic_of_date(epoch_to_jc(instant)).longitude)
    }
}

/// JPL mean elements plus the truncated lunar theory
#[derive(Debug, Default, Clone, Copy)]
pub struct KeplerianModel;

impl BodyModel for KeplerianModel {
    fn name(&self) -> &str {
        "keplerian"
    }

    fn provenance(&self) -> Provenance {
        Provenance::Authoritative
    }

    fn state(&self, body: Body, instant: Epoch) -> BodyState {
        SolarSystem::at_epoch(instant).body_state(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keplerian_sun_at_solstice() {
        let t = Epoch::from_gregorian_utc(2024, 6, 20, 20, 51, 0, 0);
        let lon = KeplerianModel.longitude(Body::Sun, t);
        assert!((lon - 90.0).abs() < 0.15, "sun longitude at solstice: {lon}");
    }
}
