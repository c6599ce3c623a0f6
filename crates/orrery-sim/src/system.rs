//! Solar system state: heliocentric orbits reduced to geocentric sky positions

use crate::lunar::lunar_position;
use crate::planets::Body;
use hifitime::Epoch;
use nalgebra::Vector3;
use orrery_core::constants::{AU_KM, OBLIQUITY_J2000_DEG};
use orrery_core::coordinates::{EclipticCoordinate, EquatorialCoordinate};
use orrery_core::time::{epoch_from_julian_day, julian_centuries, julian_day};
use std::collections::HashMap;

/// General precession in ecliptic longitude (degrees per Julian century)
pub const PRECESSION_DEG_PER_CENTURY: f64 = 1.396_971_3;

/// Convert hifitime Epoch to Julian centuries from J2000
pub fn epoch_to_jc(epoch: Epoch) -> f64 {
    julian_centuries(julian_day(epoch))
}

/// Convert Julian centuries to hifitime Epoch
pub fn jc_to_epoch(jc: f64) -> Epoch {
    epoch_from_julian_day(jc * orrery_core::constants::DAYS_PER_CENTURY + orrery_core::constants::J2000_JD)
}

/// Body state at a specific time, J2000 ecliptic frame (AU)
#[derive(Clone, Debug, PartialEq)]
pub struct BodyState {
    pub body: Body,
    pub heliocentric: Vector3<f64>,
    pub geocentric: Vector3<f64>,
}

impl BodyState {
    /// Distance from Earth (AU)
    pub fn distance_au(&self) -> f64 {
        self.geocentric.norm()
    }

    /// Geocentric ecliptic position referred to the J2000 equinox
    pub fn ecliptic_j2000(&self) -> EclipticCoordinate {
        let g = &self.geocentric;
        let lon = g.y.atan2(g.x).to_degrees();
        let lat = g.z.atan2(g.x.hypot(g.y)).to_degrees();
        EclipticCoordinate::new(lon, lat)
    }

    /// Geocentric ecliptic position referred to the mean equinox of date
    pub fn ecliptic_of_date(&self, jc: f64) -> EclipticCoordinate {
        let j2000 = self.ecliptic_j2000();
        EclipticCoordinate::new(j2000.longitude + PRECESSION_DEG_PER_CENTURY * jc, j2000.latitude)
    }

    /// Geocentric J2000 equatorial position
    pub fn equatorial_j2000(&self) -> EquatorialCoordinate {
        self.ecliptic_j2000().to_equatorial(OBLIQUITY_J2000_DEG, 2000.0)
    }

    /// Apparent angular diameter (arcseconds)
    pub fn angular_diameter_arcsec(&self) -> f64 {
        let distance_km = self.distance_au() * AU_KM;
        if distance_km <= 0.0 {
            return 0.0;
        }
        2.0 * (self.body.radius_km() / distance_km).atan().to_degrees() * 3600.0
    }

    /// Illuminated fraction of the disk seen from Earth, 1.0 for the Sun
    pub fn phase_fraction(&self) -> f64 {
        let (h, g) = (self.heliocentric.norm(), self.geocentric.norm());
        if self.body == Body::Sun || h == 0.0 || g == 0.0 {
            return 1.0;
        }
        // Phase angle at the body between the directions to the Sun and to Earth
        let cos_i = (self.heliocentric.dot(&self.geocentric) / (h * g)).clamp(-1.0, 1.0);
        (1.0 + cos_i) / 2.0
    }
}

/// Solar system snapshot at a specific epoch
#[derive(Clone, Debug)]
pub struct SystemSnapshot {
    pub epoch: Epoch,
    pub states: HashMap<Body, BodyState>,
}

/// Solar system model evaluated at one epoch
#[derive(Clone, Debug)]
pub struct SolarSystem {
    current_epoch: Epoch,
    jc: f64,
    /// Earth-Moon barycenter, heliocentric (AU)
    earth_position: Vector3<f64>,
}

impl SolarSystem {
    /// Create at J2000 epoch
    pub fn new() -> Self {
        Self::at_epoch(Epoch::from_gregorian_utc(2000, 1, 1, 12, 0, 0, 0))
    }

    /// Create at specific epoch
    pub fn at_epoch(epoch: Epoch) -> Self {
        let mut system = Self { current_epoch: epoch, jc: 0.0, earth_position: Vector3::zeros() };
        system.set_epoch(epoch);
        system
    }

    /// Set current time
    pub fn set_epoch(&mut self, epoch: Epoch) {
        self.current_epoch = epoch;
        self.jc = epoch_to_jc(epoch);
        self.earth_position = Self::orbit_position(Body::Earth, self.jc);
    }

    /// Get current epoch
    pub fn epoch(&self) -> Epoch {
        self.current_epoch
    }

    /// Julian centuries from J2000 of the current epoch
    pub fn julian_centuries(&self) -> f64 {
        self.jc
    }

    fn orbit_position(body: Body, jc: f64) -> Vector3<f64> {
        body.mean_elements()
            .map(|el| el.at(jc).position_ecliptic())
            .unwrap_or_else(Vector3::zeros)
    }

    /// Moon relative to Earth, J2000 ecliptic (AU)
    fn moon_geocentric(&self) -> Vector3<f64> {
        let moon = lunar_position(self.jc);
        let lon = (moon.longitude - PRECESSION_DEG_PER_CENTURY * self.jc).to_radians();
        let lat = moon.latitude.to_radians();
        let r = moon.distance_km / AU_KM;
        Vector3::new(r * lat.cos() * lon.cos(), r * lat.cos() * lon.sin(), r * lat.sin())
    }

    /// Heliocentric position (AU)
    pub fn body_position(&self, body: Body) -> Vector3<f64> {
        match body {
            Body::Sun => Vector3::zeros(),
            Body::Earth => self.earth_position,
            Body::Moon => self.earth_position + self.moon_geocentric(),
            _ => Self::orbit_position(body, self.jc),
        }
    }

    /// Heliocentric and geocentric position of a body
    pub fn body_state(&self, body: Body) -> BodyState {
        let heliocentric = self.body_position(body);
        let geocentric = match body {
            Body::Moon => self.moon_geocentric(),
            _ => heliocentric - self.earth_position,
        };
        BodyState { body, heliocentric, geocentric }
    }

    /// Get snapshot of entire system
    pub fn snapshot(&self) -> SystemSnapshot {
        let states = Body::all().iter().map(|b| (*b, self.body_state(*b))).collect();
        SystemSnapshot { epoch: self.current_epoch, states }
    }
}

impl Default for SolarSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn longitude_of_date(body: Body, epoch: Epoch) -> f64 {
        let system = SolarSystem::at_epoch(epoch);
        system.body_state(body).ecliptic_of_date(system.julian_centuries()).longitude
    }

    #[test]
    fn test_earth_near_one_au() {
        let system = SolarSystem::at_epoch(Epoch::from_gregorian_utc(2024, 1, 3, 0, 0, 0, 0));
        let r = system.body_position(Body::Earth).norm();
        // Early January perihelion
        assert!((r - 0.9833).abs() < 0.001, "r = {r}");
    }

    #[test]
    fn test_sun_at_solstice_longitude() {
        // June solstice 2024-06-20 20:51 UTC; three hours later the Sun is ~0.13° past 90°
        let lon = longitude_of_date(Body::Sun, Epoch::from_gregorian_utc(2024, 6, 21, 0, 0, 0, 0));
        assert!((lon - 90.13).abs() < 0.1, "sun lon {lon}");
    }

    #[test]
    fn test_jupiter_station_longitude() {
        // Jupiter turned direct on 2023-12-31 at about 5°34' Taurus
        let lon = longitude_of_date(Body::Jupiter, Epoch::from_gregorian_utc(2024, 1, 1, 0, 0, 0, 0));
        assert!((lon - 35.57).abs() < 1.0, "jupiter lon {lon}");
    }

    #[test]
    fn test_mars_retrograde_in_january_2025() {
        let a = longitude_of_date(Body::Mars, Epoch::from_gregorian_utc(2025, 1, 1, 0, 0, 0, 0));
        let b = longitude_of_date(Body::Mars, Epoch::from_gregorian_utc(2025, 1, 11, 0, 0, 0, 0));
        assert!(b < a, "mars should move backward: {a} -> {b}");
    }

    #[test]
    fn test_full_moon_fully_lit() {
        // Full moon 2024-06-22 01:08 UTC
        let system = SolarSystem::at_epoch(Epoch::from_gregorian_utc(2024, 6, 22, 1, 0, 0, 0));
        let moon = system.body_state(Body::Moon);
        assert!(moon.phase_fraction() > 0.98, "phase {}", moon.phase_fraction());
        assert!(moon.distance_au() < 0.003);
    }

    #[test]
    fn test_sun_angular_diameter() {
        let system = SolarSystem::at_epoch(Epoch::from_gregorian_utc(2024, 6, 21, 0, 0, 0, 0));
        let d = system.body_state(Body::Sun).angular_diameter_arcsec();
        assert!((1850.0..1960.0).contains(&d), "{d}");
        assert_eq!(system.body_state(Body::Sun).phase_fraction(), 1.0);
    }

    #[test]
    fn test_snapshot_covers_all_bodies() {
        let snapshot = SolarSystem::new().snapshot();
        assert_eq!(snapshot.states.len(), Body::all().len());
        assert_eq!(snapshot.states[&Body::Sun].heliocentric, Vector3::zeros());
    }

    #[test]
    fn test_jc_round_trip() {
        let epoch = Epoch::from_gregorian_utc(2031, 3, 4, 5, 6, 7, 0);
        let back = jc_to_epoch(epoch_to_jc(epoch));
        assert!((back - epoch).to_seconds().abs() < 1e-3);
    }
}
