//! Observer location and instant

use crate::config::ConfigError;
use crate::time::{julian_day, local_sidereal_degrees};
use hifitime::Epoch;

/// Fallback location used when no geolocation is available (New York City)
pub const FALLBACK_LATITUDE: f64 = 40.7128;
pub const FALLBACK_LONGITUDE: f64 = -74.0060;
pub const FALLBACK_ELEVATION_M: f64 = 10.0;
pub const FALLBACK_TIMEZONE: &str = "America/New_York";

/// Where and when the sky is observed. Immutable; build a new one per change.
#[derive(Clone, Debug, PartialEq)]
pub struct ObserverContext {
    /// Geographic latitude, degrees north [-90, 90]
    pub latitude: f64,
    /// Geographic longitude, degrees east [-180, 180]
    pub longitude: f64,
    /// Elevation above sea level (meters)
    pub elevation_meters: f64,
    /// IANA timezone id, carried for display by the host
    pub timezone: String,
    /// Instant of observation (UTC)
    pub instant: Epoch,
}

impl ObserverContext {
    /// Validated constructor
    pub fn new(
        latitude: f64,
        longitude: f64,
        elevation_meters: f64,
        timezone: impl Into<String>,
        instant: Epoch,
    ) -> Result<Self, ConfigError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ConfigError::InvalidObserver(format!("latitude {latitude} outside [-90, 90]")));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ConfigError::InvalidObserver(format!("longitude {longitude} outside [-180, 180]")));
        }
        if !elevation_meters.is_finite() {
            return Err(ConfigError::InvalidObserver("elevation is not finite".into()));
        }
        Ok(Self {
            latitude,
            longitude,
            elevation_meters,
            timezone: timezone.into(),
            instant,
        })
    }

    /// Fixed fallback location at the given instant
    pub fn fallback(instant: Epoch) -> Self {
        Self {
            latitude: FALLBACK_LATITUDE,
            longitude: FALLBACK_LONGITUDE,
            elevation_meters: FALLBACK_ELEVATION_M,
            timezone: FALLBACK_TIMEZONE.to_string(),
            instant,
        }
    }

    /// Same place, different instant
    pub fn at(&self, instant: Epoch) -> Self {
        Self { instant, ..self.clone() }
    }

    pub fn julian_day(&self) -> f64 {
        julian_day(self.instant)
    }

    /// Local mean sidereal time (degrees)
    pub fn local_sidereal_degrees(&self) -> f64 {
        local_sidereal_degrees(self.julian_day(), self.longitude)
    }

    /// Naked-eye limiting magnitude, improving slightly with elevation
    pub fn limiting_magnitude(&self) -> f64 {
        (6.5 + self.elevation_meters.max(0.0) / 1000.0 * 0.1).min(7.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant() -> Epoch {
        Epoch::from_gregorian_utc(2024, 6, 21, 0, 0, 0, 0)
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(ObserverContext::new(91.0, 0.0, 0.0, "UTC", instant()).is_err());
        assert!(ObserverContext::new(0.0, -180.5, 0.0, "UTC", instant()).is_err());
        assert!(ObserverContext::new(f64::NAN, 0.0, 0.0, "UTC", instant()).is_err());
        assert!(ObserverContext::new(-90.0, 180.0, -400.0, "UTC", instant()).is_ok());
    }

    #[test]
    fn test_fallback_is_new_york() {
        let obs = ObserverContext::fallback(instant());
        assert_eq!(obs.latitude, 40.7128);
        assert_eq!(obs.longitude, -74.0060);
        assert_eq!(obs.timezone, "America/New_York");
    }

    #[test]
    fn test_limiting_magnitude() {
        let sea = ObserverContext::new(0.0, 0.0, 0.0, "UTC", instant()).unwrap();
        assert_eq!(sea.limiting_magnitude(), 6.5);
        let peak = ObserverContext::new(0.0, 0.0, 4200.0, "UTC", instant()).unwrap();
        assert!((peak.limiting_magnitude() - 6.92).abs() < 1e-9);
        let orbit = ObserverContext::new(0.0, 0.0, 400_000.0, "UTC", instant()).unwrap();
        assert_eq!(orbit.limiting_magnitude(), 7.0);
    }
}
