//! Sky coordinate value types
//!
//! All angles are degrees. Each transform produces a new value; nothing here is mutated
//! in place.

use crate::constants::{
    DAYS_PER_YEAR, GALACTIC_NCP_LON_DEG, GALACTIC_POLE_DEC_DEG, GALACTIC_POLE_RA_DEG, J2000_JD,
};
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Normalize an angle to [0, 360)
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Wrap an angle to [-180, 180)
pub fn wrap_degrees(angle: f64) -> f64 {
    normalize_degrees(angle + 180.0) - 180.0
}

/// Equatorial position (right ascension / declination) referred to a Julian epoch
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquatorialCoordinate {
    /// Right ascension [0, 360)
    pub ra: f64,
    /// Declination [-90, 90]
    pub dec: f64,
    /// Julian epoch of the reference equinox (2000.0 for J2000)
    pub epoch: f64,
}

impl EquatorialCoordinate {
    pub fn new(ra: f64, dec: f64, epoch: f64) -> Self {
        Self { ra: normalize_degrees(ra), dec: dec.clamp(-90.0, 90.0), epoch }
    }

    pub fn j2000(ra: f64, dec: f64) -> Self {
        Self::new(ra, dec, 2000.0)
    }

    /// Julian Day of the reference epoch
    pub fn epoch_jd(&self) -> f64 {
        J2000_JD + (self.epoch - 2000.0) * DAYS_PER_YEAR
    }

    /// Direction on the unit sphere: (cos δ cos α, cos δ sin α, sin δ)
    pub fn to_unit_vector(&self) -> DVec3 {
        let (sin_ra, cos_ra) = self.ra.to_radians().sin_cos();
        let (sin_dec, cos_dec) = self.dec.to_radians().sin_cos();
        DVec3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
    }

    /// Inverse of [`to_unit_vector`](Self::to_unit_vector). The vector need not be normalized.
    pub fn from_unit_vector(v: DVec3, epoch: f64) -> Self {
        let r = v.length();
        if r == 0.0 {
            return Self::new(0.0, 0.0, epoch);
        }
        let dec = (v.z / r).clamp(-1.0, 1.0).asin().to_degrees();
        let ra = v.y.atan2(v.x).to_degrees();
        Self::new(ra, dec, epoch)
    }

    /// Great-circle separation in degrees
    pub fn separation(&self, other: &EquatorialCoordinate) -> f64 {
        let a = self.to_unit_vector();
        let b = other.to_unit_vector();
        // atan2 form stays accurate for both tiny and near-180° separations
        a.cross(b).length().atan2(a.dot(b)).to_degrees()
    }

    /// Ecliptic position for the given obliquity (degrees)
    pub fn to_ecliptic(&self, obliquity_deg: f64) -> EclipticCoordinate {
        let (sin_e, cos_e) = obliquity_deg.to_radians().sin_cos();
        let (sin_ra, cos_ra) = self.ra.to_radians().sin_cos();
        let (sin_dec, cos_dec) = self.dec.to_radians().sin_cos();

        let sin_beta = sin_dec * cos_e - cos_dec * sin_e * sin_ra;
        let lambda = (sin_ra * cos_dec * cos_e + sin_dec * sin_e).atan2(cos_dec * cos_ra);

        EclipticCoordinate {
            longitude: normalize_degrees(lambda.to_degrees()),
            latitude: sin_beta.clamp(-1.0, 1.0).asin().to_degrees(),
        }
    }
}

/// Local horizon position
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HorizontalCoordinate {
    /// Azimuth measured from north through east [0, 360)
    pub azimuth: f64,
    /// Altitude above the horizon [-90, 90]
    pub altitude: f64,
}

impl HorizontalCoordinate {
    pub fn new(azimuth: f64, altitude: f64) -> Self {
        Self { azimuth: normalize_degrees(azimuth), altitude: altitude.clamp(-90.0, 90.0) }
    }

    /// Direction in the local (north, east, up) frame
    pub fn to_local_vector(&self) -> DVec3 {
        let (sin_az, cos_az) = self.azimuth.to_radians().sin_cos();
        let (sin_alt, cos_alt) = self.altitude.to_radians().sin_cos();
        DVec3::new(cos_alt * cos_az, cos_alt * sin_az, sin_alt)
    }

    /// Inverse of [`to_local_vector`](Self::to_local_vector); `v` need not be normalized
    pub fn from_local_vector(v: DVec3) -> Self {
        let azimuth = normalize_degrees(v.y.atan2(v.x).to_degrees());
        let altitude = v.z.atan2(v.x.hypot(v.y)).to_degrees();
        Self { azimuth, altitude }
    }
}

/// Ecliptic longitude / latitude
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EclipticCoordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl EclipticCoordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude: normalize_degrees(longitude), latitude: latitude.clamp(-90.0, 90.0) }
    }

    /// Equatorial position for the given obliquity (degrees), tagged with `epoch`
    pub fn to_equatorial(&self, obliquity_deg: f64, epoch: f64) -> EquatorialCoordinate {
        let (sin_e, cos_e) = obliquity_deg.to_radians().sin_cos();
        let (sin_l, cos_l) = self.longitude.to_radians().sin_cos();
        let (sin_b, cos_b) = self.latitude.to_radians().sin_cos();

        let sin_dec = sin_b * cos_e + cos_b * sin_e * sin_l;
        let ra = (sin_l * cos_b * cos_e - sin_b * sin_e).atan2(cos_l * cos_b);

        EquatorialCoordinate::new(
            ra.to_degrees(),
            sin_dec.clamp(-1.0, 1.0).asin().to_degrees(),
            epoch,
        )
    }
}

/// Galactic longitude / latitude (IAU 1958 system, J2000 pole)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GalacticCoordinate {
    pub l: f64,
    pub b: f64,
}

impl GalacticCoordinate {
    pub fn new(l: f64, b: f64) -> Self {
        Self { l: normalize_degrees(l), b: b.clamp(-90.0, 90.0) }
    }

    /// Rotate into J2000 equatorial coordinates
    pub fn to_equatorial(&self) -> EquatorialCoordinate {
        let (sin_b, cos_b) = self.b.to_radians().sin_cos();
        let (sin_dp, cos_dp) = GALACTIC_POLE_DEC_DEG.to_radians().sin_cos();
        let (sin_dl, cos_dl) = (GALACTIC_NCP_LON_DEG - self.l).to_radians().sin_cos();

        let sin_dec = sin_b * sin_dp + cos_b * cos_dp * cos_dl;
        let y = cos_b * sin_dl;
        let x = sin_b * cos_dp - cos_b * sin_dp * cos_dl;
        let ra = GALACTIC_POLE_RA_DEG + y.atan2(x).to_degrees();

        EquatorialCoordinate::j2000(ra, sin_dec.clamp(-1.0, 1.0).asin().to_degrees())
    }
}

/// Projected position in viewport pixels (origin top-left, y down)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenCoordinate {
    pub x: f64,
    pub y: f64,
    pub visible: bool,
}

impl ScreenCoordinate {
    /// Placeholder for objects that must not be drawn
    pub const HIDDEN: Self = Self { x: 0.0, y: 0.0, visible: false };

    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }
}
