//! Pure coordinate transform stages: precession, horizon conversion, refraction,
//! atmospheric extinction and frame rotations for the GPU path.

use crate::constants::{ARCSEC_PER_DEG, HORIZON_CUTOFF_DEG};
use crate::coordinates::{
    normalize_degrees, EquatorialCoordinate, HorizontalCoordinate,
};
use crate::time::{julian_centuries, julian_year};
use glam::{DMat3, DVec3};

/// IAU 1976 precession angles (radians)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrecessionAngles {
    pub zeta: f64,
    pub z: f64,
    pub theta: f64,
}

impl PrecessionAngles {
    /// Angles carrying coordinates from the equinox at `jd_from` to `jd_to`.
    ///
    /// `T` is the starting epoch in centuries from J2000 and `t` the interval in
    /// centuries (Lieske 1977 general form).
    pub fn between(jd_from: f64, jd_to: f64) -> Self {
        let big_t = julian_centuries(jd_from);
        let t = (jd_to - jd_from) / crate::constants::DAYS_PER_CENTURY;
        let t2 = t * t;
        let t3 = t2 * t;

        let base = 2306.2181 + 1.39656 * big_t - 0.000139 * big_t * big_t;
        let zeta = base * t + (0.30188 - 0.000344 * big_t) * t2 + 0.017998 * t3;
        let z = base * t + (1.09468 + 0.000066 * big_t) * t2 + 0.018203 * t3;
        let theta = (2004.3109 - 0.85330 * big_t - 0.000217 * big_t * big_t) * t
            - (0.42665 + 0.000217 * big_t) * t2
            - 0.041833 * t3;

        let to_rad = |arcsec: f64| (arcsec / ARCSEC_PER_DEG).to_radians();
        Self { zeta: to_rad(zeta), z: to_rad(z), theta: to_rad(theta) }
    }

    /// Rotation matrix R3(-z) · R2(θ) · R3(-ζ) acting on unit vectors
    pub fn matrix(&self) -> DMat3 {
        DMat3::from_rotation_z(self.z)
            * DMat3::from_rotation_y(-self.theta)
            * DMat3::from_rotation_z(self.zeta)
    }
}

/// Precess an equatorial coordinate to the equinox of `jd_target`
pub fn precess(coord: &EquatorialCoordinate, jd_target: f64) -> EquatorialCoordinate {
    let angles = PrecessionAngles::between(coord.epoch_jd(), jd_target);
    let target_epoch = julian_year(jd_target);

    let (sin_dec, cos_dec) = coord.dec.to_radians().sin_cos();
    let (sin_th, cos_th) = angles.theta.sin_cos();
    let (sin_a, cos_a) = (coord.ra.to_radians() + angles.zeta).sin_cos();

    let a = cos_dec * sin_a;
    let b = cos_th * cos_dec * cos_a - sin_th * sin_dec;
    let c = sin_th * cos_dec * cos_a + cos_th * sin_dec;

    let ra = (a.atan2(b) + angles.z).to_degrees();
    // Near the poles asin(c) loses precision; recover from the horizontal component
    let dec = c.atan2((a * a + b * b).sqrt()).to_degrees();

    EquatorialCoordinate::new(ra, dec, target_epoch)
}

/// Mean obliquity of the ecliptic (degrees), IAU 1980
pub fn mean_obliquity(jd: f64) -> f64 {
    let t = julian_centuries(jd);
    23.439_291_1 - 0.013_004_2 * t - 1.64e-7 * t * t + 5.036e-7 * t * t * t
}

/// Equatorial to horizontal for a latitude and local sidereal time (degrees)
pub fn equatorial_to_horizontal(
    coord: &EquatorialCoordinate,
    latitude_deg: f64,
    lst_deg: f64,
) -> HorizontalCoordinate {
    let ha = (lst_deg - coord.ra).to_radians();
    let (sin_ha, cos_ha) = ha.sin_cos();
    let (sin_dec, cos_dec) = coord.dec.to_radians().sin_cos();
    let (sin_lat, cos_lat) = latitude_deg.to_radians().sin_cos();

    let sin_alt = sin_dec * sin_lat + cos_dec * cos_lat * cos_ha;
    let north = sin_dec * cos_lat - cos_dec * sin_lat * cos_ha;
    let east = -cos_dec * sin_ha;

    // Objects with sin(HA) > 0 are west of the meridian: east < 0 puts the
    // azimuth in (180, 360)
    let azimuth = normalize_degrees(east.atan2(north).to_degrees());
    let altitude = sin_alt.atan2(north.hypot(east)).to_degrees();

    HorizontalCoordinate { azimuth, altitude }
}

/// Inverse of [`equatorial_to_horizontal`]; the result is tagged with `epoch`
pub fn horizontal_to_equatorial(
    hor: &HorizontalCoordinate,
    latitude_deg: f64,
    lst_deg: f64,
    epoch: f64,
) -> EquatorialCoordinate {
    let (sin_az, cos_az) = hor.azimuth.to_radians().sin_cos();
    let (sin_alt, cos_alt) = hor.altitude.to_radians().sin_cos();
    let (sin_lat, cos_lat) = latitude_deg.to_radians().sin_cos();

    let sin_dec = sin_alt * sin_lat + cos_alt * cos_lat * cos_az;
    let y = -sin_az * cos_alt;
    let x = sin_alt * cos_lat - cos_alt * sin_lat * cos_az;

    let ha = y.atan2(x).to_degrees();
    let dec = sin_dec.atan2(x.hypot(y)).to_degrees();

    EquatorialCoordinate::new(lst_deg - ha, dec, epoch)
}

/// Rotation taking equatorial-of-date unit vectors into the local (north, east, up) frame
pub fn horizontal_rotation(latitude_deg: f64, lst_deg: f64) -> DMat3 {
    let (sin_lat, cos_lat) = latitude_deg.to_radians().sin_cos();
    // Rows: north, east, up applied to hour-angle frame vectors
    let to_local = DMat3::from_cols(
        DVec3::new(-sin_lat, 0.0, cos_lat),
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(cos_lat, 0.0, sin_lat),
    );
    to_local * DMat3::from_rotation_z(-lst_deg.to_radians())
}

/// Rotation from equatorial to ecliptic unit vectors for an obliquity (degrees)
pub fn ecliptic_rotation(obliquity_deg: f64) -> DMat3 {
    DMat3::from_rotation_x(-obliquity_deg.to_radians())
}

/// Atmospheric refraction (arcminutes) for an apparent altitude in degrees.
///
/// Sæmundsson/Bennett form. Zero at and below the horizon cutoff and never negative
/// (the raw formula dips a few thousandths of an arcminute below zero at the zenith).
pub fn refraction_arcmin(altitude_deg: f64) -> f64 {
    if !(altitude_deg > HORIZON_CUTOFF_DEG) {
        return 0.0;
    }
    let h = altitude_deg;
    let arg = (h + 10.3 / (h + 5.11)).to_radians();
    (1.02 / arg.tan()).max(0.0)
}

/// Apply refraction once; altitudes at or below the cutoff pass through untouched
pub fn refract(hor: &HorizontalCoordinate) -> HorizontalCoordinate {
    let lift = refraction_arcmin(hor.altitude) / 60.0;
    HorizontalCoordinate {
        azimuth: hor.azimuth,
        altitude: (hor.altitude + lift).min(90.0),
    }
}

/// Relative airmass (plane-parallel), `None` below the horizon
pub fn airmass(altitude_deg: f64) -> Option<f64> {
    if altitude_deg <= 0.0 {
        return None;
    }
    // Cap near the horizon where 1/sin diverges
    Some(1.0 / altitude_deg.max(1.0).to_radians().sin())
}

/// Brightness factor after atmospheric extinction, 1.0 at the zenith
pub fn extinction_factor(altitude_deg: f64) -> f64 {
    match airmass(altitude_deg) {
        Some(x) => (-0.2 * (x - 1.0)).exp(),
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::J2000_JD;

    #[test]
    fn test_precession_identity() {
        let c = EquatorialCoordinate::j2000(41.054063, 49.227750);
        let p = precess(&c, J2000_JD);
        assert!((p.ra - c.ra).abs() < 1e-12);
        assert!((p.dec - c.dec).abs() < 1e-12);
    }

    #[test]
    fn test_precession_meeus_theta_persei() {
        // Meeus example 21.b: θ Persei J2000 -> 2028-11-13.19 TD
        // (proper motion removed: 41.547214°, 49.348483° from 41.054063°, 49.227750°)
        let c = EquatorialCoordinate::j2000(41.054063, 49.227750);
        let p = precess(&c, 2_462_088.69);
        assert!((p.ra - 41.547214).abs() < 1e-3, "ra {}", p.ra);
        assert!((p.dec - 49.348483).abs() < 1e-3, "dec {}", p.dec);
    }

    #[test]
    fn test_precession_matrix_matches_formula() {
        let c = EquatorialCoordinate::j2000(279.234735, 38.783689);
        let jd = 2_460_482.5;
        let p = precess(&c, jd);
        let m = PrecessionAngles::between(J2000_JD, jd).matrix();
        let v = EquatorialCoordinate::from_unit_vector(m * c.to_unit_vector(), p.epoch);
        assert!((v.ra - p.ra).abs() < 1e-9);
        assert!((v.dec - p.dec).abs() < 1e-9);
    }

    #[test]
    fn test_meridian_transit() {
        // A star on the meridian (HA = 0) south of the zenith sits at azimuth 180
        let c = EquatorialCoordinate::j2000(100.0, 10.0);
        let hor = equatorial_to_horizontal(&c, 40.0, 100.0);
        assert!((hor.azimuth - 180.0).abs() < 1e-9);
        assert!((hor.altitude - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_west_half_when_sin_ha_positive() {
        let c = EquatorialCoordinate::j2000(100.0, 10.0);
        let hor = equatorial_to_horizontal(&c, 40.0, 130.0); // HA = +30°
        assert!(hor.azimuth > 180.0 && hor.azimuth < 360.0, "az {}", hor.azimuth);
        let hor = equatorial_to_horizontal(&c, 40.0, 70.0); // HA = -30°
        assert!(hor.azimuth > 0.0 && hor.azimuth < 180.0, "az {}", hor.azimuth);
    }

    #[test]
    fn test_horizontal_rotation_matches_scalar_path() {
        let lat = 40.7128;
        let lst = 231.5;
        let m = horizontal_rotation(lat, lst);
        for (ra, dec) in [(279.23, 38.78), (101.28, -16.71), (37.95, 89.26), (200.0, -60.0)] {
            let c = EquatorialCoordinate::j2000(ra, dec);
            let hor = equatorial_to_horizontal(&c, lat, lst);
            let v = m * c.to_unit_vector();
            let local = hor.to_local_vector();
            assert!((v - local).length() < 1e-12, "ra={ra} dec={dec}");
        }
    }

    #[test]
    fn test_refraction_at_horizon() {
        // About 29' at zero altitude for this formula
        let r = refraction_arcmin(0.0);
        assert!((r - 28.9).abs() < 0.5, "r = {r}");
        assert_eq!(refraction_arcmin(-0.6), 0.0);
        assert!(refraction_arcmin(90.0) >= 0.0);
    }

    #[test]
    fn test_extinction() {
        assert!((extinction_factor(90.0) - 1.0).abs() < 1e-12);
        assert!(extinction_factor(30.0) < 1.0);
        assert!(extinction_factor(5.0) < extinction_factor(30.0));
        assert_eq!(extinction_factor(-1.0), 0.0);
        assert!((airmass(30.0).unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_obliquity_at_j2000() {
        assert!((mean_obliquity(J2000_JD) - 23.4392911).abs() < 1e-9);
    }
}
