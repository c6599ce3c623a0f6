/// Julian Day of the J2000.0 epoch (2000-01-01T12:00:00)
pub const J2000_JD: f64 = 2_451_545.0;

/// Days per Julian century
pub const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Days per Julian year
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Astronomical unit in kilometers
pub const AU_KM: f64 = 149_597_870.7;

/// Light years per parsec
pub const LIGHT_YEARS_PER_PARSEC: f64 = 3.261_563_777;

/// Mean obliquity of the ecliptic at J2000 (degrees)
pub const OBLIQUITY_J2000_DEG: f64 = 23.439_291_1;

/// Altitude at which an object is considered to have set (degrees).
/// Refraction is only applied above this value.
pub const HORIZON_CUTOFF_DEG: f64 = -0.5;

/// J2000 right ascension of the north galactic pole (degrees)
pub const GALACTIC_POLE_RA_DEG: f64 = 192.859_48;

/// J2000 declination of the north galactic pole (degrees)
pub const GALACTIC_POLE_DEC_DEG: f64 = 27.128_25;

/// Galactic longitude of the north celestial pole (degrees)
pub const GALACTIC_NCP_LON_DEG: f64 = 122.931_92;

/// Mean synodic month (days)
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_853;

/// Arcseconds per degree
pub const ARCSEC_PER_DEG: f64 = 3600.0;
