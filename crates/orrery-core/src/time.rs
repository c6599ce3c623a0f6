//! Julian Day arithmetic and sidereal time
//!
//! Calendar to Julian Day conversion uses the Fliegel & Van Flandern (1968) integer
//! algorithm so results are reproducible to the last bit across platforms.

use crate::constants::{DAYS_PER_CENTURY, DAYS_PER_YEAR, J2000_JD};
use crate::coordinates::normalize_degrees;
use hifitime::Epoch;

const SECONDS_PER_DAY: f64 = 86_400.0;
const NANOS_PER_DAY: u64 = 86_400_000_000_000;

/// Broken-down UTC calendar instant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalendarInstant {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub nanos: u32,
}

impl CalendarInstant {
    pub fn from_epoch(epoch: Epoch) -> Self {
        let (year, month, day, hour, minute, second, nanos) = epoch.to_gregorian_utc();
        Self { year, month, day, hour, minute, second, nanos }
    }

    pub fn to_epoch(&self) -> Epoch {
        Epoch::from_gregorian_utc(
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.nanos,
        )
    }

    /// Fractional Julian Day
    pub fn julian_day(&self) -> f64 {
        let jdn = julian_day_number(self.year as i64, self.month as i64, self.day as i64);
        let seconds = self.second as f64 + self.nanos as f64 * 1e-9;
        jdn as f64
            + (self.hour as f64 - 12.0) / 24.0
            + self.minute as f64 / 1440.0
            + seconds / SECONDS_PER_DAY
    }
}

/// Julian Day Number of the civil date (noon-based), Fliegel & Van Flandern.
///
/// Integer division truncates toward zero, as in the published algorithm.
pub fn julian_day_number(year: i64, month: i64, day: i64) -> i64 {
    let a = (month - 14) / 12;
    (1461 * (year + 4800 + a)) / 4 + (367 * (month - 2 - 12 * a)) / 12
        - (3 * ((year + 4900 + a) / 100)) / 4
        + day
        - 32075
}

/// Civil date (year, month, day) of a Julian Day Number
pub fn calendar_date(jdn: i64) -> (i64, i64, i64) {
    let mut l = jdn + 68569;
    let n = 4 * l / 146097;
    l -= (146097 * n + 3) / 4;
    let i = 4000 * (l + 1) / 1461001;
    l = l - 1461 * i / 4 + 31;
    let j = 80 * l / 2447;
    let day = l - 2447 * j / 80;
    l = j / 11;
    let month = j + 2 - 12 * l;
    let year = 100 * (n - 49) + i + l;
    (year, month, day)
}

/// Julian Day of an instant (UTC)
pub fn julian_day(epoch: Epoch) -> f64 {
    CalendarInstant::from_epoch(epoch).julian_day()
}

/// Instant for a Julian Day (UTC)
pub fn epoch_from_julian_day(jd: f64) -> Epoch {
    let shifted = jd + 0.5;
    let jdn = shifted.floor();
    let mut nanos = ((shifted - jdn) * NANOS_PER_DAY as f64).round() as u64;
    nanos = nanos.min(NANOS_PER_DAY - 1);

    let (year, month, day) = calendar_date(jdn as i64);
    let secs = nanos / 1_000_000_000;

    CalendarInstant {
        year: year as i32,
        month: month as u8,
        day: day as u8,
        hour: (secs / 3600) as u8,
        minute: ((secs % 3600) / 60) as u8,
        second: (secs % 60) as u8,
        nanos: (nanos % 1_000_000_000) as u32,
    }
    .to_epoch()
}

/// Julian centuries since J2000
pub fn julian_centuries(jd: f64) -> f64 {
    (jd - J2000_JD) / DAYS_PER_CENTURY
}

/// Julian epoch year (e.g. 2024.47) of a Julian Day
pub fn julian_year(jd: f64) -> f64 {
    2000.0 + (jd - J2000_JD) / DAYS_PER_YEAR
}

/// Greenwich Mean Sidereal Time in degrees [0, 360)
pub fn gmst_degrees(jd: f64) -> f64 {
    let d = jd - J2000_JD;
    let t = d / DAYS_PER_CENTURY;
    let gmst = 280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    normalize_degrees(gmst)
}

/// Local Mean Sidereal Time in degrees for an east-positive longitude
pub fn local_sidereal_degrees(jd: f64, longitude_deg: f64) -> f64 {
    normalize_degrees(gmst_degrees(jd) + longitude_deg)
}
