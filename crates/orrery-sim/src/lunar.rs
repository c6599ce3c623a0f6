//! Low-precision lunar theory: the leading periodic terms of Meeus ch. 47.
//!
//! Good to about a tenth of a degree in longitude, enough for phase, sign and
//! sky placement.

use orrery_core::coordinates::normalize_degrees;
use serde::{Deserialize, Serialize};

/// Geocentric ecliptic position of the Moon, mean equinox of date
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LunarPosition {
    /// Ecliptic longitude (degrees)
    pub longitude: f64,
    /// Ecliptic latitude (degrees)
    pub latitude: f64,
    /// Earth-Moon distance (km)
    pub distance_km: f64,
}

/// Fundamental arguments (degrees) at `t` Julian centuries from J2000
struct Arguments {
    /// Mean longitude L'
    l: f64,
    /// Mean elongation D
    d: f64,
    /// Sun's mean anomaly M
    m: f64,
    /// Moon's mean anomaly M'
    mp: f64,
    /// Argument of latitude F
    f: f64,
}

impl Arguments {
    fn at(t: f64) -> Self {
        let t2 = t * t;
        Self {
            l: 218.316_447_7 + 481_267.881_234_21 * t - 0.001_578_6 * t2,
            d: 297.850_192_1 + 445_267.111_403_4 * t - 0.001_881_9 * t2,
            m: 357.529_109_2 + 35_999.050_290_9 * t - 0.000_153_6 * t2,
            mp: 134.963_396_4 + 477_198.867_505_5 * t + 0.008_741_4 * t2,
            f: 93.272_095_0 + 483_202.017_523_3 * t - 0.003_653_9 * t2,
        }
    }
}

// (D, M, M', F multipliers, longitude coefficient 1e-6°, distance coefficient 1e-3 km)
const LONGITUDE_DISTANCE_TERMS: [(f64, f64, f64, f64, f64, f64); 13] = [
    (0.0, 0.0, 1.0, 0.0, 6_288_774.0, -20_905_355.0),
    (2.0, 0.0, -1.0, 0.0, 1_274_027.0, -3_699_111.0),
    (2.0, 0.0, 0.0, 0.0, 658_314.0, -2_955_968.0),
    (0.0, 0.0, 2.0, 0.0, 213_618.0, -569_925.0),
    (0.0, 1.0, 0.0, 0.0, -185_116.0, 48_888.0),
    (0.0, 0.0, 0.0, 2.0, -114_332.0, -3_149.0),
    (2.0, 0.0, -2.0, 0.0, 58_793.0, 246_158.0),
    (2.0, -1.0, -1.0, 0.0, 57_066.0, -152_138.0),
    (2.0, 0.0, 1.0, 0.0, 53_322.0, -170_733.0),
    (2.0, -1.0, 0.0, 0.0, 45_758.0, -204_586.0),
    (0.0, 1.0, -1.0, 0.0, -40_923.0, -129_620.0),
    (1.0, 0.0, 0.0, 0.0, -34_720.0, 108_743.0),
    (0.0, 1.0, 1.0, 0.0, -30_383.0, 104_755.0),
];

// (D, M, M', F multipliers, latitude coefficient 1e-6°)
const LATITUDE_TERMS: [(f64, f64, f64, f64, f64); 6] = [
    (0.0, 0.0, 0.0, 1.0, 5_128_122.0),
    (0.0, 0.0, 1.0, 1.0, 280_602.0),
    (0.0, 0.0, 1.0, -1.0, 277_693.0),
    (2.0, 0.0, 0.0, -1.0, 173_237.0),
    (2.0, 0.0, -1.0, 1.0, 55_413.0),
    (2.0, 0.0, -1.0, -1.0, 46_271.0),
];

/// Moon position at `t` Julian centuries from J2000
pub fn lunar_position(t: f64) -> LunarPosition {
    let args = Arguments::at(t);
    let angle = |d: f64, m: f64, mp: f64, f: f64| {
        (d * args.d + m * args.m + mp * args.mp + f * args.f).to_radians()
    };

    let (mut sum_l, mut sum_r) = (0.0, 0.0);
    for &(d, m, mp, f, cl, cr) in &LONGITUDE_DISTANCE_TERMS {
        let arg = angle(d, m, mp, f);
        sum_l += cl * arg.sin();
        sum_r += cr * arg.cos();
    }

    let sum_b: f64 = LATITUDE_TERMS
        .iter()
        .map(|&(d, m, mp, f, cb)| cb * angle(d, m, mp, f).sin())
        .sum();

    LunarPosition {
        longitude: normalize_degrees(args.l + sum_l / 1e6),
        latitude: sum_b / 1e6,
        distance_km: 385_000.56 + sum_r / 1e3,
    }
}
