//! Solar system bodies: identifiers, physical radii and mean orbital elements
//!
//! Elements from the JPL approximate planetary positions table (Standish),
//! reference epoch J2000.0, valid 1800-2050.

use crate::elements::MeanElements;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Body identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl Body {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sun => "Sun",
            Self::Moon => "Moon",
            Self::Mercury => "Mercury",
            Self::Venus => "Venus",
            Self::Earth => "Earth",
            Self::Mars => "Mars",
            Self::Jupiter => "Jupiter",
            Self::Saturn => "Saturn",
            Self::Uranus => "Uranus",
            Self::Neptune => "Neptune",
            Self::Pluto => "Pluto",
        }
    }

    /// Mean radius in kilometers
    pub fn radius_km(&self) -> f64 {
        match self {
            Self::Sun => 696_340.0,
            Self::Moon => 1_737.4,
            Self::Mercury => 2_439.7,
            Self::Venus => 6_051.8,
            Self::Earth => 6_371.0,
            Self::Mars => 3_389.5,
            Self::Jupiter => 69_911.0,
            Self::Saturn => 58_232.0,
            Self::Uranus => 25_362.0,
            Self::Neptune => 24_622.0,
            Self::Pluto => 1_188.3,
        }
    }

    /// Heliocentric mean elements. `None` for the Sun and the Moon; Earth uses
    /// the Earth-Moon barycenter.
    pub fn mean_elements(&self) -> Option<MeanElements> {
        let el = |a, e, i, l, peri, node| MeanElements {
            a,
            e,
            i,
            mean_longitude: l,
            perihelion_longitude: peri,
            node_longitude: node,
        };

        match self {
            Self::Sun | Self::Moon => None,

            Self::Mercury => Some(el(
                [0.387_099_27, 0.000_000_37],
                [0.205_635_93, 0.000_019_06],
                [7.004_979_02, -0.005_947_49],
                [252.250_323_50, 149_472.674_111_75],
                [77.457_796_28, 0.160_476_89],
                [48.330_765_93, -0.125_340_81],
            )),

            Self::Venus => Some(el(
                [0.723_335_66, 0.000_003_90],
                [0.006_776_72, -0.000_041_07],
                [3.394_676_05, -0.000_788_90],
                [181.979_099_50, 58_517.815_387_29],
                [131.602_467_18, 0.002_683_29],
                [76.679_842_55, -0.277_694_18],
            )),

            Self::Earth => Some(el(
                [1.000_002_61, 0.000_005_62],
                [0.016_711_23, -0.000_043_92],
                [-0.000_015_31, -0.012_946_68],
                [100.464_571_66, 35_999.372_449_81],
                [102.937_681_93, 0.323_273_64],
                [0.0, 0.0],
            )),

            Self::Mars => Some(el(
                [1.523_710_34, 0.000_018_47],
                [0.093_394_10, 0.000_078_82],
                [1.849_691_42, -0.008_131_31],
                [-4.553_432_05, 19_140.302_684_99],
                [-23.943_629_59, 0.444_410_88],
                [49.559_538_91, -0.292_573_43],
            )),

            Self::Jupiter => Some(el(
                [5.202_887_00, -0.000_116_07],
                [0.048_386_24, -0.000_132_53],
                [1.304_396_95, -0.001_837_14],
                [34.396_440_51, 3_034.746_127_75],
                [14.728_479_83, 0.212_526_68],
                [100.473_909_09, 0.204_691_06],
            )),

            Self::Saturn => Some(el(
                [9.536_675_94, -0.001_250_60],
                [0.053_861_79, -0.000_509_91],
                [2.485_991_87, 0.001_936_09],
                [49.954_244_23, 1_222.493_622_01],
                [92.598_878_31, -0.418_972_16],
                [113.662_424_48, -0.288_677_94],
            )),

            Self::Uranus => Some(el(
                [19.189_164_64, -0.001_961_76],
                [0.047_257_44, -0.000_043_97],
                [0.772_637_83, -0.002_429_39],
                [313.238_104_51, 428.482_027_85],
                [170.954_276_30, 0.408_052_81],
                [74.016_925_03, 0.042_405_89],
            )),

            Self::Neptune => Some(el(
                [30.069_922_76, 0.000_262_91],
                [0.008_590_48, 0.000_051_05],
                [1.770_043_47, 0.000_353_72],
                [-55.120_029_69, 218.459_453_25],
                [44.964_762_27, -0.322_414_64],
                [131.784_225_74, -0.005_086_64],
            )),

            Self::Pluto => Some(el(
                [39.482_116_75, -0.000_315_96],
                [0.248_827_30, 0.000_051_70],
                [17.140_012_06, 0.000_048_18],
                [238.929_038_33, 145.207_805_15],
                [224.068_916_29, -0.040_629_42],
                [110.303_936_84, -0.011_834_82],
            )),
        }
    }

    /// All bodies including Earth
    pub fn all() -> &'static [Body] {
        &[
            Self::Sun, Self::Moon, Self::Mercury, Self::Venus, Self::Earth,
            Self::Mars, Self::Jupiter, Self::Saturn, Self::Uranus,
            Self::Neptune, Self::Pluto,
        ]
    }

    /// Bodies visible in Earth's sky, in traditional order
    pub fn observable() -> &'static [Body] {
        &[
            Self::Sun, Self::Moon, Self::Mercury, Self::Venus, Self::Mars,
            Self::Jupiter, Self::Saturn, Self::Uranus, Self::Neptune, Self::Pluto,
        ]
    }

    /// Lowercase identifier used on the wire and in cache keys
    pub fn id(&self) -> &'static str {
        match self {
            Self::Sun => "sun",
            Self::Moon => "moon",
            Self::Mercury => "mercury",
            Self::Venus => "venus",
            Self::Earth => "earth",
            Self::Mars => "mars",
            Self::Jupiter => "jupiter",
            Self::Saturn => "saturn",
            Self::Uranus => "uranus",
            Self::Neptune => "neptune",
            Self::Pluto => "pluto",
        }
    }

    /// Position of the body in [`Body::observable`], used to spread synthetic longitudes
    pub fn index(&self) -> usize {
        Self::observable().iter().position(|b| b == self).unwrap_or(Self::observable().len())
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognized body name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownBody(pub String);

impl fmt::Display for UnknownBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown body: {}", self.0)
    }
}

impl std::error::Error for UnknownBody {}

impl FromStr for Body {
    type Err = UnknownBody;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|b| b.id() == lower)
            .ok_or_else(|| UnknownBody(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_names() {
        assert_eq!("Jupiter".parse::<Body>().unwrap(), Body::Jupiter);
        assert_eq!(" moon ".parse::<Body>().unwrap(), Body::Moon);
        assert!("vulcan".parse::<Body>().is_err());
    }

    #[test]
    fn test_elements_only_for_heliocentric_orbits() {
        assert!(Body::Sun.mean_elements().is_none());
        assert!(Body::Moon.mean_elements().is_none());
        for body in Body::all().iter().filter(|b| !matches!(b, Body::Sun | Body::Moon)) {
            assert!(body.mean_elements().is_some(), "{body}");
        }
    }

    #[test]
    fn test_observable_excludes_earth() {
        assert!(!Body::observable().contains(&Body::Earth));
        assert_eq!(Body::Mars.index(), 4);
    }

    #[test]
    fn test_outer_planet_semi_major_axes_increase() {
        let a: Vec<f64> = [Body::Mars, Body::Jupiter, Body::Saturn, Body::Uranus, Body::Neptune]
            .iter()
            .filter_map(|b| b.mean_elements())
            .map(|el| el.a[0])
            .collect();
        assert!(a.windows(2).all(|w| w[0] < w[1]));
    }
}
