//! The brightest real stars, always merged into every star catalog
//!
//! Positions J2000 (Hipparcos), proper motion mas/yr, parallax mas.

use crate::stars::{ProperMotion, StarRecord};
use orrery_core::EquatorialCoordinate;

struct BrightStar {
    hip: u32,
    name: &'static str,
    ra: f64,
    dec: f64,
    magnitude: f64,
    color_index: f64,
    spectral_class: &'static str,
    pm: (f64, f64),
    parallax: f64,
    constellation: &'static str,
}

const BRIGHT_STARS: [BrightStar; 18] = [
    BrightStar { hip: 32349, name: "Sirius", ra: 101.287155, dec: -16.716116, magnitude: -1.46, color_index: 0.00, spectral_class: "A1V", pm: (-546.01, -1223.07), parallax: 379.21, constellation: "CMa" },
    BrightStar { hip: 30438, name: "Canopus", ra: 95.987958, dec: -52.695661, magnitude: -0.74, color_index: 0.15, spectral_class: "A9II", pm: (19.93, 23.24), parallax: 10.55, constellation: "Car" },
    BrightStar { hip: 69673, name: "Arcturus", ra: 213.915300, dec: 19.182410, magnitude: -0.05, color_index: 1.23, spectral_class: "K1.5III", pm: (-1093.39, -2000.06), parallax: 88.83, constellation: "Boo" },
    BrightStar { hip: 91262, name: "Vega", ra: 279.234735, dec: 38.783689, magnitude: 0.03, color_index: 0.00, spectral_class: "A0V", pm: (200.94, 286.23), parallax: 130.23, constellation: "Lyr" },
    BrightStar { hip: 24608, name: "Capella", ra: 79.172328, dec: 45.997991, magnitude: 0.08, color_index: 0.80, spectral_class: "G8III", pm: (75.25, -426.89), parallax: 76.20, constellation: "Aur" },
    BrightStar { hip: 24436, name: "Rigel", ra: 78.634467, dec: -8.201638, magnitude: 0.13, color_index: -0.03, spectral_class: "B8Ia", pm: (1.31, 0.50), parallax: 3.78, constellation: "Ori" },
    BrightStar { hip: 37279, name: "Procyon", ra: 114.825493, dec: 5.224993, magnitude: 0.37, color_index: 0.42, spectral_class: "F5IV", pm: (-714.59, -1036.80), parallax: 284.56, constellation: "CMi" },
    BrightStar { hip: 27989, name: "Betelgeuse", ra: 88.792939, dec: 7.407064, magnitude: 0.42, color_index: 1.85, spectral_class: "M1Ia", pm: (27.54, 11.30), parallax: 6.55, constellation: "Ori" },
    BrightStar { hip: 7588, name: "Achernar", ra: 24.428523, dec: -57.236753, magnitude: 0.46, color_index: -0.16, spectral_class: "B6V", pm: (87.00, -38.24), parallax: 23.39, constellation: "Eri" },
    BrightStar { hip: 97649, name: "Altair", ra: 297.695827, dec: 8.868321, magnitude: 0.76, color_index: 0.22, spectral_class: "A7V", pm: (536.23, 385.29), parallax: 194.95, constellation: "Aql" },
    BrightStar { hip: 21421, name: "Aldebaran", ra: 68.980163, dec: 16.509302, magnitude: 0.86, color_index: 1.54, spectral_class: "K5III", pm: (63.45, -188.94), parallax: 48.94, constellation: "Tau" },
    BrightStar { hip: 80763, name: "Antares", ra: 247.351915, dec: -26.432003, magnitude: 0.91, color_index: 1.83, spectral_class: "M1.5Iab", pm: (-12.11, -23.30), parallax: 5.89, constellation: "Sco" },
    BrightStar { hip: 65474, name: "Spica", ra: 201.298247, dec: -11.161319, magnitude: 0.97, color_index: -0.23, spectral_class: "B1V", pm: (-42.35, -30.67), parallax: 13.06, constellation: "Vir" },
    BrightStar { hip: 37826, name: "Pollux", ra: 116.328958, dec: 28.026199, magnitude: 1.14, color_index: 1.00, spectral_class: "K0III", pm: (-626.55, -45.80), parallax: 96.54, constellation: "Gem" },
    BrightStar { hip: 113368, name: "Fomalhaut", ra: 344.412693, dec: -29.622237, magnitude: 1.16, color_index: 0.09, spectral_class: "A3V", pm: (328.95, -164.67), parallax: 129.81, constellation: "PsA" },
    BrightStar { hip: 102098, name: "Deneb", ra: 310.357980, dec: 45.280339, magnitude: 1.25, color_index: 0.09, spectral_class: "A2Ia", pm: (2.01, 1.85), parallax: 2.31, constellation: "Cyg" },
    BrightStar { hip: 49669, name: "Regulus", ra: 152.092962, dec: 11.967209, magnitude: 1.40, color_index: -0.09, spectral_class: "B8IV", pm: (-248.73, 5.59), parallax: 41.13, constellation: "Leo" },
    BrightStar { hip: 11767, name: "Polaris", ra: 37.954561, dec: 89.264109, magnitude: 1.97, color_index: 0.64, spectral_class: "F7Ib", pm: (44.48, -11.85), parallax: 7.54, constellation: "UMi" },
];

impl BrightStar {
    fn to_record(&self) -> StarRecord {
        StarRecord {
            id: format!("HIP{}", self.hip),
            name: Some(self.name.to_string()),
            position: EquatorialCoordinate::j2000(self.ra, self.dec),
            magnitude: self.magnitude,
            color_index: self.color_index,
            spectral_class: self.spectral_class.to_string(),
            proper_motion: ProperMotion { ra: self.pm.0, dec: self.pm.1 },
            parallax: Some(self.parallax),
            distance_pc: None,
            constellation: self.constellation.to_string(),
        }
    }
}

/// Bright stars no fainter than `max_magnitude`
pub fn bright_stars(max_magnitude: f64) -> Vec<StarRecord> {
    BRIGHT_STARS
        .iter()
        .filter(|s| s.magnitude <= max_magnitude)
        .map(BrightStar::to_record)
        .collect()
}

/// Catalog ids of every bright star
pub fn bright_star_ids() -> impl Iterator<Item = String> {
    BRIGHT_STARS.iter().map(|s| format!("HIP{}", s.hip))
}
