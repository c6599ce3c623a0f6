//! Messier deep-sky objects, served as star-like records for rendering

use crate::stars::{constellation_for, ProperMotion, StarRecord};
use orrery_core::EquatorialCoordinate;
use serde::{Deserialize, Serialize};

/// Deep-sky object type; its code is stored as the record's spectral class
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeepSkyKind {
    Galaxy,
    GlobularCluster,
    OpenCluster,
    Nebula,
    PlanetaryNebula,
    SupernovaRemnant,
}

impl DeepSkyKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Galaxy => "GX",
            Self::GlobularCluster => "GC",
            Self::OpenCluster => "OC",
            Self::Nebula => "NB",
            Self::PlanetaryNebula => "PN",
            Self::SupernovaRemnant => "SNR",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "GX" => Some(Self::Galaxy),
            "GC" => Some(Self::GlobularCluster),
            "OC" => Some(Self::OpenCluster),
            "NB" => Some(Self::Nebula),
            "PN" => Some(Self::PlanetaryNebula),
            "SNR" => Some(Self::SupernovaRemnant),
            _ => None,
        }
    }
}

use DeepSkyKind::*;

// (number, name, ra, dec, magnitude, kind)
const MESSIER: [(u32, &str, f64, f64, f64, DeepSkyKind); 28] = [
    (1, "Crab Nebula", 83.633, 22.014, 8.4, SupernovaRemnant),
    (3, "", 205.548, 28.377, 6.2, GlobularCluster),
    (4, "", 245.897, -26.526, 5.6, GlobularCluster),
    (5, "", 229.638, 2.081, 5.6, GlobularCluster),
    (6, "Butterfly Cluster", 265.083, -32.253, 4.2, OpenCluster),
    (7, "Ptolemy Cluster", 268.463, -34.793, 3.3, OpenCluster),
    (8, "Lagoon Nebula", 270.904, -24.387, 6.0, Nebula),
    (11, "Wild Duck Cluster", 282.771, -6.272, 6.3, OpenCluster),
    (13, "Hercules Cluster", 250.423, 36.461, 5.8, GlobularCluster),
    (15, "", 322.493, 12.167, 6.2, GlobularCluster),
    (16, "Eagle Nebula", 274.700, -13.807, 6.0, Nebula),
    (17, "Omega Nebula", 275.196, -16.171, 6.0, Nebula),
    (20, "Trifid Nebula", 270.596, -23.030, 6.3, Nebula),
    (22, "", 279.100, -23.905, 5.1, GlobularCluster),
    (27, "Dumbbell Nebula", 299.902, 22.721, 7.5, PlanetaryNebula),
    (31, "Andromeda Galaxy", 10.685, 41.269, 3.4, Galaxy),
    (33, "Triangulum Galaxy", 23.462, 30.660, 5.7, Galaxy),
    (35, "", 92.225, 24.333, 5.3, OpenCluster),
    (42, "Orion Nebula", 83.822, -5.391, 4.0, Nebula),
    (44, "Beehive Cluster", 130.100, 19.667, 3.7, OpenCluster),
    (45, "Pleiades", 56.750, 24.117, 1.6, OpenCluster),
    (51, "Whirlpool Galaxy", 202.470, 47.195, 8.4, Galaxy),
    (57, "Ring Nebula", 283.396, 33.029, 8.8, PlanetaryNebula),
    (81, "Bode's Galaxy", 148.888, 69.065, 6.9, Galaxy),
    (82, "Cigar Galaxy", 148.970, 69.680, 8.4, Galaxy),
    (87, "Virgo A", 187.706, 12.391, 8.6, Galaxy),
    (101, "Pinwheel Galaxy", 210.802, 54.349, 7.9, Galaxy),
    (104, "Sombrero Galaxy", 189.998, -11.623, 8.0, Galaxy),
];

/// Messier objects no fainter than `max_magnitude`
pub fn messier_objects(max_magnitude: f64) -> Vec<StarRecord> {
    MESSIER
        .iter()
        .filter(|m| m.4 <= max_magnitude)
        .map(|&(number, name, ra, dec, magnitude, kind)| StarRecord {
            id: format!("M{number}"),
            name: (!name.is_empty()).then(|| name.to_string()),
            position: EquatorialCoordinate::j2000(ra, dec),
            magnitude,
            color_index: 0.0,
            spectral_class: kind.code().to_string(),
            proper_motion: ProperMotion::default(),
            parallax: None,
            distance_pc: None,
            constellation: constellation_for(ra, dec).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messier_records() {
        let all = messier_objects(99.0);
        assert_eq!(all.len(), MESSIER.len());
        let m31 = all.iter().find(|m| m.id == "M31").unwrap();
        assert_eq!(m31.label(), "Andromeda Galaxy");
        assert_eq!(DeepSkyKind::from_code(&m31.spectral_class), Some(DeepSkyKind::Galaxy));
        assert_eq!(all.iter().find(|m| m.id == "M3").unwrap().label(), "M3");
    }

    #[test]
    fn test_messier_magnitude_filter() {
        assert!(messier_objects(5.0).iter().all(|m| m.magnitude <= 5.0));
        assert!(messier_objects(5.0).iter().any(|m| m.id == "M45"));
    }
}
