//! Asterism line figures drawn between bright stars

use crate::stars::StarRecord;
use orrery_core::EquatorialCoordinate;
use std::collections::HashMap;

/// A named figure as Hipparcos-number pairs
#[derive(Clone, Copy, Debug)]
pub struct Asterism {
    pub name: &'static str,
    pub segments: &'static [(u32, u32)],
}

pub const ASTERISMS: [Asterism; 4] = [
    Asterism {
        name: "Summer Triangle",
        segments: &[(91262, 102098), (102098, 97649), (97649, 91262)],
    },
    Asterism {
        name: "Winter Triangle",
        segments: &[(27989, 37279), (37279, 32349), (32349, 27989)],
    },
    Asterism {
        name: "Winter Hexagon",
        segments: &[
            (32349, 24436),
            (24436, 21421),
            (21421, 24608),
            (24608, 37826),
            (37826, 37279),
            (37279, 32349),
        ],
    },
    Asterism {
        name: "Spring Triangle",
        segments: &[(69673, 65474), (65474, 49669), (49669, 69673)],
    },
];

/// Line segments whose endpoints are both present in `stars`
pub fn asterism_segments(stars: &[StarRecord]) -> Vec<(EquatorialCoordinate, EquatorialCoordinate)> {
    let by_id: HashMap<&str, &EquatorialCoordinate> =
        stars.iter().map(|s| (s.id.as_str(), &s.position)).collect();

    ASTERISMS
        .iter()
        .flat_map(|a| a.segments.iter())
        .filter_map(|(a, b)| {
            let a = by_id.get(format!("HIP{a}").as_str())?;
            let b = by_id.get(format!("HIP{b}").as_str())?;
            Some((**a, **b))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bright::bright_stars;

    #[test]
    fn test_all_segments_resolve_against_bright_stars() {
        let stars = bright_stars(10.0);
        let expected: usize = ASTERISMS.iter().map(|a| a.segments.len()).sum();
        assert_eq!(asterism_segments(&stars).len(), expected);
    }

    #[test]
    fn test_missing_endpoints_drop_segment() {
        // Magnitude 0.5 keeps Sirius, Procyon, Betelgeuse but not Deneb or Regulus
        let stars = bright_stars(0.5);
        let segments = asterism_segments(&stars);
        assert!(segments.len() >= 3, "winter triangle survives");
        assert!(segments.len() < 16);
    }
}
