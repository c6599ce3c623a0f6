//! Screen-space star picking

use orrery_core::{PreparedFrame, ScreenCoordinate};
use orrery_data::StarRecord;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Farthest a click may land from a star and still pick it
pub const PICK_RADIUS_PX: f64 = 20.0;

/// Screen positions of `stars` for a frame, in parallel
pub fn project_stars(stars: &[StarRecord], frame: &PreparedFrame) -> Vec<ScreenCoordinate> {
    stars.par_iter().map(|s| frame.project(&s.position)).collect()
}

/// Index of the visible star nearest to (x, y) within `radius` pixels.
/// Equal distances go to the brighter (lower magnitude) star.
pub fn pick_nearest(
    stars: &[StarRecord],
    screen: &[ScreenCoordinate],
    x: f64,
    y: f64,
    radius: f64,
) -> Option<usize> {
    stars
        .iter()
        .zip(screen)
        .enumerate()
        .filter(|(_, (_, s))| s.visible)
        .map(|(i, (star, s))| (i, s.distance_to(x, y), star.magnitude))
        .filter(|(_, d, _)| *d <= radius)
        .min_by(|a, b| match a.1.total_cmp(&b.1) {
            Ordering::Equal => a.2.total_cmp(&b.2),
            other => other,
        })
        .map(|(i, _, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_core::EquatorialCoordinate;
    use orrery_data::ProperMotion;

    fn star(id: &str, magnitude: f64) -> StarRecord {
        StarRecord {
            id: id.into(),
            name: None,
            position: EquatorialCoordinate::j2000(0.0, 0.0),
            magnitude,
            color_index: 0.0,
            spectral_class: "G2V".into(),
            proper_motion: ProperMotion::default(),
            parallax: None,
            distance_pc: None,
            constellation: "Ori".into(),
        }
    }

    fn at(x: f64, y: f64) -> ScreenCoordinate {
        ScreenCoordinate { x, y, visible: true }
    }

    #[test]
    fn test_click_near_star_hits() {
        let stars = [star("A", 3.0)];
        let screen = [at(100.0, 100.0)];
        assert_eq!(pick_nearest(&stars, &screen, 105.0, 103.0, PICK_RADIUS_PX), Some(0));
        assert_eq!(pick_nearest(&stars, &screen, 200.0, 200.0, PICK_RADIUS_PX), None);
    }

    #[test]
    fn test_radius_edge() {
        let stars = [star("A", 3.0)];
        let screen = [at(100.0, 100.0)];
        assert_eq!(pick_nearest(&stars, &screen, 120.0, 100.0, PICK_RADIUS_PX), Some(0));
        assert_eq!(pick_nearest(&stars, &screen, 120.1, 100.0, PICK_RADIUS_PX), None);
    }

    #[test]
    fn test_nearest_wins_then_brightest() {
        let stars = [star("far", -1.0), star("near", 5.0), star("tie-dim", 4.0), star("tie-bright", 1.0)];
        let screen = [at(110.0, 100.0), at(103.0, 100.0), at(97.0, 100.0), at(100.0, 97.0)];
        // "near", "tie-dim" and "tie-bright" are all 3 px away; the brightest of them wins
        assert_eq!(pick_nearest(&stars, &screen, 100.0, 100.0, PICK_RADIUS_PX), Some(3));

        let screen = [at(110.0, 100.0), at(101.0, 100.0), at(97.0, 100.0), at(100.0, 97.0)];
        assert_eq!(pick_nearest(&stars, &screen, 100.0, 100.0, PICK_RADIUS_PX), Some(1));
    }

    #[test]
    fn test_hidden_stars_never_picked() {
        let stars = [star("A", 1.0)];
        let screen = [ScreenCoordinate { x: 100.0, y: 100.0, visible: false }];
        assert_eq!(pick_nearest(&stars, &screen, 100.0, 100.0, PICK_RADIUS_PX), None);
    }
}
