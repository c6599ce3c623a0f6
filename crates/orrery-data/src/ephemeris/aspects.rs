//! Aspect detection between pairs of bodies

use super::model::BodyModel;
use super::positions::positions;
use super::types::{AspectKind, AspectRecord};
use hifitime::{Duration, Epoch};
use orrery_sim::Body;

/// Orb at or below which an aspect is reported as exact (degrees)
pub const EXACT_ORB_DEG: f64 = 1.0;

/// Closest aspect kind within `orb_tolerance` of a separation in [0, 180]
pub fn classify(separation: f64, orb_tolerance: f64) -> Option<(AspectKind, f64)> {
    AspectKind::ALL
        .iter()
        .map(|kind| (*kind, (separation - kind.angle()).abs()))
        .filter(|(_, orb)| *orb <= orb_tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Every pair of `bodies` in aspect at `instant`
///
/// `applying` compares the orb with the one an hour later.
pub fn aspects(
    model: &dyn BodyModel,
    bodies: &[Body],
    instant: Epoch,
    orb_tolerance: f64,
) -> Vec<AspectRecord> {
    let now = positions(model, bodies, instant, None);
    let later = positions(model, bodies, instant + Duration::from_hours(1.0), None);

    let mut out = Vec::new();
    for i in 0..now.len() {
        for j in (i + 1)..now.len() {
            let separation = now[i].longitude_separation(&now[j]);
            let Some((kind, orb)) = classify(separation, orb_tolerance) else {
                continue;
            };
            let orb_later = (later[i].longitude_separation(&later[j]) - kind.angle()).abs();

            out.push(AspectRecord {
                body1: now[i].body,
                body2: now[j].body,
                kind,
                angle: kind.angle(),
                separation,
                orb,
                exact: orb <= EXACT_ORB_DEG,
                applying: orb_later < orb,
            });
        }
    }
    out
}
