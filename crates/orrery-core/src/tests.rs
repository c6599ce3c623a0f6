//! Cross-module checks of the full transform pipeline

use crate::config::CoordinateSystem;
use crate::coordinates::{EquatorialCoordinate, HorizontalCoordinate};
use crate::observer::ObserverContext;
use crate::pipeline::TransformPipeline;
use crate::projection::{ProjectionMode, Viewport};
use crate::transform::{equatorial_to_horizontal, horizontal_to_equatorial, refract};
use hifitime::Epoch;

const VEGA: (f64, f64) = (279.234735, 38.783689);

fn nyc_solstice_evening() -> ObserverContext {
    let instant = Epoch::from_gregorian_utc(2024, 6, 21, 0, 0, 0, 0);
    ObserverContext::new(40.7128, -74.0060, 10.0, "America/New_York", instant).unwrap()
}

fn pipeline() -> TransformPipeline {
    TransformPipeline::new(ProjectionMode::Stereographic, Viewport::new(1920.0, 1080.0))
}

#[test]
fn test_vega_above_new_york_on_solstice_evening() {
    let observer = nyc_solstice_evening();
    let vega = EquatorialCoordinate::j2000(VEGA.0, VEGA.1);
    let obs = pipeline().observe(&vega, &observer);

    // Rising in the east-northeast at local 20:00
    assert!(obs.horizontal.altitude > 20.0 && obs.horizontal.altitude < 40.0, "{:?}", obs.horizontal);
    assert!(obs.horizontal.azimuth > 45.0 && obs.horizontal.azimuth < 90.0, "{:?}", obs.horizontal);
    assert!(obs.screen.visible);
    assert!(obs.screen.x > 960.0, "east of zenith projects right of center");
}

#[test]
fn test_horizontal_round_trip_without_corrections() {
    let observer = nyc_solstice_evening();
    let lst = observer.local_sidereal_degrees();
    for (ra, dec) in [(10.0, 20.0), (279.2, 38.8), (101.3, -16.7), (200.0, -45.0), (350.0, 75.0)] {
        let c = EquatorialCoordinate::j2000(ra, dec);
        let hor = equatorial_to_horizontal(&c, observer.latitude, lst);
        let back = horizontal_to_equatorial(&hor, observer.latitude, lst, c.epoch);
        assert!(c.separation(&back) < 1e-6, "({ra}, {dec}) -> {back:?}");
    }
}

#[test]
fn test_refraction_monotone_and_not_idempotent() {
    let mut prev = f64::NEG_INFINITY;
    for tenth in -4..=900 {
        let alt = tenth as f64 / 10.0;
        let apparent = refract(&HorizontalCoordinate::new(0.0, alt)).altitude;
        assert!(apparent >= prev, "alt {alt}: {apparent} < {prev}");
        assert!(apparent >= alt);
        prev = apparent;
    }

    let once = refract(&HorizontalCoordinate::new(0.0, 5.0));
    let twice = refract(&once);
    assert!(twice.altitude > once.altitude);
}

#[test]
fn test_prepared_frame_matches_stage_by_stage_path() {
    let observer = nyc_solstice_evening();
    let p = pipeline();
    let frame = p.prepare(&observer, CoordinateSystem::Horizontal);

    for (ra, dec) in [VEGA, (101.287, -16.716), (37.954, 89.264), (213.915, 19.182)] {
        let c = EquatorialCoordinate::j2000(ra, dec);
        let slow = p.observe(&c, &observer);
        let fast = frame.observe(&c);
        assert!((slow.horizontal.altitude - fast.horizontal.altitude).abs() < 1e-8, "({ra}, {dec})");
        assert!((slow.screen.x - fast.screen.x).abs() < 1e-6);
        assert!((slow.screen.y - fast.screen.y).abs() < 1e-6);
        assert_eq!(slow.screen.visible, fast.screen.visible);
    }
}

#[test]
fn test_prepared_frame_handles_non_j2000_epoch() {
    let observer = nyc_solstice_evening();
    let p = pipeline();
    let frame = p.prepare(&observer, CoordinateSystem::Horizontal);
    let c = EquatorialCoordinate::new(150.0, 12.0, 1950.0);
    let slow = p.to_horizontal(&c, &observer);
    let fast = frame.local(&c);
    assert!((slow.altitude - fast.altitude).abs() < 1e-8);
    assert!((slow.azimuth - fast.azimuth).abs() < 1e-8);
}

#[test]
fn test_equatorial_frame_puts_pole_at_center() {
    let observer = nyc_solstice_evening();
    let frame = pipeline().with_precession(false).prepare(&observer, CoordinateSystem::Equatorial);
    assert!(!frame.refraction());
    let pole = frame.local(&EquatorialCoordinate::j2000(0.0, 90.0));
    assert!((pole.altitude - 90.0).abs() < 1e-9);
    let vernal = frame.local(&EquatorialCoordinate::j2000(0.0, 0.0));
    assert!(vernal.altitude.abs() < 1e-9);
    assert!(vernal.azimuth.abs() < 1e-9 || (vernal.azimuth - 360.0).abs() < 1e-9);
}

#[test]
fn test_ecliptic_frame_puts_ecliptic_pole_at_center() {
    let observer = nyc_solstice_evening();
    let frame = pipeline().with_precession(false).prepare(&observer, CoordinateSystem::Ecliptic);
    // North ecliptic pole: RA 18h, Dec 90 - obliquity
    let nep = EquatorialCoordinate::j2000(270.0, 90.0 - 23.4392911);
    assert!(frame.local(&nep).altitude > 89.99);
}

#[test]
fn test_disabled_stages_pass_through() {
    let p = pipeline().with_precession(false).with_refraction(false);
    let c = EquatorialCoordinate::j2000(12.0, 34.0);
    assert_eq!(p.precess(&c, 2_470_000.0), c);
    let hor = HorizontalCoordinate::new(10.0, 1.0);
    assert_eq!(p.refract(&hor), hor);
}
