//! Retrograde loop detection by fixed-step longitude sampling

use super::model::BodyModel;
use super::types::RetrogradePeriod;
use crate::error::{DataError, DataResult};
use hifitime::{Duration, Epoch};
use orrery_core::coordinates::wrap_degrees;
use orrery_sim::Body;

/// Cosmetic shadow before the station retrograde and after the station direct
pub const SHADOW_DAYS: f64 = 14.0;

const MAX_SAMPLES: usize = 200_000;

/// Retrograde periods of `body` within `[start, end]`
///
/// A step is retrograde when the wrapped longitude change is negative. Station
/// instants are interpolated where the per-step speed crosses zero.
pub fn retrograde_periods(
    model: &dyn BodyModel,
    body: Body,
    start: Epoch,
    end: Epoch,
    step_days: f64,
) -> DataResult<Vec<RetrogradePeriod>> {
    if !(step_days.is_finite() && step_days > 0.0) {
        return Err(DataError::InvalidRequest(format!("step must be positive, got {step_days}")));
    }
    let span_days = (end - start).to_unit(hifitime::Unit::Day);
    if span_days <= 0.0 {
        return Err(DataError::InvalidRequest("end must be after start".into()));
    }
    let steps = (span_days / step_days).ceil() as usize;
    if steps > MAX_SAMPLES {
        return Err(DataError::InvalidRequest(format!("{steps} samples exceeds {MAX_SAMPLES}")));
    }

    let step = Duration::from_days(step_days);
    let mut longitudes = Vec::with_capacity(steps + 1);
    let mut t = start;
    for _ in 0..=steps {
        longitudes.push(model.longitude(body, t));
        t += step;
    }

    // speeds[k] is the mean motion over [t_k, t_k+1], sampled at the step midpoint
    let speeds: Vec<f64> = longitudes.windows(2).map(|w| wrap_degrees(w[1] - w[0]) / step_days).collect();
    let midpoint = |k: usize| start + step * (k as f64 + 0.5);

    let station = |k: usize| {
        // zero crossing between midpoints k-1 and k
        let (a, b) = (speeds[k - 1], speeds[k]);
        let frac = if a == b { 0.5 } else { a / (a - b) };
        midpoint(k - 1) + step * frac
    };

    let mut periods = Vec::new();
    let mut current: Option<RetrogradePeriod> = None;

    for (k, &speed) in speeds.iter().enumerate() {
        if speed < 0.0 {
            if let Some(period) = current.as_mut() {
                period.peak_speed = period.peak_speed.min(speed);
            } else {
                let station_retrograde = (k > 0).then(|| station(k));
                current = Some(RetrogradePeriod {
                    body,
                    station_retrograde,
                    station_direct: None,
                    pre_shadow: station_retrograde.map(|s| s - Duration::from_days(SHADOW_DAYS)),
                    post_shadow: None,
                    peak_speed: speed,
                });
            }
        } else if let Some(mut period) = current.take() {
            let direct = station(k);
            period.station_direct = Some(direct);
            period.post_shadow = Some(direct + Duration::from_days(SHADOW_DAYS));
            periods.push(period);
        }
    }
    periods.extend(current);

    Ok(periods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::model::KeplerianModel;
    use crate::ephemeris::synthetic::SyntheticModel;

    fn days_between(a: Epoch, b: Epoch) -> f64 {
        (b - a).to_unit(hifitime::Unit::Day).abs()
    }

    #[test]
    fn test_mars_2024_2025_loop() {
        // Station retrograde 2024-12-06, station direct 2025-02-24
        let start = Epoch::from_gregorian_utc(2024, 10, 1, 0, 0, 0, 0);
        let end = Epoch::from_gregorian_utc(2025, 5, 1, 0, 0, 0, 0);
        let periods = retrograde_periods(&KeplerianModel, Body::Mars, start, end, 1.0).unwrap();
        assert_eq!(periods.len(), 1);

        let p = &periods[0];
        let sr = p.station_retrograde.unwrap();
        let sd = p.station_direct.unwrap();
        assert!(days_between(sr, Epoch::from_gregorian_utc(2024, 12, 6, 0, 0, 0, 0)) < 4.0);
        assert!(days_between(sd, Epoch::from_gregorian_utc(2025, 2, 24, 0, 0, 0, 0)) < 4.0);
        assert!((days_between(p.pre_shadow.unwrap(), sr) - SHADOW_DAYS).abs() < 1e-6);
        assert!((days_between(sd, p.post_shadow.unwrap()) - SHADOW_DAYS).abs() < 1e-6);
        assert!(p.peak_speed < 0.0);
    }

    #[test]
    fn test_window_opening_mid_loop() {
        let start = Epoch::from_gregorian_utc(2025, 1, 1, 0, 0, 0, 0);
        let end = Epoch::from_gregorian_utc(2025, 1, 20, 0, 0, 0, 0);
        let periods = retrograde_periods(&KeplerianModel, Body::Mars, start, end, 1.0).unwrap();
        assert_eq!(periods.len(), 1);
        assert!(periods[0].station_retrograde.is_none());
        assert!(periods[0].station_direct.is_none());
    }

    #[test]
    fn test_sun_never_retrograde() {
        let start = Epoch::from_gregorian_utc(2024, 1, 1, 0, 0, 0, 0);
        let end = Epoch::from_gregorian_utc(2025, 1, 1, 0, 0, 0, 0);
        assert!(retrograde_periods(&KeplerianModel, Body::Sun, start, end, 1.0).unwrap().is_empty());
    }

    #[test]
    fn test_synthetic_planets_still_loop() {
        let start = Epoch::from_gregorian_utc(2024, 1, 1, 0, 0, 0, 0);
        let end = Epoch::from_gregorian_utc(2026, 1, 1, 0, 0, 0, 0);
        let periods = retrograde_periods(&SyntheticModel, Body::Jupiter, start, end, 1.0).unwrap();
        assert!(!periods.is_empty());
    }

    #[test]
    fn test_invalid_step_rejected() {
        let t = Epoch::from_gregorian_utc(2024, 1, 1, 0, 0, 0, 0);
        let r = retrograde_periods(&KeplerianModel, Body::Mars, t, t + Duration::from_days(10.0), 0.0);
        assert!(matches!(r, Err(DataError::InvalidRequest(_))));
        let r = retrograde_periods(&KeplerianModel, Body::Mars, t, t, 1.0);
        assert!(r.is_err());
    }
}
