//! Horizontal coordinates to a 2D plane and on to viewport pixels

use crate::config::ConfigError;
use crate::constants::HORIZON_CUTOFF_DEG;
use crate::coordinates::{HorizontalCoordinate, ScreenCoordinate};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_4, TAU};
use std::fmt;
use std::str::FromStr;

/// Below this the projection denominators are treated as zero
const SINGULAR_EPS: f64 = 1e-12;

/// Sky projection mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    /// Conformal, zenith-centered; wide field with little distortion near the zenith
    #[default]
    Stereographic,
    /// Hemisphere as seen from far outside
    Orthographic,
    /// Full-azimuth strip
    Mercator,
}

/// Why an object could not be projected. Never escapes a single object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Degenerate {
    /// Denominator vanished (anti-zenith for stereographic, poles for mercator)
    Singular,
    /// Result was NaN or infinite
    NonFinite,
}

/// Drawing surface size in pixels
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width: width.max(1.0), height: height.max(1.0) }
    }

    fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }
}

impl ProjectionMode {
    pub const ALL: [ProjectionMode; 3] = [Self::Stereographic, Self::Orthographic, Self::Mercator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stereographic => "stereographic",
            Self::Orthographic => "orthographic",
            Self::Mercator => "mercator",
        }
    }

    /// Index shared with the shader's `projection_mode` uniform
    pub fn shader_index(&self) -> u32 {
        match self {
            Self::Stereographic => 0,
            Self::Orthographic => 1,
            Self::Mercator => 2,
        }
    }

    /// Plane coordinates (y up) of a horizontal position
    pub fn to_plane(&self, hor: &HorizontalCoordinate) -> Result<(f64, f64), Degenerate> {
        let az = hor.azimuth.to_radians();
        let alt = hor.altitude.to_radians();
        let (sin_az, cos_az) = az.sin_cos();
        let (sin_alt, cos_alt) = alt.sin_cos();

        let (x, y) = match self {
            Self::Stereographic => {
                let denom = 1.0 + sin_alt;
                if denom < SINGULAR_EPS {
                    return Err(Degenerate::Singular);
                }
                let k = 2.0 / denom;
                (k * cos_alt * sin_az, k * cos_alt * cos_az)
            }
            Self::Orthographic => (cos_alt * sin_az, cos_alt * cos_az),
            Self::Mercator => {
                let phi = FRAC_PI_4 + alt / 2.0;
                if phi.cos() < SINGULAR_EPS || phi.sin() < SINGULAR_EPS {
                    return Err(Degenerate::Singular);
                }
                (az / TAU, phi.tan().ln() / TAU)
            }
        };

        if x.is_finite() && y.is_finite() {
            Ok((x, y))
        } else {
            Err(Degenerate::NonFinite)
        }
    }

    /// Pixels per plane unit along x and y, and the pixel position of the plane origin
    fn plane_to_pixels(&self, viewport: &Viewport) -> ((f64, f64), (f64, f64)) {
        match self {
            Self::Stereographic => {
                let s = viewport.min_side() / 4.0;
                ((s, s), (viewport.width / 2.0, viewport.height / 2.0))
            }
            Self::Orthographic => {
                let s = viewport.min_side() / 2.2;
                ((s, s), (viewport.width / 2.0, viewport.height / 2.0))
            }
            Self::Mercator => ((viewport.width, viewport.height), (0.0, viewport.height / 2.0)),
        }
    }

    /// Pixel position, y growing downward. Degenerate projections come back hidden.
    pub fn to_screen(&self, hor: &HorizontalCoordinate, viewport: &Viewport) -> ScreenCoordinate {
        let (x, y) = match self.to_plane(hor) {
            Ok(p) => p,
            Err(reason) => {
                tracing::trace!(?reason, ?hor, projection = self.as_str(), "projection degenerate");
                return ScreenCoordinate::HIDDEN;
            }
        };
        let ((sx, sy), (ox, oy)) = self.plane_to_pixels(viewport);
        ScreenCoordinate {
            x: ox + x * sx,
            y: oy - y * sy,
            visible: hor.altitude > HORIZON_CUTOFF_DEG,
        }
    }

    /// Matrix taking plane (x, y, 0, 1) to clip space; agrees with [`to_screen`](Self::to_screen)
    pub fn plane_to_ndc(&self, viewport: &Viewport) -> Mat4 {
        let ((sx, sy), (ox, oy)) = self.plane_to_pixels(viewport);
        let (w, h) = (viewport.width, viewport.height);
        // ndc_x = 2 px / w - 1, ndc_y = 1 - 2 py / h
        let scale = Vec3::new((2.0 * sx / w) as f32, (2.0 * sy / h) as f32, 1.0);
        let offset = Vec3::new((2.0 * ox / w - 1.0) as f32, (1.0 - 2.0 * oy / h) as f32, 0.0);
        Mat4::from_translation(offset) * Mat4::from_scale(scale)
    }
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stereographic" => Ok(Self::Stereographic),
            "orthographic" => Ok(Self::Orthographic),
            "mercator" => Ok(Self::Mercator),
            other => Err(ConfigError::InvalidProjection(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    const VIEW: Viewport = Viewport { width: 800.0, height: 600.0 };

    #[test]
    fn test_zenith_maps_to_center() {
        let zenith = HorizontalCoordinate::new(0.0, 90.0);
        for mode in [ProjectionMode::Stereographic, ProjectionMode::Orthographic] {
            let s = mode.to_screen(&zenith, &VIEW);
            assert!(s.visible);
            assert!((s.x - 400.0).abs() < 1e-9 && (s.y - 300.0).abs() < 1e-9, "{mode}");
        }
    }

    #[test]
    fn test_north_is_up_east_is_right() {
        let north = ProjectionMode::Stereographic.to_screen(&HorizontalCoordinate::new(0.0, 0.0), &VIEW);
        let east = ProjectionMode::Stereographic.to_screen(&HorizontalCoordinate::new(90.0, 0.0), &VIEW);
        // Horizon at plane radius 2 -> 2 * 600/4 = 300 px from center
        assert!((north.y - 0.0).abs() < 1e-9);
        assert!((east.x - 700.0).abs() < 1e-9);
    }

    #[test]
    fn test_stereographic_anti_zenith_is_hidden() {
        let nadir = HorizontalCoordinate::new(0.0, -90.0);
        assert_eq!(ProjectionMode::Stereographic.to_plane(&nadir), Err(Degenerate::Singular));
        let s = ProjectionMode::Stereographic.to_screen(&nadir, &VIEW);
        assert!(!s.visible);
        assert!(s.x.is_finite() && s.y.is_finite());
    }

    #[test]
    fn test_mercator_poles_are_hidden() {
        for alt in [90.0, -90.0] {
            let s = ProjectionMode::Mercator.to_screen(&HorizontalCoordinate::new(10.0, alt), &VIEW);
            assert!(!s.visible, "alt {alt}");
            assert!(s.x.is_finite() && s.y.is_finite());
        }
    }

    #[test]
    fn test_below_cutoff_not_visible() {
        let low = HorizontalCoordinate::new(120.0, -0.6);
        for mode in ProjectionMode::ALL {
            assert!(!mode.to_screen(&low, &VIEW).visible, "{mode}");
        }
        let grazing = HorizontalCoordinate::new(120.0, -0.4);
        for mode in ProjectionMode::ALL {
            assert!(mode.to_screen(&grazing, &VIEW).visible, "{mode}");
        }
    }

    #[test]
    fn test_ndc_matrix_agrees_with_screen_mapping() {
        let hor = HorizontalCoordinate::new(123.0, 34.0);
        for mode in ProjectionMode::ALL {
            let (x, y) = mode.to_plane(&hor).unwrap();
            let s = mode.to_screen(&hor, &VIEW);
            let ndc = mode.plane_to_ndc(&VIEW) * Vec4::new(x as f32, y as f32, 0.0, 1.0);
            let px = (ndc.x as f64 + 1.0) / 2.0 * VIEW.width;
            let py = (1.0 - ndc.y as f64) / 2.0 * VIEW.height;
            assert!((px - s.x).abs() < 1e-3, "{mode}: {px} vs {}", s.x);
            assert!((py - s.y).abs() < 1e-3, "{mode}: {py} vs {}", s.y);
        }
    }

    #[test]
    fn test_parse_projection() {
        assert_eq!("Mercator".parse::<ProjectionMode>().unwrap(), ProjectionMode::Mercator);
        assert!(matches!(
            "fisheye".parse::<ProjectionMode>(),
            Err(ConfigError::InvalidProjection(_))
        ));
    }
}
