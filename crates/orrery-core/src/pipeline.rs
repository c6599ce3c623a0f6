//! The four-stage transform pipeline: precession, equatorial→horizontal, refraction,
//! projection.
//!
//! [`TransformPipeline`] exposes every stage on its own so each can be tested and
//! reused. [`PreparedFrame`] folds the observer-dependent stages into one rotation
//! matrix for the per-star batch path, and hands the same matrix to the GPU.

use crate::config::CoordinateSystem;
use crate::constants::J2000_JD;
use crate::coordinates::{EquatorialCoordinate, HorizontalCoordinate, ScreenCoordinate};
use crate::observer::ObserverContext;
use crate::projection::{ProjectionMode, Viewport};
use crate::transform::{
    ecliptic_rotation, equatorial_to_horizontal, horizontal_rotation, mean_obliquity, precess,
    refract, PrecessionAngles,
};
use glam::{DMat3, DVec3};

/// Output of the full pipeline for one object
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation {
    /// Apparent (refracted when enabled) horizontal position
    pub horizontal: HorizontalCoordinate,
    pub screen: ScreenCoordinate,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformPipeline {
    pub projection: ProjectionMode,
    pub viewport: Viewport,
    pub apply_precession: bool,
    pub apply_refraction: bool,
}

impl TransformPipeline {
    pub fn new(projection: ProjectionMode, viewport: Viewport) -> Self {
        Self { projection, viewport, apply_precession: true, apply_refraction: true }
    }

    pub fn with_precession(mut self, enabled: bool) -> Self {
        self.apply_precession = enabled;
        self
    }

    pub fn with_refraction(mut self, enabled: bool) -> Self {
        self.apply_refraction = enabled;
        self
    }

    /// Stage 1: precess to the equinox of date
    pub fn precess(&self, coord: &EquatorialCoordinate, jd: f64) -> EquatorialCoordinate {
        if self.apply_precession { precess(coord, jd) } else { *coord }
    }

    /// Stages 1 and 2: precess and convert to the observer's horizon
    pub fn to_horizontal(
        &self,
        coord: &EquatorialCoordinate,
        observer: &ObserverContext,
    ) -> HorizontalCoordinate {
        let jd = observer.julian_day();
        let of_date = self.precess(coord, jd);
        equatorial_to_horizontal(&of_date, observer.latitude, observer.local_sidereal_degrees())
    }

    /// Stage 3: atmospheric refraction
    pub fn refract(&self, hor: &HorizontalCoordinate) -> HorizontalCoordinate {
        if self.apply_refraction { refract(hor) } else { *hor }
    }

    /// Stage 4: projection to viewport pixels
    pub fn project_horizontal(&self, hor: &HorizontalCoordinate) -> ScreenCoordinate {
        self.projection.to_screen(hor, &self.viewport)
    }

    /// Run all stages, keeping the intermediate horizontal position
    pub fn observe(&self, coord: &EquatorialCoordinate, observer: &ObserverContext) -> Observation {
        let horizontal = self.refract(&self.to_horizontal(coord, observer));
        Observation { horizontal, screen: self.project_horizontal(&horizontal) }
    }

    /// Equatorial coordinate to screen position for an observer
    pub fn project(&self, coord: &EquatorialCoordinate, observer: &ObserverContext) -> ScreenCoordinate {
        self.observe(coord, observer).screen
    }

    /// Precompute the observer- and time-dependent rotation for a display frame
    pub fn prepare(&self, observer: &ObserverContext, system: CoordinateSystem) -> PreparedFrame {
        let jd = observer.julian_day();
        let precession = if self.apply_precession {
            PrecessionAngles::between(J2000_JD, jd).matrix()
        } else {
            DMat3::IDENTITY
        };

        // Non-horizontal frames are drawn pole-centered with 0h / 0° at the top
        let pole_view = horizontal_rotation(90.0, 180.0);
        let of_date = match system {
            CoordinateSystem::Horizontal => {
                horizontal_rotation(observer.latitude, observer.local_sidereal_degrees())
            }
            CoordinateSystem::Equatorial => pole_view,
            CoordinateSystem::Ecliptic => pole_view * ecliptic_rotation(mean_obliquity(jd)),
        };

        PreparedFrame {
            projection: self.projection,
            viewport: self.viewport,
            system,
            refraction: self.apply_refraction && system == CoordinateSystem::Horizontal,
            precession_enabled: self.apply_precession,
            jd,
            of_date,
            rotation: of_date * precession,
        }
    }
}

/// Pipeline state frozen for one observer, instant and display frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreparedFrame {
    projection: ProjectionMode,
    viewport: Viewport,
    system: CoordinateSystem,
    refraction: bool,
    precession_enabled: bool,
    jd: f64,
    /// Equator-of-date to display frame
    of_date: DMat3,
    /// J2000 to display frame
    rotation: DMat3,
}

impl PreparedFrame {
    /// J2000 unit vector to display-frame (north, east, up) rotation
    pub fn rotation(&self) -> DMat3 {
        self.rotation
    }

    pub fn projection(&self) -> ProjectionMode {
        self.projection
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn system(&self) -> CoordinateSystem {
        self.system
    }

    /// Same frame drawn into a different viewport
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn refraction(&self) -> bool {
        self.refraction
    }

    pub fn julian_day(&self) -> f64 {
        self.jd
    }

    /// Display-frame position of a coordinate, before refraction
    pub fn local(&self, coord: &EquatorialCoordinate) -> HorizontalCoordinate {
        let v = if (coord.epoch - 2000.0).abs() < 1e-9 || !self.precession_enabled {
            self.rotation * coord.to_unit_vector()
        } else {
            self.of_date * precess(coord, self.jd).to_unit_vector()
        };
        HorizontalCoordinate::from_local_vector(v)
    }

    /// Apparent position of a J2000 unit vector, as uploaded to the GPU
    pub fn observe_unit(&self, v: DVec3) -> Observation {
        self.finish(HorizontalCoordinate::from_local_vector(self.rotation * v))
    }

    /// Apparent display-frame position and screen coordinate
    pub fn observe(&self, coord: &EquatorialCoordinate) -> Observation {
        self.finish(self.local(coord))
    }

    fn finish(&self, local: HorizontalCoordinate) -> Observation {
        let horizontal = if self.refraction { refract(&local) } else { local };
        Observation { horizontal, screen: self.projection.to_screen(&horizontal, &self.viewport) }
    }

    pub fn project(&self, coord: &EquatorialCoordinate) -> ScreenCoordinate {
        self.observe(coord).screen
    }
}
