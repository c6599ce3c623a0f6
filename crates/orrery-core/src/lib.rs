//! Coordinate types, time scales and the equatorial-to-screen transform pipeline.
//!
//! Every stage is a pure function over small `Copy` value types so the catalog,
//! ephemeris and renderer crates can share one set of conventions:
//! angles in degrees at the API surface, radians inside the math, Julian Days
//! for time arithmetic and `hifitime::Epoch` for instants.

pub mod config;
pub mod constants;
pub mod coordinates;
pub mod observer;
pub mod pipeline;
pub mod projection;
pub mod stats;
pub mod time;
pub mod transform;

#[cfg(test)]
mod tests;

pub use config::{
    parse_instant, CatalogId, CatalogSourceSettings, ConfigError, CoordinateSystem,
    EphemerisSettings, ObserverSettings, Precision, RenderConfig, SessionConfig,
};
pub use coordinates::{
    EclipticCoordinate, EquatorialCoordinate, GalacticCoordinate, HorizontalCoordinate,
    ScreenCoordinate,
};
pub use observer::ObserverContext;
pub use pipeline::{Observation, PreparedFrame, TransformPipeline};
pub use projection::{Degenerate, ProjectionMode, Viewport};
pub use stats::{DataQuality, FrameStats, Provenance};
