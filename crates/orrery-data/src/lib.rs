//! Star catalogs, synthetic sky generation and the cached ephemeris provider.

pub mod asterisms;
pub mod bright;
pub mod catalog;
pub mod deep_sky;
pub mod ephemeris;
pub mod error;
pub mod stars;
pub mod synthetic;

pub use asterisms::{asterism_segments, Asterism, ASTERISMS};
pub use bright::bright_stars;
pub use catalog::{
    CatalogFilters, CatalogFormat, CatalogPayload, CatalogSource, CatalogStore,
    HttpCatalogSource, LoadedCatalog, LocalCatalogSource,
};
pub use deep_sky::{messier_objects, DeepSkyKind};
pub use ephemeris::{EphemerisProvider, EphemerisSource, PlanetaryPosition, Sourced};
pub use error::{DataError, DataResult};
pub use stars::{catalog_order, ProperMotion, StarRecord};
pub use synthetic::{generate_synthetic_stars, SYNTHETIC_BRIGHT_LIMIT};
