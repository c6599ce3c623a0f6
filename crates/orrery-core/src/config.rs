//! Session configuration: render settings, observer input, data-source settings
//!
//! Everything is plain serde data so a host can hand over a JSON document; the CLI
//! layers its flags on top of [`SessionConfig::load_json`].

use crate::observer::{
    ObserverContext, FALLBACK_ELEVATION_M, FALLBACK_LATITUDE, FALLBACK_LONGITUDE,
    FALLBACK_TIMEZONE,
};
use crate::projection::ProjectionMode;
use anyhow::{Context, Result};
use hifitime::Epoch;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Session-fatal configuration problems
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown catalog: {0}")]
    UnknownCatalog(String),
    #[error("Invalid projection: {0}")]
    InvalidProjection(String),
    #[error("Invalid coordinate system: {0}")]
    InvalidCoordinateSystem(String),
    #[error("Invalid precision: {0}")]
    InvalidPrecision(String),
    #[error("Invalid observer: {0}")]
    InvalidObserver(String),
    #[error("Invalid instant: {0}")]
    InvalidInstant(String),
    #[error("Invalid render config: {0}")]
    InvalidRenderConfig(String),
}

/// Star catalog selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CatalogId {
    /// Hipparcos-like all-sky catalog to the naked-eye limit and beyond
    #[default]
    Hipparcos,
    /// Yale Bright Star Catalogue (capped at magnitude 6.5)
    Yale,
    /// Gaia-like deep catalog
    Gaia,
    /// Messier deep-sky objects
    Messier,
}

impl CatalogId {
    pub const STAR_CATALOGS: [CatalogId; 3] = [Self::Hipparcos, Self::Yale, Self::Gaia];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hipparcos => "hipparcos",
            Self::Yale => "yale",
            Self::Gaia => "gaia",
            Self::Messier => "messier",
        }
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hipparcos" => Ok(Self::Hipparcos),
            "yale" => Ok(Self::Yale),
            "gaia" => Ok(Self::Gaia),
            "messier" => Ok(Self::Messier),
            other => Err(ConfigError::UnknownCatalog(other.to_string())),
        }
    }
}

impl TryFrom<String> for CatalogId {
    type Error = ConfigError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CatalogId> for String {
    fn from(id: CatalogId) -> Self {
        id.as_str().to_string()
    }
}

/// Frame the sky is drawn in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSystem {
    Equatorial,
    #[default]
    Horizontal,
    Ecliptic,
}

impl FromStr for CoordinateSystem {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equatorial" => Ok(Self::Equatorial),
            "horizontal" => Ok(Self::Horizontal),
            "ecliptic" => Ok(Self::Ecliptic),
            other => Err(ConfigError::InvalidCoordinateSystem(other.to_string())),
        }
    }
}

/// Requested ephemeris precision; part of every cache key
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Low,
    #[default]
    Medium,
    High,
    Ultra,
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Ultra => "ultra",
        }
    }
}

impl FromStr for Precision {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "ultra" => Ok(Self::Ultra),
            other => Err(ConfigError::InvalidPrecision(other.to_string())),
        }
    }
}

/// Render session settings handed over by the UI
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    pub catalog: CatalogId,
    pub max_stars: usize,
    /// Faintest magnitude drawn (larger = fainter)
    pub min_magnitude: f64,
    pub show_constellations: bool,
    pub show_planets: bool,
    pub show_deep_sky: bool,
    pub coordinate_system: CoordinateSystem,
    pub projection: ProjectionMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogId::Hipparcos,
            max_stars: 100_000,
            min_magnitude: 6.5,
            show_constellations: true,
            show_planets: true,
            show_deep_sky: false,
            coordinate_system: CoordinateSystem::Horizontal,
            projection: ProjectionMode::Stereographic,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog == CatalogId::Messier {
            return Err(ConfigError::InvalidRenderConfig(
                "messier is a deep-sky catalog; enable showDeepSky instead".into(),
            ));
        }
        if !self.min_magnitude.is_finite() || !(-2.0..=21.0).contains(&self.min_magnitude) {
            return Err(ConfigError::InvalidRenderConfig(format!(
                "minMagnitude {} outside [-2, 21]",
                self.min_magnitude
            )));
        }
        Ok(())
    }
}

/// Observer as supplied by a geolocation collaborator; any field may be missing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObserverSettings {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_meters: f64,
    pub timezone: String,
    /// ISO-8601 instant such as "2024-06-21T00:00:00 UTC"; `None` means now
    pub instant: Option<String>,
}

impl Default for ObserverSettings {
    fn default() -> Self {
        Self {
            latitude: FALLBACK_LATITUDE,
            longitude: FALLBACK_LONGITUDE,
            elevation_meters: FALLBACK_ELEVATION_M,
            timezone: FALLBACK_TIMEZONE.to_string(),
            instant: None,
        }
    }
}

impl ObserverSettings {
    /// Resolve the instant, using `now` when none was given
    pub fn resolve_instant(&self, now: Epoch) -> Result<Epoch, ConfigError> {
        match &self.instant {
            Some(text) => parse_instant(text),
            None => Ok(now),
        }
    }

    pub fn to_context(&self, now: Epoch) -> Result<ObserverContext, ConfigError> {
        let instant = self.resolve_instant(now)?;
        ObserverContext::new(
            self.latitude,
            self.longitude,
            self.elevation_meters,
            self.timezone.clone(),
            instant,
        )
    }
}

/// Parse an instant; a bare "YYYY-MM-DDTHH:MM:SS" or trailing "Z" is read as UTC
pub fn parse_instant(text: &str) -> Result<Epoch, ConfigError> {
    let trimmed = text.trim();
    let normalized = if let Some(stripped) = trimmed.strip_suffix('Z') {
        format!("{stripped} UTC")
    } else if trimmed.ends_with("UTC") || trimmed.ends_with("TAI") || trimmed.ends_with("TT") {
        trimmed.to_string()
    } else {
        format!("{trimmed} UTC")
    };
    Epoch::from_str(&normalized).map_err(|e| ConfigError::InvalidInstant(format!("{text}: {e}")))
}

/// Ephemeris backend settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EphemerisSettings {
    /// Base URL of an authoritative ephemeris service
    pub endpoint: Option<String>,
    /// Use the built-in Keplerian model when no service is configured
    pub local_model: bool,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub precision: Precision,
    /// Default orb for aspect detection (degrees)
    pub orb_tolerance: f64,
}

impl Default for EphemerisSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            local_model: true,
            timeout_secs: 30,
            cache_ttl_secs: 60,
            cache_capacity: 256,
            precision: Precision::Medium,
            orb_tolerance: 8.0,
        }
    }
}

/// Where star catalogs come from
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogSourceSettings {
    /// Directory containing `<catalog>.csv` / `<catalog>.json`
    pub directory: Option<PathBuf>,
    /// Remote catalog service base URL
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Complete session configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub render: RenderConfig,
    pub observer: ObserverSettings,
    pub ephemeris: EphemerisSettings,
    pub catalog_source: CatalogSourceSettings,
}

impl SessionConfig {
    /// Load from a JSON file
    pub fn load_json(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session config: {}", path.display()))?;

        let config: SessionConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session config JSON: {}", path.display()))?;

        config
            .render
            .validate()
            .with_context(|| format!("Invalid render settings in {}", path.display()))?;

        Ok(config)
    }
}
