//! Per-frame statistics exposed to the host UI

use serde::{Deserialize, Serialize};

/// Where a piece of data came from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Real catalog data or an authoritative ephemeris backend
    Authoritative,
    /// Deterministic synthetic stand-in
    #[default]
    Synthetic,
}

impl Provenance {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic)
    }
}

/// Provenance of the data currently on screen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub catalog: Provenance,
    pub ephemeris: Provenance,
}

impl DataQuality {
    /// True when any visible data is synthetic and the host should show a disclaimer
    pub fn is_degraded(&self) -> bool {
        self.catalog.is_synthetic() || self.ephemeris.is_synthetic()
    }
}

/// Frame statistics, recomputed every frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStats {
    pub total_stars: u32,
    pub visible_stars: u32,
    pub culled_stars: u32,
    pub render_time_ms: f64,
    /// Rolling frames per second, refreshed once per second
    pub fps: f64,
    pub data_quality: DataQuality,
}
