//! Catalog store: resolves a catalog id to sorted, filtered star records
//!
//! Real data comes from a pluggable [`CatalogSource`]. Whenever the source is
//! missing or fails, the store synthesizes a deterministic sky instead and
//! reports [`Provenance::Synthetic`]; load failures are never surfaced.

use crate::bright::bright_stars;
use crate::deep_sky::messier_objects;
use crate::error::{DataError, DataResult};
use crate::stars::{catalog_order, decode_csv, decode_json, StarRecord};
use crate::synthetic::{catalog_seed, generate_synthetic_stars, synthetic_star_count};
use async_trait::async_trait;
use orrery_core::{CatalogId, CatalogSourceSettings, ConfigError, Provenance, RenderConfig};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Faintest magnitude of the Yale Bright Star Catalogue
pub const YALE_MAGNITUDE_LIMIT: f64 = 6.5;

const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(30);

/// Selection applied to every catalog load
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogFilters {
    /// Faintest magnitude kept (inclusive)
    pub max_magnitude: f64,
    pub min_declination: f64,
    pub max_declination: f64,
    /// Constellation abbreviations to keep; `None` keeps all
    pub constellations: Option<Vec<String>>,
    pub limit: Option<usize>,
}

impl Default for CatalogFilters {
    fn default() -> Self {
        Self {
            max_magnitude: 6.5,
            min_declination: -90.0,
            max_declination: 90.0,
            constellations: None,
            limit: None,
        }
    }
}

impl CatalogFilters {
    pub fn from_render_config(config: &RenderConfig) -> Self {
        Self {
            max_magnitude: config.min_magnitude,
            limit: Some(config.max_stars),
            ..Default::default()
        }
    }

    pub fn with_max_magnitude(mut self, max_magnitude: f64) -> Self {
        self.max_magnitude = max_magnitude;
        self
    }

    pub fn with_declination(mut self, min: f64, max: f64) -> Self {
        self.min_declination = min;
        self.max_declination = max;
        self
    }

    pub fn with_constellations<I, S>(mut self, constellations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constellations = Some(constellations.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn capped_for(&self, catalog: CatalogId) -> Self {
        let mut filters = self.clone();
        if catalog == CatalogId::Yale {
            filters.max_magnitude = filters.max_magnitude.min(YALE_MAGNITUDE_LIMIT);
        }
        filters
    }

    /// True when a declination band or constellation list drops part of the sky
    fn narrows_sky(&self) -> bool {
        self.min_declination > -90.0 || self.max_declination < 90.0 || self.constellations.is_some()
    }

    fn admits_magnitude(&self, star: &StarRecord) -> bool {
        star.magnitude <= self.max_magnitude
    }

    /// Magnitude, declination and constellation checks
    pub fn admits(&self, star: &StarRecord) -> bool {
        let dec = star.position.dec;
        self.admits_magnitude(star)
            && dec >= self.min_declination
            && dec <= self.max_declination
            && self.constellations.as_ref().map_or(true, |allowed| {
                allowed.iter().any(|c| c.eq_ignore_ascii_case(&star.constellation))
            })
    }
}

/// Encoding of raw catalog bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogFormat {
    Csv,
    Json,
}

/// What a source hands back
#[derive(Clone, Debug)]
pub enum CatalogPayload {
    Bytes { data: Vec<u8>, format: CatalogFormat },
    Records(Vec<StarRecord>),
}

impl CatalogPayload {
    pub fn decode(self) -> DataResult<Vec<StarRecord>> {
        match self {
            Self::Bytes { data, format: CatalogFormat::Csv } => decode_csv(&data),
            Self::Bytes { data, format: CatalogFormat::Json } => decode_json(&data),
            Self::Records(records) => Ok(records),
        }
    }
}

/// Provider of real catalog data
#[async_trait]
pub trait CatalogSource: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    async fn fetch_catalog(
        &self,
        catalog: CatalogId,
        filters: &CatalogFilters,
    ) -> DataResult<CatalogPayload>;
}

/// Reads `<catalog>.csv` or `<catalog>.json` from a directory
#[derive(Debug, Clone)]
pub struct LocalCatalogSource {
    directory: PathBuf,
}

impl LocalCatalogSource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }
}

#[async_trait]
impl CatalogSource for LocalCatalogSource {
    fn name(&self) -> &str {
        "local"
    }

    async fn fetch_catalog(
        &self,
        catalog: CatalogId,
        _filters: &CatalogFilters,
    ) -> DataResult<CatalogPayload> {
        for (ext, format) in [("csv", CatalogFormat::Csv), ("json", CatalogFormat::Json)] {
            let path = self.directory.join(format!("{}.{ext}", catalog.as_str()));
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                debug!("Reading catalog file {}", path.display());
                let data = tokio::fs::read(&path).await?;
                return Ok(CatalogPayload::Bytes { data, format });
            }
        }
        Err(DataError::Unavailable(format!(
            "no {} catalog file in {}",
            catalog,
            self.directory.display()
        )))
    }
}

/// Fetches `GET {base}/catalogs/{id}?maxMagnitude=..` from a catalog service
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_catalog(
        &self,
        catalog: CatalogId,
        filters: &CatalogFilters,
    ) -> DataResult<CatalogPayload> {
        let url = format!(
            "{}/catalogs/{}?maxMagnitude={}",
            self.base_url.trim_end_matches('/'),
            catalog,
            filters.max_magnitude
        );
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(DataError::Network(format!("{url} returned {}", response.status())));
        }

        let format = match response.headers().get(reqwest::header::CONTENT_TYPE) {
            Some(ct) if ct.to_str().unwrap_or_default().contains("csv") => CatalogFormat::Csv,
            _ => CatalogFormat::Json,
        };
        let data = response.bytes().await?.to_vec();
        Ok(CatalogPayload::Bytes { data, format })
    }
}

/// Result of a catalog load
#[derive(Clone, Debug, Default)]
pub struct LoadedCatalog {
    pub stars: Vec<StarRecord>,
    pub provenance: Provenance,
}

/// Resolves catalog ids to star lists
#[derive(Debug, Clone)]
pub struct CatalogStore {
    source: Option<Arc<dyn CatalogSource>>,
    timeout: Duration,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    /// Store without a data source; every star catalog is synthesized
    pub fn new() -> Self {
        Self { source: None, timeout: DEFAULT_SOURCE_TIMEOUT }
    }

    pub fn with_source(source: Arc<dyn CatalogSource>) -> Self {
        Self { source: Some(source), timeout: DEFAULT_SOURCE_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build from session settings; a local directory wins over a URL
    pub fn from_settings(settings: &CatalogSourceSettings) -> Self {
        let store = match (&settings.directory, &settings.url) {
            (Some(dir), _) => Self::with_source(Arc::new(LocalCatalogSource::new(dir.clone()))),
            (None, Some(url)) => Self::with_source(Arc::new(HttpCatalogSource::new(url.clone()))),
            (None, None) => Self::new(),
        };
        match settings.timeout_secs {
            Some(secs) => store.with_timeout(Duration::from_secs(secs)),
            None => store,
        }
    }

    /// Load a catalog by name. Unknown ids are the only error.
    pub async fn load(&self, catalog: &str, filters: &CatalogFilters) -> Result<LoadedCatalog, ConfigError> {
        let id: CatalogId = catalog.parse()?;
        Ok(self.load_catalog(id, filters).await)
    }

    pub async fn load_catalog(&self, catalog: CatalogId, filters: &CatalogFilters) -> LoadedCatalog {
        let filters = filters.capped_for(catalog);

        if catalog == CatalogId::Messier {
            let stars = finish(messier_objects(filters.max_magnitude), &filters, Vec::new());
            return LoadedCatalog { stars, provenance: Provenance::Authoritative };
        }

        match self.fetch_real(catalog, &filters).await {
            Ok(records) => {
                let stars = finish(records, &filters, bright_stars(filters.max_magnitude));
                info!("Loaded {} stars from {} catalog", stars.len(), catalog);
                LoadedCatalog { stars, provenance: Provenance::Authoritative }
            }
            Err(e) => {
                if self.source.is_some() {
                    warn!("Catalog {} unavailable, synthesizing: {}", catalog, e);
                }
                let stars = synthesize(catalog, &filters);
                info!("Synthesized {} stars for {} catalog", stars.len(), catalog);
                LoadedCatalog { stars, provenance: Provenance::Synthetic }
            }
        }
    }

    async fn fetch_real(
        &self,
        catalog: CatalogId,
        filters: &CatalogFilters,
    ) -> DataResult<Vec<StarRecord>> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| DataError::Unavailable("no catalog source configured".into()))?;

        let payload = tokio::time::timeout(self.timeout, source.fetch_catalog(catalog, filters))
            .await
            .map_err(|_| DataError::Timeout(format!("{} source after {:?}", source.name(), self.timeout)))??;
        payload.decode()
    }
}

/// Synthetic sky for a catalog, with the real bright stars merged in
pub fn synthesize(catalog: CatalogId, filters: &CatalogFilters) -> Vec<StarRecord> {
    let filters = filters.capped_for(catalog);
    // Sky filters discard candidates, so the limit then applies only after filtering
    let bound = if filters.narrows_sky() { None } else { filters.limit };
    let count = synthetic_star_count(filters.max_magnitude, bound);
    let generated = generate_synthetic_stars(catalog_seed(catalog), filters.max_magnitude, count);
    finish(generated, &filters, bright_stars(filters.max_magnitude))
}

/// Filter, merge bright stars (magnitude cutoff only), sort, then apply the limit
fn finish(records: Vec<StarRecord>, filters: &CatalogFilters, bright: Vec<StarRecord>) -> Vec<StarRecord> {
    let mut stars: Vec<StarRecord> = records.into_iter().filter(|s| filters.admits(s)).collect();

    let present: HashSet<String> = stars.iter().map(|s| s.id.clone()).collect();
    stars.extend(
        bright
            .into_iter()
            .filter(|s| filters.admits_magnitude(s) && !present.contains(&s.id)),
    );

    stars.sort_by(catalog_order);
    if let Some(limit) = filters.limit {
        stars.truncate(limit);
    }
    stars
}
