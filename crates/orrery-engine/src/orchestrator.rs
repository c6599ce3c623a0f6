//! Per-frame loop: clock, data fetches, reprojection for picking, draw, stats
//!
//! The render thread never awaits. Catalog and ephemeris fetches run on an owned
//! tokio runtime and report back over a channel; each request carries a generation
//! number and any result older than the latest request of its kind is dropped.

use crate::fps::FpsCounter;
use crate::picking::{pick_nearest, project_stars, PICK_RADIUS_PX};
use crate::target::SkyTarget;
use crate::view::{asterism_lines, planet_sprites, SkyView};

use hifitime::{Duration, Epoch};
use orrery_core::{
    ConfigError, DataQuality, FrameStats, ObserverContext, Precision, RenderConfig,
    ScreenCoordinate, SessionConfig, Viewport,
};
use orrery_data::{
    catalog_order, messier_objects, CatalogFilters, CatalogStore, DataResult, EphemerisProvider,
    LoadedCatalog, PlanetaryPosition, Sourced, StarRecord,
};
use orrery_render::RenderResult;
use orrery_sim::{time_bucket, Body, TimeController};

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Sim-time width of the coarse bucket that triggers ephemeris refreshes and reprojection
pub const DEFAULT_BUCKET_SECONDS: f64 = 60.0;

enum Fetched {
    Catalog { generation: u64, catalog: LoadedCatalog, deep_sky: Vec<StarRecord> },
    Planets { generation: u64, result: DataResult<Sourced<Vec<PlanetaryPosition>>> },
}

pub struct Orchestrator {
    runtime: tokio::runtime::Runtime,
    catalogs: Arc<CatalogStore>,
    ephemeris: Arc<EphemerisProvider>,
    precision: Precision,
    tx: mpsc::UnboundedSender<Fetched>,
    rx: mpsc::UnboundedReceiver<Fetched>,

    // Inputs
    config: RenderConfig,
    view: SkyView,
    observer: ObserverContext,
    clock: TimeController,
    bucket_width: Duration,

    // Fetch bookkeeping
    catalog_generation: u64,
    catalog_applied: u64,
    planet_generation: u64,
    planet_applied: u64,
    last_bucket: Option<i64>,

    // Derived data
    stars: Vec<StarRecord>,
    planets: Vec<PlanetaryPosition>,
    screen: Vec<ScreenCoordinate>,
    stars_dirty: bool,
    overlays_dirty: bool,
    projection_dirty: bool,

    // Output
    quality: DataQuality,
    fps: FpsCounter,
    stats: FrameStats,
    started: Instant,
    last_frame: Option<Instant>,
}

impl Orchestrator {
    /// Session starting at `start`. Invalid render or observer settings are fatal.
    pub fn new(session: &SessionConfig, viewport: Viewport, start: Epoch) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("orrery-fetch")
            .enable_all()
            .build()?;

        let catalogs = Arc::new(CatalogStore::from_settings(&session.catalog_source));
        let ephemeris = Arc::new(EphemerisProvider::from_settings(&session.ephemeris));
        Self::with_sources(session, viewport, start, runtime, catalogs, ephemeris)
    }

    pub fn with_sources(
        session: &SessionConfig,
        viewport: Viewport,
        start: Epoch,
        runtime: tokio::runtime::Runtime,
        catalogs: Arc<CatalogStore>,
        ephemeris: Arc<EphemerisProvider>,
    ) -> anyhow::Result<Self> {
        let view = SkyView::from_config(&session.render, viewport)?;
        let observer = session.observer.to_context(start)?;
        let (tx, rx) = mpsc::unbounded_channel();

        info!(
            "Session: {} catalog, {} / {:?}, observer {:.4}, {:.4}",
            session.render.catalog,
            session.render.projection,
            session.render.coordinate_system,
            observer.latitude,
            observer.longitude
        );

        Ok(Self {
            runtime,
            catalogs,
            ephemeris,
            precision: session.ephemeris.precision,
            tx,
            rx,
            config: session.render.clone(),
            view,
            clock: TimeController::new(observer.instant),
            observer,
            bucket_width: Duration::from_seconds(DEFAULT_BUCKET_SECONDS),
            catalog_generation: 0,
            catalog_applied: 0,
            planet_generation: 0,
            planet_applied: 0,
            last_bucket: None,
            stars: Vec::new(),
            planets: Vec::new(),
            screen: Vec::new(),
            stars_dirty: true,
            overlays_dirty: true,
            projection_dirty: true,
            quality: DataQuality::default(),
            fps: FpsCounter::new(),
            stats: FrameStats::default(),
            started: Instant::now(),
            last_frame: None,
        })
    }

    pub fn with_bucket_seconds(mut self, seconds: f64) -> Self {
        if seconds.is_finite() && seconds > 0.0 {
            self.bucket_width = Duration::from_seconds(seconds);
        }
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn clock(&self) -> &TimeController {
        &self.clock
    }

    /// Rate, pause and jumps for time-lapse playback
    pub fn clock_mut(&mut self) -> &mut TimeController {
        &mut self.clock
    }

    pub fn stars(&self) -> &[StarRecord] {
        &self.stars
    }

    pub fn planets(&self) -> &[PlanetaryPosition] {
        &self.planets
    }

    /// True while a catalog or ephemeris request is outstanding
    pub fn is_loading(&self) -> bool {
        self.catalog_applied != self.catalog_generation || self.planet_applied != self.planet_generation
    }

    /// Swap render settings. Catalog-affecting changes trigger a reload; any
    /// change invalidates the uploaded buffers.
    pub fn set_config(&mut self, config: RenderConfig) -> Result<(), ConfigError> {
        let view = SkyView::from_config(&config, self.view.pipeline.viewport)?;
        let reload = config.catalog != self.config.catalog
            || config.min_magnitude != self.config.min_magnitude
            || config.max_stars != self.config.max_stars
            || config.show_deep_sky != self.config.show_deep_sky;

        if config.show_planets != self.config.show_planets {
            self.last_bucket = None;
        }
        self.config = config;
        self.view = view;

        if reload {
            self.stars.clear();
            self.screen.clear();
            self.stars_dirty = true;
            self.catalog_generation += 1;
            self.request_catalog_at(self.catalog_generation);
        }
        self.overlays_dirty = true;
        self.projection_dirty = true;
        Ok(())
    }

    /// New observer location; the instant keeps following the clock
    pub fn set_observer(&mut self, observer: ObserverContext) {
        self.clock.set_time(observer.instant);
        self.observer = observer;
        self.last_bucket = None;
        self.projection_dirty = true;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.view = self.view.with_viewport(viewport);
        self.projection_dirty = true;
    }

    /// Advance one frame and draw it
    pub fn frame(&mut self, now: Instant, target: &mut dyn SkyTarget) -> RenderResult<FrameStats> {
        let dt = self.last_frame.map_or(0.0, |last| now.saturating_duration_since(last).as_secs_f64());
        self.last_frame = Some(now);
        let instant = self.clock.tick(dt);

        self.drain_fetches();

        if self.catalog_generation == 0 {
            self.catalog_generation = 1;
            self.request_catalog_at(1);
        }

        let bucket = time_bucket(instant, self.bucket_width);
        if self.last_bucket != Some(bucket) {
            self.last_bucket = Some(bucket);
            self.projection_dirty = true;
            if self.config.show_planets {
                self.request_planets(instant);
            } else if !self.planets.is_empty() {
                self.planets.clear();
                self.overlays_dirty = true;
            }
        }

        let observer = self.observer.at(instant);
        let frame = self.view.prepare(&observer);

        if self.stars_dirty {
            target.upload_stars(&self.stars)?;
            self.stars_dirty = false;
            self.overlays_dirty = true;
        }
        if self.overlays_dirty {
            let planets = if self.config.show_planets { planet_sprites(&self.planets) } else { Vec::new() };
            let lines = if self.config.show_constellations { asterism_lines(&self.stars) } else { Vec::new() };
            target.upload_planets(&planets)?;
            target.upload_lines(&lines)?;
            self.overlays_dirty = false;
        }
        if self.projection_dirty {
            self.screen = project_stars(&self.stars, &frame);
            self.projection_dirty = false;
            debug!("Reprojected {} objects for picking", self.screen.len());
        }

        let time = now.saturating_duration_since(self.started).as_secs_f32();
        let mut stats = target.draw(time, &frame)?;
        stats.fps = self.fps.tick(now);
        stats.data_quality = self.quality;
        self.stats = stats;
        Ok(stats)
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Nearest visible star within the pick radius of a pixel, brightest on ties
    pub fn pick(&self, x: f64, y: f64) -> Option<StarRecord> {
        pick_nearest(&self.stars, &self.screen, x, y, PICK_RADIUS_PX).map(|i| self.stars[i].clone())
    }

    /// Block until outstanding fetches land or `timeout` passes. For hosts that
    /// need a complete first frame (headless rendering, tests).
    pub fn settle(&mut self, timeout: std::time::Duration) -> bool {
        if self.catalog_generation == 0 {
            self.catalog_generation = 1;
            self.request_catalog_at(1);
        }
        if self.last_bucket.is_none() && self.config.show_planets {
            let instant = self.clock.current();
            self.last_bucket = Some(time_bucket(instant, self.bucket_width));
            self.request_planets(instant);
        }
        let deadline = Instant::now() + timeout;
        while self.is_loading() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let rx = &mut self.rx;
            // The timer must be created inside the runtime that drives it
            let received = self
                .runtime
                .block_on(async { tokio::time::timeout(remaining, rx.recv()).await });
            match received {
                Ok(Some(fetched)) => self.apply(fetched),
                Ok(None) | Err(_) => return false,
            }
        }
        true
    }

    fn drain_fetches(&mut self) {
        while let Ok(fetched) = self.rx.try_recv() {
            self.apply(fetched);
        }
    }

    fn apply(&mut self, fetched: Fetched) {
        match fetched {
            Fetched::Catalog { generation, catalog, deep_sky } => {
                if generation != self.catalog_generation {
                    debug!("Discarding stale catalog result (generation {})", generation);
                    return;
                }
                self.catalog_applied = generation;
                self.quality.catalog = catalog.provenance;
                self.stars = catalog.stars;
                if !deep_sky.is_empty() {
                    self.stars.extend(deep_sky);
                    self.stars.sort_by(catalog_order);
                    self.stars.truncate(self.config.max_stars);
                }
                self.stars_dirty = true;
                self.projection_dirty = true;
                info!("Catalog ready: {} objects ({:?})", self.stars.len(), catalog.provenance);
            }
            Fetched::Planets { generation, result } => {
                if generation != self.planet_generation {
                    debug!("Discarding stale ephemeris result (generation {})", generation);
                    return;
                }
                self.planet_applied = generation;
                match result {
                    Ok(sourced) => {
                        self.quality.ephemeris = sourced.provenance;
                        self.planets = sourced.data;
                        self.overlays_dirty = true;
                    }
                    Err(e) => warn!("Planet positions unavailable: {}", e),
                }
            }
        }
    }

    fn request_catalog_at(&mut self, generation: u64) {
        let store = self.catalogs.clone();
        let catalog = self.config.catalog;
        let filters = CatalogFilters::from_render_config(&self.config);
        let deep_sky_limit = self.config.show_deep_sky.then_some(self.config.min_magnitude);
        let tx = self.tx.clone();

        debug!("Requesting {} catalog (generation {})", catalog, generation);
        self.runtime.spawn(async move {
            let loaded = store.load_catalog(catalog, &filters).await;
            let deep_sky = deep_sky_limit.map(messier_objects).unwrap_or_default();
            // Receiver gone means the orchestrator was dropped
            let _ = tx.send(Fetched::Catalog { generation, catalog: loaded, deep_sky });
        });
    }

    fn request_planets(&mut self, instant: Epoch) {
        self.planet_generation += 1;
        let generation = self.planet_generation;
        let provider = self.ephemeris.clone();
        let observer = self.observer.at(instant);
        let precision = self.precision;
        let tx = self.tx.clone();

        self.runtime.spawn(async move {
            let result = provider.positions(Body::observable(), instant, Some(&observer), precision).await;
            let _ = tx.send(Fetched::Planets { generation, result });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_core::{CatalogId, PreparedFrame, Provenance};
    use orrery_render::{LineVertex, PlanetInstance};

    #[derive(Default)]
    struct Recorder {
        star_uploads: usize,
        stars: usize,
        planets: usize,
        lines: usize,
        draws: usize,
    }

    impl SkyTarget for Recorder {
        fn upload_stars(&mut self, stars: &[StarRecord]) -> RenderResult<()> {
            self.star_uploads += 1;
            self.stars = stars.len();
            Ok(())
        }

        fn upload_planets(&mut self, planets: &[PlanetInstance]) -> RenderResult<()> {
            self.planets = planets.len();
            Ok(())
        }

        fn upload_lines(&mut self, lines: &[LineVertex]) -> RenderResult<()> {
            self.lines = lines.len();
            Ok(())
        }

        fn draw(&mut self, _time: f32, _frame: &PreparedFrame) -> RenderResult<FrameStats> {
            self.draws += 1;
            Ok(FrameStats { total_stars: self.stars as u32, visible_stars: self.stars as u32, ..Default::default() })
        }
    }

    fn session(max_stars: usize) -> SessionConfig {
        let mut session = SessionConfig::default();
        session.render.max_stars = max_stars;
        session.render.min_magnitude = 4.0;
        session
    }

    fn start() -> Epoch {
        Epoch::from_gregorian_utc(2024, 6, 21, 0, 0, 0, 0)
    }

    fn orchestrator(max_stars: usize) -> Orchestrator {
        Orchestrator::new(&session(max_stars), Viewport::new(800.0, 600.0), start()).unwrap()
    }

    #[test]
    fn test_first_frames_load_and_upload_once() {
        let mut orch = orchestrator(500);
        let mut target = Recorder::default();
        let t0 = Instant::now();

        orch.frame(t0, &mut target).unwrap();
        assert!(orch.settle(std::time::Duration::from_secs(10)));
        let stats = orch.frame(t0 + std::time::Duration::from_millis(16), &mut target).unwrap();
        orch.frame(t0 + std::time::Duration::from_millis(32), &mut target).unwrap();

        assert!(target.stars > 0 && target.stars <= 500);
        assert_eq!(stats.total_stars as usize, target.stars);
        assert_eq!(target.star_uploads, 2, "empty upload, then the catalog once");
        assert_eq!(target.planets, Body::observable().len());
        assert!(target.lines > 0, "summer triangle drawn from the merged bright stars");
        assert_eq!(stats.data_quality.catalog, Provenance::Synthetic);
        assert_eq!(stats.data_quality.ephemeris, Provenance::Authoritative);
        assert!(orch.stars().iter().all(|s| s.magnitude <= 4.0));
    }

    #[test]
    fn test_stale_catalog_discarded() {
        let mut orch = orchestrator(200);
        let mut target = Recorder::default();
        orch.frame(Instant::now(), &mut target).unwrap();

        // Supersede the in-flight yale/hipparcos request before it is applied
        let config = RenderConfig { catalog: CatalogId::Yale, min_magnitude: 3.0, ..orch.config().clone() };
        orch.set_config(config).unwrap();
        assert!(orch.settle(std::time::Duration::from_secs(10)));

        assert!(!orch.stars().is_empty());
        assert!(orch.stars().iter().all(|s| s.magnitude <= 3.0), "only the latest request applies");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut orch = orchestrator(100);
        let bad = RenderConfig { catalog: CatalogId::Messier, ..Default::default() };
        assert!(orch.set_config(bad).is_err());
        assert_eq!(orch.config().catalog, CatalogId::Hipparcos);
    }

    #[test]
    fn test_pick_after_projection() {
        let mut orch = orchestrator(300);
        let mut target = Recorder::default();
        assert!(orch.settle(std::time::Duration::from_secs(10)));
        orch.frame(Instant::now(), &mut target).unwrap();

        let vega = orch.stars().iter().find(|s| s.id == "HIP91262").cloned().unwrap();
        let observer = ObserverContext::fallback(start());
        let screen = orch.view.prepare(&observer).project(&vega.position);
        assert!(screen.visible, "Vega is up over New York at 2024-06-21T00:00Z");

        let picked = orch.pick(screen.x + 3.0, screen.y - 2.0).unwrap();
        assert_eq!(picked.id, "HIP91262");
        assert!(orch.pick(-500.0, -500.0).is_none());
    }

    #[test]
    fn test_deep_sky_toggle_adds_messier() {
        let mut orch = orchestrator(100);
        assert!(orch.settle(std::time::Duration::from_secs(10)));
        assert!(orch.stars().iter().all(|s| !s.id.starts_with('M')));

        let config = RenderConfig { show_deep_sky: true, min_magnitude: 6.0, ..orch.config().clone() };
        orch.set_config(config).unwrap();
        assert!(orch.settle(std::time::Duration::from_secs(10)));
        assert!(orch.stars().iter().any(|s| s.id == "M31"));
        assert!(orch.stars().len() <= 100, "deep-sky objects share the star budget");
        assert!(orch.stars().windows(2).all(|w| catalog_order(&w[0], &w[1]).is_le()));
    }
}
