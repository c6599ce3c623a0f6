//! Ephemeris provider: planetary positions, aspects, retrograde periods and
//! lunar phase, served through a TTL cache from a pluggable source.
//!
//! ```text
//! EphemerisProvider ─ TtlCache ─ FallbackSource ─┬─ HttpEphemerisSource | ModelSource(Keplerian)
//!                                                └─ ModelSource(Synthetic) on timeout/failure
//! ```

pub mod aspects;
pub mod cache;
pub mod model;
pub mod moon;
pub mod positions;
pub mod remote;
pub mod retrograde;
pub mod service;
pub mod source;
pub mod synthetic;
pub mod types;

pub use aspects::{classify, EXACT_ORB_DEG};
pub use cache::{cache_key, CacheStats, Clock, ManualClock, SystemClock, TtlCache};
pub use model::{BodyModel, KeplerianModel};
pub use remote::HttpEphemerisSource;
pub use retrograde::SHADOW_DAYS;
pub use source::{EphemerisSource, FallbackSource, ModelSource};
pub use synthetic::SyntheticModel;
pub use types::{
    AspectKind, AspectRecord, EphemerisPayload, EphemerisReply, EphemerisRequest, MoonPhase,
    MoonPhaseName, ObserverLocation, PlanetaryPosition, RetrogradePeriod, ZodiacSign,
};

use crate::error::{DataError, DataResult};
use hifitime::Epoch;
use orrery_core::{EphemerisSettings, ObserverContext, Precision, Provenance};
use orrery_sim::Body;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A reply body with the provenance of the data it came from
#[derive(Clone, Debug, PartialEq)]
pub struct Sourced<T> {
    pub data: T,
    pub provenance: Provenance,
}

/// Cached front end to an ephemeris source
#[derive(Debug)]
pub struct EphemerisProvider {
    source: Arc<dyn EphemerisSource>,
    cache: TtlCache<EphemerisReply>,
}

impl EphemerisProvider {
    pub fn new(source: Arc<dyn EphemerisSource>, cache: TtlCache<EphemerisReply>) -> Self {
        Self { source, cache }
    }

    /// Remote endpoint, else local Keplerian model, else synthetic; always
    /// behind the timeout/fallback decorator
    pub fn from_settings(settings: &EphemerisSettings) -> Self {
        Self::from_settings_with_clock(settings, Arc::new(SystemClock))
    }

    pub fn from_settings_with_clock(settings: &EphemerisSettings, clock: Arc<dyn Clock>) -> Self {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let primary: Arc<dyn EphemerisSource> = match (&settings.endpoint, settings.local_model) {
            (Some(url), _) => Arc::new(HttpEphemerisSource::new(url.clone()).with_timeout(timeout)),
            (None, true) => Arc::new(ModelSource::keplerian()),
            (None, false) => Arc::new(ModelSource::synthetic()),
        };
        info!("Ephemeris source: {}", primary.name());

        let source = FallbackSource::new(primary).with_timeout(timeout);
        let cache = TtlCache::with_clock(
            Duration::from_secs(settings.cache_ttl_secs),
            settings.cache_capacity,
            clock,
        );
        Self::new(Arc::new(source), cache)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Cached query keyed by operation, parameters and precision
    pub async fn query(&self, request: &EphemerisRequest) -> DataResult<EphemerisReply> {
        let key = cache_key(request.operation(), request, request.precision());
        if let Some(hit) = self.cache.get(&key) {
            debug!("Ephemeris cache hit: {}", request.operation());
            return Ok(hit);
        }

        let reply = self.source.query(request).await?;
        self.cache.insert(key, reply.clone());
        Ok(reply)
    }

    pub async fn positions(
        &self,
        bodies: &[Body],
        instant: Epoch,
        observer: Option<&ObserverContext>,
        precision: Precision,
    ) -> DataResult<Sourced<Vec<PlanetaryPosition>>> {
        let request = EphemerisRequest::Positions {
            bodies: bodies.to_vec(),
            instant,
            observer: observer.map(|o| ObserverLocation { latitude: o.latitude, longitude: o.longitude }),
            precision,
        };
        match self.query(&request).await? {
            EphemerisReply { provenance, payload: EphemerisPayload::Positions(data) } => {
                Ok(Sourced { data, provenance })
            }
            other => Err(mismatch("positions", &other)),
        }
    }

    pub async fn aspects(
        &self,
        bodies: &[Body],
        instant: Epoch,
        orb_tolerance: f64,
        precision: Precision,
    ) -> DataResult<Sourced<Vec<AspectRecord>>> {
        let request = EphemerisRequest::Aspects { bodies: bodies.to_vec(), instant, orb_tolerance, precision };
        match self.query(&request).await? {
            EphemerisReply { provenance, payload: EphemerisPayload::Aspects(data) } => {
                Ok(Sourced { data, provenance })
            }
            other => Err(mismatch("aspects", &other)),
        }
    }

    pub async fn retrogrades(
        &self,
        body: Body,
        start: Epoch,
        end: Epoch,
        step_days: f64,
        precision: Precision,
    ) -> DataResult<Sourced<Vec<RetrogradePeriod>>> {
        let request = EphemerisRequest::Retrogrades { body, start, end, step_days, precision };
        match self.query(&request).await? {
            EphemerisReply { provenance, payload: EphemerisPayload::Retrogrades(data) } => {
                Ok(Sourced { data, provenance })
            }
            other => Err(mismatch("retrogrades", &other)),
        }
    }

    pub async fn moon_phase(&self, instant: Epoch, precision: Precision) -> DataResult<Sourced<MoonPhase>> {
        let request = EphemerisRequest::MoonPhase { instant, precision };
        match self.query(&request).await? {
            EphemerisReply { provenance, payload: EphemerisPayload::MoonPhase(data) } => {
                Ok(Sourced { data, provenance })
            }
            other => Err(mismatch("moonPhase", &other)),
        }
    }
}

fn mismatch(expected: &str, reply: &EphemerisReply) -> DataError {
    DataError::Decode(format!("expected {expected} reply, got {}", reply.payload.operation()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EphemerisSource for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        async fn query(&self, request: &EphemerisRequest) -> DataResult<EphemerisReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ModelSource::keplerian().answer(request)
        }
    }

    fn provider() -> (EphemerisProvider, Arc<Counting>, Arc<ManualClock>) {
        let counting = Arc::new(Counting::default());
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::with_clock(Duration::from_secs(60), 16, clock.clone());
        (EphemerisProvider::new(counting.clone(), cache), counting, clock)
    }

    #[tokio::test]
    async fn test_cache_hit_then_refetch_after_expiry() {
        let (provider, counting, clock) = provider();
        let t = Epoch::from_gregorian_utc(2024, 6, 21, 0, 0, 0, 0);

        provider.positions(&[Body::Mars], t, None, Precision::Medium).await.unwrap();
        provider.positions(&[Body::Mars], t, None, Precision::Medium).await.unwrap();
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(61));
        provider.positions(&[Body::Mars], t, None, Precision::Medium).await.unwrap();
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_precision_and_params_key_separately() {
        let (provider, counting, _) = provider();
        let t = Epoch::from_gregorian_utc(2024, 6, 21, 0, 0, 0, 0);

        provider.moon_phase(t, Precision::Low).await.unwrap();
        provider.moon_phase(t, Precision::High).await.unwrap();
        provider.aspects(&[Body::Sun, Body::Moon], t, 8.0, Precision::Low).await.unwrap();
        provider.aspects(&[Body::Sun, Body::Moon], t, 6.0, Precision::Low).await.unwrap();
        assert_eq!(counting.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_from_settings_defaults_to_keplerian() {
        let provider = EphemerisProvider::from_settings(&EphemerisSettings::default());
        let t = Epoch::from_gregorian_utc(2024, 6, 22, 1, 8, 0, 0);
        let phase = provider.moon_phase(t, Precision::Medium).await.unwrap();
        assert_eq!(phase.provenance, Provenance::Authoritative);
        assert_eq!(phase.data.name, MoonPhaseName::FullMoon);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_degrades() {
        let settings = EphemerisSettings {
            endpoint: Some("http://127.0.0.1:9".into()),
            timeout_secs: 2,
            ..Default::default()
        };
        let provider = EphemerisProvider::from_settings(&settings);
        let t = Epoch::from_gregorian_utc(2024, 6, 21, 0, 0, 0, 0);
        let out = provider.positions(&[Body::Sun], t, None, Precision::Medium).await.unwrap();
        assert_eq!(out.provenance, Provenance::Synthetic);
        assert_eq!(out.data.len(), 1);
    }
}
