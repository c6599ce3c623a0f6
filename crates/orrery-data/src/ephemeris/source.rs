//! Ephemeris backends and the timeout/fallback decorator

use super::aspects::aspects;
use super::model::{BodyModel, KeplerianModel};
use super::moon::moon_phase;
use super::positions::positions;
use super::retrograde::retrograde_periods;
use super::synthetic::SyntheticModel;
use super::types::{EphemerisPayload, EphemerisReply, EphemerisRequest};
use crate::error::{DataError, DataResult};
use async_trait::async_trait;
use orrery_core::Provenance;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Answers ephemeris requests
#[async_trait]
pub trait EphemerisSource: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    async fn query(&self, request: &EphemerisRequest) -> DataResult<EphemerisReply>;
}

/// Evaluate a request against a body model
pub fn evaluate(model: &dyn BodyModel, request: &EphemerisRequest) -> DataResult<EphemerisPayload> {
    let payload = match request {
        EphemerisRequest::Positions { bodies, instant, observer, .. } => {
            EphemerisPayload::Positions(positions(model, bodies, *instant, *observer))
        }
        EphemerisRequest::Aspects { bodies, instant, orb_tolerance, .. } => {
            if !(orb_tolerance.is_finite() && *orb_tolerance >= 0.0) {
                return Err(DataError::InvalidRequest(format!("orb tolerance {orb_tolerance}")));
            }
            EphemerisPayload::Aspects(aspects(model, bodies, *instant, *orb_tolerance))
        }
        EphemerisRequest::Retrogrades { body, start, end, step_days, .. } => {
            EphemerisPayload::Retrogrades(retrograde_periods(model, *body, *start, *end, *step_days)?)
        }
        EphemerisRequest::MoonPhase { instant, .. } => {
            EphemerisPayload::MoonPhase(moon_phase(model, *instant))
        }
    };
    Ok(payload)
}

/// Local source computing replies from a [`BodyModel`]
#[derive(Debug, Clone)]
pub struct ModelSource {
    model: Arc<dyn BodyModel>,
}

impl ModelSource {
    pub fn new(model: Arc<dyn BodyModel>) -> Self {
        Self { model }
    }

    pub fn keplerian() -> Self {
        Self::new(Arc::new(KeplerianModel))
    }

    pub fn synthetic() -> Self {
        Self::new(Arc::new(SyntheticModel))
    }

    pub fn answer(&self, request: &EphemerisRequest) -> DataResult<EphemerisReply> {
        Ok(EphemerisReply {
            provenance: self.model.provenance(),
            payload: evaluate(self.model.as_ref(), request)?,
        })
    }
}

#[async_trait]
impl EphemerisSource for ModelSource {
    fn name(&self) -> &str {
        self.model.name()
    }

    async fn query(&self, request: &EphemerisRequest) -> DataResult<EphemerisReply> {
        self.answer(request)
    }
}

/// Bounds the primary source by a timeout and answers from the synthetic
/// model for any call that times out or fails transiently
#[derive(Debug, Clone)]
pub struct FallbackSource {
    primary: Arc<dyn EphemerisSource>,
    fallback: ModelSource,
    timeout: Duration,
}

impl FallbackSource {
    pub fn new(primary: Arc<dyn EphemerisSource>) -> Self {
        Self { primary, fallback: ModelSource::synthetic(), timeout: Duration::from_secs(30) }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl EphemerisSource for FallbackSource {
    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn query(&self, request: &EphemerisRequest) -> DataResult<EphemerisReply> {
        let error = match tokio::time::timeout(self.timeout, self.primary.query(request)).await {
            Ok(Ok(reply)) => return Ok(reply),
            Ok(Err(e)) if !e.is_transient() => return Err(e),
            Ok(Err(e)) => e,
            Err(elapsed) => DataError::from(elapsed),
        };

        warn!(
            "Ephemeris source {} failed for {}, using synthetic model: {}",
            self.primary.name(),
            request.operation(),
            error
        );
        let reply = self.fallback.answer(request)?;
        debug!("Synthetic {} reply served", request.operation());
        Ok(EphemerisReply { provenance: Provenance::Synthetic, ..reply })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hifitime::Epoch;
    use orrery_core::Precision;

    #[derive(Debug)]
    struct Stalled;

    #[async_trait]
    impl EphemerisSource for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn query(&self, _: &EphemerisRequest) -> DataResult<EphemerisReply> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(DataError::Unavailable("never".into()))
        }
    }

    #[derive(Debug)]
    struct Refusing;

    #[async_trait]
    impl EphemerisSource for Refusing {
        fn name(&self) -> &str {
            "refusing"
        }

        async fn query(&self, _: &EphemerisRequest) -> DataResult<EphemerisReply> {
            Err(DataError::Network("connection refused".into()))
        }
    }

    fn moon_request() -> EphemerisRequest {
        EphemerisRequest::MoonPhase {
            instant: Epoch::from_gregorian_utc(2024, 6, 22, 0, 0, 0, 0),
            precision: Precision::Medium,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back_to_synthetic() {
        let source = FallbackSource::new(Arc::new(Stalled)).with_timeout(Duration::from_secs(30));
        let reply = source.query(&moon_request()).await.unwrap();
        assert_eq!(reply.provenance, Provenance::Synthetic);
        assert!(matches!(reply.payload, EphemerisPayload::MoonPhase(_)));
    }

    #[tokio::test]
    async fn test_network_error_falls_back() {
        let reply = FallbackSource::new(Arc::new(Refusing)).query(&moon_request()).await.unwrap();
        assert_eq!(reply.provenance, Provenance::Synthetic);
    }

    #[tokio::test]
    async fn test_invalid_request_not_masked() {
        let source = FallbackSource::new(Arc::new(ModelSource::keplerian()));
        let t = Epoch::from_gregorian_utc(2024, 1, 1, 0, 0, 0, 0);
        let request = EphemerisRequest::Retrogrades {
            body: orrery_sim::Body::Mars,
            start: t,
            end: t,
            step_days: 1.0,
            precision: Precision::Low,
        };
        assert!(matches!(source.query(&request).await, Err(DataError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_authoritative_passthrough() {
        let reply = FallbackSource::new(Arc::new(ModelSource::keplerian()))
            .query(&moon_request())
            .await
            .unwrap();
        assert_eq!(reply.provenance, Provenance::Authoritative);
    }
}
