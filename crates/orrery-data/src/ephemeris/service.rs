//! HTTP ephemeris service: `POST /ephemeris` answered by any [`EphemerisSource`]

use super::source::EphemerisSource;
use super::types::{EphemerisReply, EphemerisRequest};
use crate::error::DataError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

type SharedSource = Arc<dyn EphemerisSource>;

/// Router for the ephemeris service
pub fn router(source: SharedSource) -> Router {
    Router::new()
        .route("/ephemeris", post(ephemeris_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(source)
}

/// Bind and serve until the process is stopped
pub async fn serve(addr: SocketAddr, source: SharedSource) -> anyhow::Result<()> {
    info!("Ephemeris service ({}) listening on {}", source.name(), addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(source)).await?;
    Ok(())
}

async fn ephemeris_handler(
    State(source): State<SharedSource>,
    Json(request): Json<EphemerisRequest>,
) -> Result<Json<EphemerisReply>, ServiceError> {
    Ok(Json(source.query(&request).await?))
}

struct ServiceError(DataError);

impl From<DataError> for ServiceError {
    fn from(err: DataError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DataError::InvalidRequest(_) | DataError::Config(_) => StatusCode::BAD_REQUEST,
            DataError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        };
        warn!("Ephemeris request failed: {}", self.0);
        (status, self.0.to_string()).into_response()
    }
}
