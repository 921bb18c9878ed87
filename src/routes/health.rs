/**
 * Health Routes
 * Liveness, document store check and readiness
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::db::StoreError;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Healthy,
    Unhealthy,
}

/// Result of checking the document store
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCheck {
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<Duration, StoreError>> for StoreCheck {
    fn from(result: Result<Duration, StoreError>) -> Self {
        match result {
            Ok(latency) => Self {
                status: CheckStatus::Healthy,
                latency_ms: Some(latency.as_millis() as u64),
                error: None,
            },
            Err(e) => Self {
                status: CheckStatus::Unhealthy,
                latency_ms: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub ready: bool,
    pub checked_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub store: StoreCheck,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Liveness {
    pub status: String,
}

async fn check_store(state: &AppState) -> StoreCheck {
    StoreCheck::from(state.site.store().health_check().await)
}

/// GET /health
pub async fn health_ping() -> impl IntoResponse {
    Json(Liveness {
        status: "ok".to_string(),
    })
}

/// GET /health/database
/// Always 200; the body says whether the store answered
pub async fn health_database(State(state): State<AppState>) -> Json<StoreCheck> {
    Json(check_store(&state).await)
}

/// GET /health/ready
/// 503 until the document store answers
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let store = check_store(&state).await;
    let ready = store.status == CheckStatus::Healthy;
    if !ready {
        tracing::warn!(error = ?store.error, "readiness check failed");
    }

    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = Readiness {
        ready,
        checked_at: Utc::now(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        store,
    };
    (code, Json(body))
}
