//! Usage statistics endpoint.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ServiceStats;
use crate::startup::AppState;
use service_core::error::AppError;

/// Query params for the stats window.
#[derive(Debug, Deserialize)]
pub struct ServiceStatsQuery {
    /// Narrow the aggregate to one service; absent means all services.
    pub service: Option<String>,
    #[serde(default = "default_window_days")]
    pub window_days: i64,
}

fn default_window_days() -> i64 {
    7
}

#[derive(Debug, Serialize)]
pub struct ServiceStatsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub window_days: i64,
    pub total_calls: i64,
    pub success_count: i64,
    pub avg_response_time_ms: f64,
    pub success_rate: f64,
}

/// Aggregate usage statistics over a trailing window.
///
/// GET /stats
#[tracing::instrument(skip(state))]
pub async fn get_service_stats(
    State(state): State<AppState>,
    Query(query): Query<ServiceStatsQuery>,
) -> Result<Json<ServiceStatsResponse>, AppError> {
    let window_days = query.window_days.clamp(1, 365);
    let since = Utc::now() - Duration::days(window_days);

    let entries = state
        .db
        .find_logs_since(query.service.as_deref(), since)
        .await?;
    let stats = ServiceStats::from_entries(&entries);

    Ok(Json(ServiceStatsResponse {
        service: query.service,
        window_days,
        total_calls: stats.total_calls,
        success_count: stats.success_count,
        avg_response_time_ms: stats.avg_response_time_ms,
        success_rate: stats.success_rate,
    }))
}
