//! Read-only usage log listing.
//!
//! Entries are append-only; no mutation endpoints exist on this surface.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CallStatus, ServiceLogEntry};
use crate::startup::AppState;
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ListServiceLogsQuery {
    pub service: Option<String>,
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize)]
pub struct ServiceLogResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub service_name: String,
    pub user_identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_payload: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub response_time_ms: i64,
    pub timestamp: DateTime<Utc>,
}

impl From<ServiceLogEntry> for ServiceLogResponse {
    fn from(entry: ServiceLogEntry) -> Self {
        Self {
            id: entry.id.map(|oid| oid.to_hex()),
            service_name: entry.service_name,
            user_identifier: entry.user_identifier,
            request_payload: entry.request_payload,
            status: entry.status.to_string(),
            error_message: entry.error_message,
            response_time_ms: entry.response_time_ms,
            timestamp: entry.timestamp,
        }
    }
}

/// Paginated log listing response.
#[derive(Debug, Serialize)]
pub struct ListServiceLogsResponse {
    pub logs: Vec<ServiceLogResponse>,
    pub total: u64,
    pub limit: i64,
    pub offset: u64,
}

/// List usage log entries, newest first, with filtering and pagination.
///
/// GET /logs
#[tracing::instrument(skip(state))]
pub async fn list_service_logs(
    State(state): State<AppState>,
    Query(query): Query<ListServiceLogsQuery>,
) -> Result<Json<ListServiceLogsResponse>, AppError> {
    let status = match &query.status {
        Some(s) => match s.to_lowercase().as_str() {
            "success" => Some(CallStatus::Success),
            "error" => Some(CallStatus::Error),
            _ => {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Invalid status: {}. Must be one of: success, error",
                    s
                )))
            }
        },
        None => None,
    };

    // Clamp limit to a reasonable range
    let limit = query.limit.clamp(1, 500);

    let (entries, total) = state
        .db
        .find_logs(query.service.as_deref(), status, limit, query.offset)
        .await?;

    let logs: Vec<ServiceLogResponse> =
        entries.into_iter().map(ServiceLogResponse::from).collect();

    Ok(Json(ListServiceLogsResponse {
        logs,
        total,
        limit,
        offset: query.offset,
    }))
}
