//! Dispatch endpoint: the HTTP boundary for AI service execution.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::models::{payload_preview, CallStatus, ServiceLogEntry, ANONYMOUS_USER};
use crate::services::metrics::{
    DISPATCH_DURATION, DISPATCH_TOTAL, LOG_WRITE_FAILURES_TOTAL, TRANSPORT_ERRORS_TOTAL,
};
use crate::services::registry::panic_message;
use crate::startup::AppState;

/// POST /run
///
/// Body: `{"service": "<name>", "input": <any>}`. The response is the
/// service envelope with HTTP 200 even for service-level failures; 4xx/5xx
/// are reserved for transport problems. Every call writes exactly one usage
/// log entry, including rejected ones.
#[tracing::instrument(skip(state, body))]
pub async fn dispatch_request(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> Response {
    let started = Instant::now();

    if method != Method::POST {
        TRANSPORT_ERRORS_TOTAL
            .with_label_values(&["bad_method"])
            .inc();
        let entry = rejected_entry("unknown", None, "POST request required", started);
        record_log(&state, entry).await;
        return transport_error(StatusCode::METHOD_NOT_ALLOWED, "POST request required");
    }

    // The processing segment runs in its own task: a panic there must come
    // back as a 500 with its own log entry, not a torn connection.
    let task_state = state.clone();
    let handle = tokio::spawn(async move { process_dispatch(task_state, body, started).await });

    match handle.await {
        Ok(response) => response,
        Err(join_error) => {
            let message = format!("Server error: {}", panic_message(join_error));
            tracing::error!(error = %message, "Dispatch processing failed");
            let entry = rejected_entry("unknown", None, &message, started);
            record_log(&state, entry).await;
            transport_error(StatusCode::INTERNAL_SERVER_ERROR, &message)
        }
    }
}

async fn process_dispatch(state: AppState, body: Bytes, started: Instant) -> Response {
    let data: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => {
            TRANSPORT_ERRORS_TOTAL
                .with_label_values(&["invalid_json"])
                .inc();
            let entry = rejected_entry("unknown", None, "Invalid JSON", started);
            record_log(&state, entry).await;
            return transport_error(StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };

    let service_name = data
        .get("service")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let input = data.get("input").cloned().unwrap_or(Value::Null);
    let request_payload = payload_preview(&input);

    // "unknown" doubles as the absent-name sentinel, so the literal name is
    // rejected as missing too.
    if service_name.is_empty() || service_name == "unknown" {
        TRANSPORT_ERRORS_TOTAL
            .with_label_values(&["missing_service"])
            .inc();
        let entry = rejected_entry(
            &service_name,
            request_payload,
            "AI service name is required",
            started,
        );
        record_log(&state, entry).await;
        return transport_error(StatusCode::BAD_REQUEST, "AI service name is required");
    }

    tracing::info!(service = %service_name, "Dispatching AI service request");

    let result = state.registry.dispatch(&service_name, input).await;

    let status = if result.success {
        CallStatus::Success
    } else {
        CallStatus::Error
    };
    DISPATCH_TOTAL
        .with_label_values(&[service_name.as_str(), status.as_str()])
        .inc();
    DISPATCH_DURATION
        .with_label_values(&[service_name.as_str()])
        .observe(started.elapsed().as_secs_f64());

    let entry = ServiceLogEntry::new(
        service_name,
        ANONYMOUS_USER,
        request_payload,
        status,
        result.error_message(),
        elapsed_ms(started),
    );
    record_log(&state, entry).await;

    (StatusCode::OK, Json(result)).into_response()
}

/// Log entry for a call rejected before (or instead of) a dispatch.
fn rejected_entry(
    service_name: &str,
    request_payload: Option<String>,
    error_message: &str,
    started: Instant,
) -> ServiceLogEntry {
    ServiceLogEntry::new(
        service_name,
        ANONYMOUS_USER,
        request_payload,
        CallStatus::Error,
        Some(error_message.to_string()),
        elapsed_ms(started),
    )
}

fn elapsed_ms(started: Instant) -> i64 {
    started.elapsed().as_millis() as i64
}

/// Transport-level error body, `{"error": <message>}`.
fn transport_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Write a usage log entry, swallowing storage failures. Dispatch must
/// answer even when the log store is down.
async fn record_log(state: &AppState, entry: ServiceLogEntry) {
    if let Err(e) = state.db.insert_log(&entry).await {
        LOG_WRITE_FAILURES_TOTAL
            .with_label_values(&[entry.service_name.as_str()])
            .inc();
        tracing::warn!(
            service = %entry.service_name,
            error = %e,
            "Failed to record usage log entry (non-critical)"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_entry_carries_error_status_and_defaults() {
        let entry = rejected_entry("unknown", None, "POST request required", Instant::now());

        assert_eq!(entry.service_name, "unknown");
        assert_eq!(entry.user_identifier, ANONYMOUS_USER);
        assert_eq!(entry.status, CallStatus::Error);
        assert_eq!(entry.error_message.as_deref(), Some("POST request required"));
        assert!(entry.request_payload.is_none());
        assert!(entry.response_time_ms >= 0);
    }

    #[test]
    fn rejected_entry_keeps_the_offending_payload() {
        let entry = rejected_entry(
            "",
            Some("7".to_string()),
            "AI service name is required",
            Instant::now(),
        );

        assert_eq!(entry.service_name, "");
        assert_eq!(entry.request_payload.as_deref(), Some("7"));
    }
}
