//! Usage log model: one append-only record per dispatch call.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of payload characters stored per entry.
pub const MAX_PAYLOAD_CHARS: usize = 500;

/// User identity sentinel until authentication is wired in.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Outcome of a dispatch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Success,
    Error,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Success => "success",
            CallStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A record of a single dispatch call.
///
/// Entries are written once, at the end of the call, and never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceLogEntry {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Name of the dispatched service; "unknown" for calls rejected before
    /// dispatch.
    pub service_name: String,

    /// User ID or "anonymous".
    pub user_identifier: String,

    /// Stringified request payload, truncated to [`MAX_PAYLOAD_CHARS`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_payload: Option<String>,

    pub status: CallStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Wall-clock time of the call in milliseconds.
    pub response_time_ms: i64,

    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
}

impl ServiceLogEntry {
    /// Entry for a finished call, stamped "now". The payload is truncated
    /// before storage.
    pub fn new(
        service_name: impl Into<String>,
        user_identifier: impl Into<String>,
        request_payload: Option<String>,
        status: CallStatus,
        error_message: Option<String>,
        response_time_ms: i64,
    ) -> Self {
        Self {
            id: None,
            service_name: service_name.into(),
            user_identifier: user_identifier.into(),
            request_payload: request_payload.map(|p| truncate_payload(&p)),
            status,
            error_message,
            response_time_ms,
            timestamp: Utc::now(),
        }
    }
}

/// Stringify a request payload for storage. Strings are stored as-is, other
/// values as compact JSON; null carries no payload.
pub fn payload_preview(input: &Value) -> Option<String> {
    match input {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Truncate a payload to [`MAX_PAYLOAD_CHARS`] characters on a char boundary.
pub fn truncate_payload(payload: &str) -> String {
    match payload.char_indices().nth(MAX_PAYLOAD_CHARS) {
        Some((idx, _)) => payload[..idx].to_string(),
        None => payload.to_string(),
    }
}

/// Aggregated usage statistics over a set of log entries.
#[derive(Debug, Clone, Default)]
pub struct ServiceStats {
    pub total_calls: i64,
    pub success_count: i64,
    pub avg_response_time_ms: f64,
    /// Percentage in `[0, 100]`.
    pub success_rate: f64,
}

impl ServiceStats {
    /// Fold log entries into aggregate statistics. The average and rate are
    /// both 0 for an empty slice.
    pub fn from_entries(entries: &[ServiceLogEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }

        let total_calls = entries.len() as i64;
        let success_count = entries
            .iter()
            .filter(|e| e.status == CallStatus::Success)
            .count() as i64;
        let total_response_time_ms: i64 = entries.iter().map(|e| e.response_time_ms).sum();

        Self {
            total_calls,
            success_count,
            avg_response_time_ms: total_response_time_ms as f64 / total_calls as f64,
            success_rate: success_count as f64 / total_calls as f64 * 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(status: CallStatus, response_time_ms: i64) -> ServiceLogEntry {
        ServiceLogEntry::new(
            "fix_json",
            ANONYMOUS_USER,
            None,
            status,
            None,
            response_time_ms,
        )
    }

    #[test]
    fn test_short_payload_is_stored_unchanged() {
        let entry = ServiceLogEntry::new(
            "fix_json",
            ANONYMOUS_USER,
            Some("{\"a\": 1}".to_string()),
            CallStatus::Success,
            None,
            12,
        );
        assert_eq!(entry.request_payload.as_deref(), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_long_payload_is_truncated_to_limit() {
        let long = "x".repeat(MAX_PAYLOAD_CHARS + 250);
        let entry = ServiceLogEntry::new(
            "fix_json",
            ANONYMOUS_USER,
            Some(long),
            CallStatus::Error,
            Some("JSON parsing error".to_string()),
            5,
        );
        let stored = entry.request_payload.unwrap();
        assert_eq!(stored.chars().count(), MAX_PAYLOAD_CHARS);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let long = "é".repeat(MAX_PAYLOAD_CHARS + 10);
        let stored = truncate_payload(&long);
        assert_eq!(stored.chars().count(), MAX_PAYLOAD_CHARS);
        assert!(stored.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_payload_preview_keeps_raw_strings() {
        assert_eq!(
            payload_preview(&json!("{\"a\": 1}")),
            Some("{\"a\": 1}".to_string())
        );
    }

    #[test]
    fn test_payload_preview_serializes_structured_values() {
        assert_eq!(payload_preview(&json!({"a": 1})), Some("{\"a\":1}".to_string()));
        assert_eq!(payload_preview(&json!([1, 2])), Some("[1,2]".to_string()));
        assert_eq!(payload_preview(&json!(42)), Some("42".to_string()));
    }

    #[test]
    fn test_payload_preview_of_null_is_none() {
        assert_eq!(payload_preview(&Value::Null), None);
    }

    #[test]
    fn test_call_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(CallStatus::Success).unwrap(),
            json!("success")
        );
        assert_eq!(
            serde_json::to_value(CallStatus::Error).unwrap(),
            json!("error")
        );
        assert_eq!(CallStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_stats_of_empty_slice_are_all_zero() {
        let stats = ServiceStats::from_entries(&[]);
        assert_eq!(stats.total_calls, 0);
        assert_eq!(stats.success_count, 0);
        assert_eq!(stats.avg_response_time_ms, 0.0);
        assert_eq!(stats.success_rate, 0.0);
    }

    #[test]
    fn test_stats_fold_mixed_outcomes() {
        let entries = vec![
            entry(CallStatus::Success, 10),
            entry(CallStatus::Success, 20),
            entry(CallStatus::Error, 30),
            entry(CallStatus::Error, 40),
        ];
        let stats = ServiceStats::from_entries(&entries);

        assert_eq!(stats.total_calls, 4);
        assert_eq!(stats.success_count, 2);
        assert_eq!(stats.avg_response_time_ms, 25.0);
        assert_eq!(stats.success_rate, 50.0);
    }

    #[test]
    fn test_stats_all_errors_have_zero_success_rate() {
        let entries = vec![entry(CallStatus::Error, 7)];
        let stats = ServiceStats::from_entries(&entries);

        assert_eq!(stats.total_calls, 1);
        assert_eq!(stats.success_count, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.avg_response_time_ms, 7.0);
    }
}
