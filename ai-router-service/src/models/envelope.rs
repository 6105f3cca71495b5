//! Standardized response envelope shared by every AI service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Machine-readable error codes carried by error envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    UnknownService,
    JsonParseError,
    InvalidInputType,
    InternalError,
    Timeout,
}

/// Structured error payload of an error envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceError {
    pub message: String,
    /// Included only when a code applies; clients treat its absence as a
    /// generic failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

/// The canonical success/error wrapper returned by every AI service and by
/// the dispatch endpoint.
///
/// Exactly one of `data` / `error` is populated. Both fields serialize even
/// when null so clients always see the full shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResult {
    pub success: bool,
    pub service: String,
    pub data: Option<Value>,
    pub error: Option<ServiceError>,
}

impl ServiceResult {
    /// Success envelope for `service` carrying `data`.
    pub fn success(service: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            service: service.into(),
            data: Some(data),
            error: None,
        }
    }

    /// Error envelope for `service`.
    pub fn error(
        service: impl Into<String>,
        message: impl Into<String>,
        code: Option<ErrorCode>,
    ) -> Self {
        Self {
            success: false,
            service: service.into(),
            data: None,
            error: Some(ServiceError {
                message: message.into(),
                code,
            }),
        }
    }

    /// Human-readable failure message for logging. `None` for success
    /// envelopes; "Unknown error" when an error envelope carries no message.
    pub fn error_message(&self) -> Option<String> {
        if self.success {
            return None;
        }
        Some(
            self.error
                .as_ref()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "Unknown error".to_string()),
        )
    }
}
