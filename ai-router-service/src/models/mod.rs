//! Domain models for the AI router service.

pub mod envelope;
pub mod service_log;

pub use envelope::{ErrorCode, ServiceError, ServiceResult};
pub use service_log::{
    ANONYMOUS_USER, CallStatus, MAX_PAYLOAD_CHARS, ServiceLogEntry, ServiceStats, payload_preview,
};
