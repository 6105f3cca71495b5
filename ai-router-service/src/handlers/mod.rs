//! HTTP request handlers.

pub mod health;
pub mod logs;
pub mod run;
pub mod stats;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use logs::list_service_logs;
pub use run::dispatch_request;
pub use stats::get_service_stats;
