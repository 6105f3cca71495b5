//! Service layer: AI handlers, dispatch registry, persistence and metrics.

pub mod ai;
pub mod database;
pub mod metrics;
pub mod registry;

pub use ai::AiService;
pub use database::RouterDb;
pub use metrics::{get_metrics, init_metrics};
pub use registry::ServiceRegistry;
