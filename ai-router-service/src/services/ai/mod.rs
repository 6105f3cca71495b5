//! AI service handlers.
//!
//! Each capability is a named handler registered with the
//! [`ServiceRegistry`](crate::services::ServiceRegistry). Adding a capability
//! is a registration call, not a new dispatch branch.

pub mod fix_json;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::ServiceResult;

/// A named AI service handler.
///
/// Implementations are stateless and must always return an envelope:
/// failures are expressed as error envelopes, never surfaced to the caller
/// as faults.
#[async_trait]
pub trait AiService: Send + Sync {
    /// Registry key for this handler.
    fn name(&self) -> &'static str;

    /// Execute the handler against a request payload.
    async fn run(&self, payload: Value) -> ServiceResult;
}
