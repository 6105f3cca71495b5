//! Central dispatch: maps service names to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinError;

use crate::models::{ErrorCode, ServiceResult};
use crate::services::ai::{AiService, fix_json::FixJsonService};

/// Immutable name-to-handler table, populated at process start.
pub struct ServiceRegistry {
    services: HashMap<String, Arc<dyn AiService>>,
    handler_timeout: Duration,
}

impl ServiceRegistry {
    /// Empty registry with the given per-handler execution deadline.
    pub fn new(handler_timeout: Duration) -> Self {
        Self {
            services: HashMap::new(),
            handler_timeout,
        }
    }

    /// Registry with every built-in service registered.
    pub fn with_default_services(handler_timeout: Duration) -> Self {
        let mut registry = Self::new(handler_timeout);
        registry.register(Arc::new(FixJsonService));
        registry
    }

    /// Register a handler under its own name. Last registration wins.
    pub fn register(&mut self, service: Arc<dyn AiService>) {
        self.services.insert(service.name().to_string(), service);
    }

    /// Names of all registered services, sorted.
    pub fn service_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up and invoke a service by name.
    ///
    /// Never fails: unknown names, handler panics and deadline overruns all
    /// come back as error envelopes.
    pub async fn dispatch(&self, service_name: &str, payload: Value) -> ServiceResult {
        let Some(service) = self.services.get(service_name) else {
            return ServiceResult::error(
                service_name,
                format!("Unknown AI service: {}", service_name),
                Some(ErrorCode::UnknownService),
            );
        };

        // Handlers run in their own task so a panic surfaces as a join
        // error instead of tearing down the request, and so the deadline
        // can abort a runaway handler.
        let service = Arc::clone(service);
        let handle = tokio::spawn(async move { service.run(payload).await });
        let abort_handle = handle.abort_handle();

        match tokio::time::timeout(self.handler_timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => ServiceResult::error(
                service_name,
                format!("Unexpected error: {}", panic_message(join_error)),
                Some(ErrorCode::InternalError),
            ),
            Err(_) => {
                abort_handle.abort();
                ServiceResult::error(
                    service_name,
                    format!(
                        "AI service timed out after {}ms",
                        self.handler_timeout.as_millis()
                    ),
                    Some(ErrorCode::Timeout),
                )
            }
        }
    }
}

/// Printable message from a failed task join. Panic payloads that are not
/// strings get a generic label.
pub(crate) fn panic_message(error: JoinError) -> String {
    match error.try_into_panic() {
        Ok(panic) => {
            if let Some(text) = panic.downcast_ref::<&str>() {
                (*text).to_string()
            } else if let Some(text) = panic.downcast_ref::<String>() {
                text.clone()
            } else {
                "handler panicked".to_string()
            }
        }
        Err(error) => error.to_string(),
    }
}
