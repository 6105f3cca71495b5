//! JSON validation service.
//!
//! Despite the historical name, no repair heuristics exist: object payloads
//! pass through unchanged and string payloads are parsed as JSON text.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::AiService;
use crate::models::{ErrorCode, ServiceResult};

pub const SERVICE_NAME: &str = "fix_json";

/// Validates or parses a JSON payload.
#[derive(Debug, Default)]
pub struct FixJsonService;

#[async_trait]
impl AiService for FixJsonService {
    fn name(&self) -> &'static str {
        SERVICE_NAME
    }

    async fn run(&self, payload: Value) -> ServiceResult {
        match payload {
            // Already-structured input passes through untouched.
            Value::Object(_) => {
                ServiceResult::success(SERVICE_NAME, json!({ "fixed_json": payload }))
            }
            Value::String(text) => match serde_json::from_str::<Value>(&text) {
                Ok(parsed) => ServiceResult::success(SERVICE_NAME, json!({ "fixed_json": parsed })),
                Err(e) => ServiceResult::error(
                    SERVICE_NAME,
                    format!("JSON parsing error: {}", e),
                    Some(ErrorCode::JsonParseError),
                ),
            },
            _ => ServiceResult::error(
                SERVICE_NAME,
                "Invalid input type",
                Some(ErrorCode::InvalidInputType),
            ),
        }
    }
}
