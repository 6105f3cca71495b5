use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Default per-handler execution deadline in milliseconds.
const DEFAULT_HANDLER_TIMEOUT_MS: u64 = 30_000;

/// Default MongoDB server selection timeout in milliseconds. This bounds
/// how long a dispatch call waits on an unreachable log store.
const DEFAULT_SELECTION_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    /// Per-handler execution deadline in milliseconds.
    pub handler_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub server_selection_timeout_ms: u64,
}

impl RouterConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(RouterConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("ai_router_db"), is_prod)?,
                server_selection_timeout_ms: get_env(
                    "MONGODB_SELECTION_TIMEOUT_MS",
                    Some(&DEFAULT_SELECTION_TIMEOUT_MS.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_SELECTION_TIMEOUT_MS),
            },
            handler_timeout_ms: get_env(
                "AI_ROUTER_HANDLER_TIMEOUT_MS",
                Some(&DEFAULT_HANDLER_TIMEOUT_MS.to_string()),
                is_prod,
            )?
            .parse()
            .unwrap_or(DEFAULT_HANDLER_TIMEOUT_MS),
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} must be set in production",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} must be set",
                    key
                )))
            }
        }
    }
}
