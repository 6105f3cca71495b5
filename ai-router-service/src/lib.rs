//! AI router service: dispatches named AI services over HTTP and records
//! one usage log entry per call.
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
