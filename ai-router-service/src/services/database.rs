//! MongoDB persistence for the service usage log.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime, Document},
    options::{ClientOptions, FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use crate::models::{CallStatus, ServiceLogEntry};

const LOGS_COLLECTION: &str = "service_logs";

#[derive(Clone)]
pub struct RouterDb {
    client: MongoClient,
    db: Database,
}

impl RouterDb {
    /// Create a client with a bounded server-selection timeout. The client
    /// connects lazily, so an unreachable server shows up on first use, not
    /// here.
    pub async fn connect(
        uri: &str,
        database: &str,
        selection_timeout: Duration,
    ) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let mut options = ClientOptions::parse(uri).await.map_err(|e| {
            tracing::error!("Failed to parse MongoDB URI {}: {}", uri, e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        options.server_selection_timeout = Some(selection_timeout);

        let client = MongoClient::with_options(options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);

        Ok(Self { client, db })
    }

    /// Create the log indexes backing the query paths: per-service lookups,
    /// status breakdowns and newest-first time scans.
    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "service_name": 1 })
                .options(
                    IndexOptions::builder()
                        .name("service_name_idx".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "status": 1, "service_name": 1 })
                .options(
                    IndexOptions::builder()
                        .name("status_service_idx".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "timestamp": -1, "service_name": 1 })
                .options(
                    IndexOptions::builder()
                        .name("timestamp_service_idx".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "timestamp": -1 })
                .options(
                    IndexOptions::builder()
                        .name("timestamp_idx".to_string())
                        .build(),
                )
                .build(),
        ];

        self.logs().create_indexes(indexes, None).await.map_err(|e| {
            tracing::error!("Failed to create service log indexes: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        tracing::info!("Service log indexes ready");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    pub fn logs(&self) -> Collection<ServiceLogEntry> {
        self.db.collection(LOGS_COLLECTION)
    }

    /// Append one usage log entry.
    pub async fn insert_log(&self, entry: &ServiceLogEntry) -> Result<(), AppError> {
        self.logs().insert_one(entry, None).await?;
        Ok(())
    }

    /// Entries with `timestamp >= since`, optionally narrowed to one service.
    pub async fn find_logs_since(
        &self,
        service_name: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<Vec<ServiceLogEntry>, AppError> {
        let mut filter = doc! {
            "timestamp": { "$gte": BsonDateTime::from_millis(since.timestamp_millis()) }
        };
        if let Some(name) = service_name {
            filter.insert("service_name", name);
        }

        let cursor = self.logs().find(filter, None).await?;
        let entries = cursor.try_collect().await?;
        Ok(entries)
    }

    /// Newest-first page of entries plus the total count for the filter.
    pub async fn find_logs(
        &self,
        service_name: Option<&str>,
        status: Option<CallStatus>,
        limit: i64,
        offset: u64,
    ) -> Result<(Vec<ServiceLogEntry>, u64), AppError> {
        let mut filter = Document::new();
        if let Some(name) = service_name {
            filter.insert("service_name", name);
        }
        if let Some(status) = status {
            filter.insert("status", status.as_str());
        }

        let total = self.logs().count_documents(filter.clone(), None).await?;

        let options = FindOptions::builder()
            .sort(doc! { "timestamp": -1 })
            .skip(offset)
            .limit(limit)
            .build();
        let cursor = self.logs().find(filter, options).await?;
        let entries = cursor.try_collect().await?;

        Ok((entries, total))
    }
}
