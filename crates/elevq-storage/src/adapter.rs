// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`BookingStore`].

use async_trait::async_trait;
use rusqlite::TransactionBehavior;
use tracing::debug;

use elevq_config::model::StorageConfig;
use elevq_core::{
    AdapterType, BookingRepository, BookingStore, ElevqError, HealthStatus, PluginAdapter,
};

use crate::database::{self, Database};
use crate::repository::SqliteRepository;

/// SQLite-backed booking store.
///
/// Each [`BookingStore::transaction`] call runs as one `IMMEDIATE`
/// transaction on the tokio-rusqlite writer thread, so units of work are
/// serialized in-process and take the database write lock up front against
/// other processes.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the database described by `config`, running migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, ElevqError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite store initialized");
        Ok(Self::new(db))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ElevqError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ElevqError> {
        database::checkpoint(self.db.connection()).await?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl BookingStore for SqliteStore {
    async fn transaction<T, F>(&self, work: F) -> Result<T, ElevqError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn BookingRepository) -> Result<T, ElevqError> + Send + 'static,
    {
        self.db
            .connection()
            .call(move |conn| -> Result<T, ElevqError> {
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(|e| ElevqError::Storage {
                        source: Box::new(e),
                    })?;
                // Dropping `tx` on the error path rolls back.
                let value = work(&mut SqliteRepository::new(&tx))?;
                tx.commit().map_err(|e| ElevqError::Storage {
                    source: Box::new(e),
                })?;
                Ok(value)
            })
            .await
            .map_err(database::flatten_call_err)
    }
}
