// ==========================================
// SiteTrak - Configuration Manager
// ==========================================
// Responsibility: configuration load and query
// Storage: config_kv table (key-value, global scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::takeoff::TargetField;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// Create a new ConfigManager instance.
    ///
    /// # Arguments
    /// - db_path: database file path
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create a ConfigManager over an existing connection.
    ///
    /// Re-applies the unified PRAGMAs to the passed connection (idempotent)
    /// so every path through the database behaves the same.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// Read one value from the config_kv table (scope_id = 'global').
    ///
    /// # Arguments
    /// - key: config key
    ///
    /// # Returns
    /// - Some(String): stored value
    /// - None: key absent
    fn get_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: format!("lock failed: {}", e),
        })?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ImportError::ConfigReadError {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Read a config value with a fallback default.
    ///
    /// # Arguments
    /// - key: config key
    /// - default: value used when the key is absent
    fn get_config_or_default(&self, key: &str, default: &str) -> ImportResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Write one global config value (UPSERT).
    ///
    /// # Arguments
    /// - key: config key
    /// - value: stored value
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;

        Ok(())
    }
}

// ==========================================
// ImportConfigReader Trait Implementation
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    // ===== Commit limits =====

    async fn get_max_payload_bytes(&self) -> ImportResult<usize> {
        let value = self.get_config_or_default(config_keys::MAX_IMPORT_PAYLOAD_BYTES, "5500000")?;
        Ok(value.parse::<usize>().unwrap_or(5_500_000))
    }

    async fn get_insert_batch_size(&self) -> ImportResult<usize> {
        let value = self.get_config_or_default(config_keys::IMPORT_INSERT_BATCH_SIZE, "1000")?;
        let size = value.parse::<usize>().unwrap_or(1000);
        Ok(size.max(1))
    }

    // ===== Column mapping =====

    async fn get_header_synonyms(&self) -> ImportResult<HashMap<TargetField, Vec<String>>> {
        let value = self.get_config_or_default(config_keys::HEADER_SYNONYMS, "{}")?;

        let raw: HashMap<String, Vec<String>> =
            serde_json::from_str(&value).unwrap_or_else(|_| {
                warn!(
                    config_key = config_keys::HEADER_SYNONYMS,
                    raw_value = %value,
                    "header synonym config is not a JSON object, ignoring"
                );
                HashMap::new()
            });

        let mut synonyms: HashMap<TargetField, Vec<String>> = HashMap::new();
        for (label, extra) in raw {
            let normalized = label.trim().to_lowercase();
            match TargetField::ALL.iter().find(|f| f.label() == normalized) {
                Some(field) => synonyms.entry(*field).or_default().extend(extra),
                None => warn!(
                    config_key = config_keys::HEADER_SYNONYMS,
                    field = %label,
                    "unknown field label in header synonym config, skipping"
                ),
            }
        }

        Ok(synonyms)
    }
}

// ==========================================
// Config key constants
// ==========================================
pub mod config_keys {
    // Commit limits
    pub const MAX_IMPORT_PAYLOAD_BYTES: &str = "max_import_payload_bytes";
    pub const IMPORT_INSERT_BATCH_SIZE: &str = "import_insert_batch_size";

    // Column mapping
    pub const HEADER_SYNONYMS: &str = "header_synonyms";
}
