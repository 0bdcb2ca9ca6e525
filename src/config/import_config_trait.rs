// ==========================================
// SiteTrak - Import Configuration Reader Trait
// ==========================================
// Responsibility: configuration the import pipeline consults at runtime
// (read interface only, no implementation)
// Red line: no config writes, no business logic
// ==========================================

use crate::domain::takeoff::TargetField;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::collections::HashMap;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// Implementor: ConfigManager (reads the config_kv table)
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== Commit limits =====

    /// Maximum serialized size of one commit payload, in bytes.
    ///
    /// # Returns
    /// - usize: ceiling applied before the transaction is opened
    ///
    /// # Default
    /// - 5_500_000
    async fn get_max_payload_bytes(&self) -> ImportResult<usize>;

    /// Component rows written per INSERT statement.
    ///
    /// # Returns
    /// - usize: chunk size, never below 1
    ///
    /// # Default
    /// - 1000
    async fn get_insert_batch_size(&self) -> ImportResult<usize>;

    // ===== Column mapping =====

    /// Extra header synonyms merged into the built-in synonym table.
    ///
    /// Stored as a JSON object keyed by canonical field label, for example
    /// `{"drawing": ["job number"], "test package": ["hydro pkg"]}`.
    ///
    /// # Returns
    /// - HashMap<TargetField, Vec<String>>: extra synonyms per field;
    ///   empty when the key is absent or malformed
    async fn get_header_synonyms(&self) -> ImportResult<HashMap<TargetField, Vec<String>>>;
}
