// ==========================================
// SiteTrak - Takeoff Import Repository Trait
// ==========================================
// Responsibility: define import data access (no business logic)
// Red line: the repository does data CRUD only; pipeline rules live in the
// importer
// ==========================================

use crate::domain::takeoff::{CommitOutcome, Drawing, ImportBatch, ImportCommit};
use crate::domain::ReferenceKind;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::collections::HashMap;

// ==========================================
// TakeoffImportRepository Trait
// ==========================================
// Purpose: takeoff import data access
// Implementor: TakeoffImportRepositoryImpl (rusqlite)
#[async_trait]
pub trait TakeoffImportRepository: Send + Sync {
    // ===== Discovery reads =====

    /// Batched existence query for one reference kind.
    ///
    /// # Arguments
    /// - project_id: owning project
    /// - kind: reference kind (decides the table)
    /// - names: distinct names to look up; the caller must not pass an empty
    ///   list (skip the call instead)
    ///
    /// # Returns
    /// - Ok(HashMap<name, id>): only the names that exist appear
    async fn find_reference_ids(
        &self,
        project_id: &str,
        kind: ReferenceKind,
        names: &[String],
    ) -> RepositoryResult<HashMap<String, String>>;

    /// Whether a project row exists.
    async fn project_exists(&self, project_id: &str) -> RepositoryResult<bool>;

    // ===== Transactional commit =====

    /// Persist one import atomically: reference upserts, drawing upserts,
    /// chunked component inserts, and the batch audit row, all in a single
    /// transaction.
    ///
    /// # Arguments
    /// - commit: the full commit payload
    /// - insert_batch_size: components per INSERT statement
    ///
    /// # Returns
    /// - Ok(CommitOutcome): exact created/reused/inserted counts
    /// - Err: any failure; the transaction has been rolled back and nothing
    ///   from this import persists
    async fn commit_import(
        &self,
        commit: &ImportCommit,
        insert_batch_size: usize,
    ) -> RepositoryResult<CommitOutcome>;

    // ===== Batch audit =====

    /// Fetch one batch audit row.
    ///
    /// # Arguments
    /// - batch_id: batch UUID
    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>>;

    /// Most recent batches for a project, newest first.
    ///
    /// # Arguments
    /// - project_id: owning project
    /// - limit: maximum rows returned
    async fn get_recent_batches(
        &self,
        project_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<ImportBatch>>;

    // ===== Queries & counts =====

    /// Look up a drawing by number within a project.
    ///
    /// # Arguments
    /// - project_id: owning project
    /// - drawing_no: drawing number
    ///
    /// # Returns
    /// - Ok(Some(Drawing)): found
    /// - Ok(None): no such drawing
    async fn find_drawing(
        &self,
        project_id: &str,
        drawing_no: &str,
    ) -> RepositoryResult<Option<Drawing>>;

    /// Count components across all of a project's drawings.
    async fn count_components(&self, project_id: &str) -> RepositoryResult<usize>;

    /// Count reference rows of one kind in a project.
    async fn count_references(
        &self,
        project_id: &str,
        kind: ReferenceKind,
    ) -> RepositoryResult<usize>;
}
