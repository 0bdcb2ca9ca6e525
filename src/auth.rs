// ==========================================
// SiteTrak - Import Access Policy
// ==========================================
// Responsibility: yes/no write check, consulted once per import attempt
// before anything is persisted
// Red line: policies never mutate state
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// AccessPolicy Trait
// ==========================================

/// Decides whether a user may import into a project.
///
/// # Arguments
/// - user_id: acting user
/// - project_id: target project
///
/// # Returns
/// - Ok(true): the import may proceed
/// - Ok(false): the caller must reject the attempt
/// - Err: the policy itself could not be evaluated
#[async_trait]
pub trait AccessPolicy: Send + Sync {
    async fn can_import(&self, user_id: &str, project_id: &str) -> RepositoryResult<bool>;
}

// ==========================================
// MembershipPolicy - project_member backed
// ==========================================

/// Grants import to users with a membership row in the target project.
pub struct MembershipPolicy {
    conn: Arc<Mutex<Connection>>,
}

impl MembershipPolicy {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl AccessPolicy for MembershipPolicy {
    async fn can_import(&self, user_id: &str, project_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM project_member WHERE project_id = ?1 AND user_id = ?2",
            params![project_id, user_id],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }
}

// ==========================================
// OpenAccessPolicy - single-user operation
// ==========================================

/// Grants every import. For single-user setups where the operator owns the
/// database file outright and membership rows carry no meaning.
pub struct OpenAccessPolicy;

#[async_trait]
impl AccessPolicy for OpenAccessPolicy {
    async fn can_import(&self, _user_id: &str, _project_id: &str) -> RepositoryResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_access_policy_grants_everything() {
        let policy = OpenAccessPolicy;
        let granted = policy.can_import("anyone", "any-project").await.unwrap();
        assert!(granted);
    }
}
