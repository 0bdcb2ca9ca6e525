// ==========================================
// SiteTrak - SQLite connection and schema
// ==========================================
// Goals:
// - one place for Connection::open PRAGMA behavior, so every module
//   runs with the same foreign_keys / busy_timeout settings
// - one place for the schema DDL, so tests and the CLI build
//   identical databases
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// Default busy_timeout (milliseconds).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Schema version the current code expects.
///
/// The version is advisory (no automatic migration): `read_schema_version`
/// lets callers warn when they open an older database file instead of
/// silently running against it.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Apply the uniform PRAGMA set to a SQLite connection.
///
/// Both settings are per-connection in SQLite, so every open path must
/// go through here:
/// - foreign_keys must be switched on for each connection
/// - busy_timeout must be configured for each connection
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the uniform configuration applied.
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Read the schema_version (None when the table does not exist yet).
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// Create all tables and indexes if they are missing.
///
/// Idempotent; the CLI `init` command and the test helpers both call this
/// against freshly created files and already-initialized ones.
///
/// Deliberate schema points:
/// - component.import_batch_id and drawing.last_import_batch_id carry no
///   foreign key: the commit writes components and drawing touches before
///   the import_batch audit row lands in the same transaction
/// - reference names are unique per project, not globally
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version     INTEGER NOT NULL,
            applied_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS project (
            project_id  TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS project_member (
            project_id  TEXT NOT NULL REFERENCES project(project_id),
            user_id     TEXT NOT NULL,
            role        TEXT NOT NULL,
            added_at    TEXT NOT NULL,
            PRIMARY KEY (project_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS area (
            area_id     TEXT PRIMARY KEY,
            project_id  TEXT NOT NULL REFERENCES project(project_id),
            name        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            UNIQUE (project_id, name)
        );

        CREATE TABLE IF NOT EXISTS system (
            system_id   TEXT PRIMARY KEY,
            project_id  TEXT NOT NULL REFERENCES project(project_id),
            name        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            UNIQUE (project_id, name)
        );

        CREATE TABLE IF NOT EXISTS test_package (
            test_package_id TEXT PRIMARY KEY,
            project_id      TEXT NOT NULL REFERENCES project(project_id),
            name            TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            UNIQUE (project_id, name)
        );

        CREATE TABLE IF NOT EXISTS drawing (
            drawing_id           TEXT PRIMARY KEY,
            project_id           TEXT NOT NULL REFERENCES project(project_id),
            drawing_no           TEXT NOT NULL,
            last_import_batch_id TEXT,
            created_at           TEXT NOT NULL,
            updated_at           TEXT NOT NULL,
            UNIQUE (project_id, drawing_no)
        );

        CREATE TABLE IF NOT EXISTS component (
            component_id    TEXT NOT NULL,
            drawing_id      TEXT NOT NULL REFERENCES drawing(drawing_id),
            component_type  TEXT NOT NULL,
            size_token      TEXT NOT NULL,
            commodity_code  TEXT NOT NULL,
            seq             INTEGER,
            area_id         TEXT REFERENCES area(area_id),
            system_id       TEXT REFERENCES system(system_id),
            test_package_id TEXT REFERENCES test_package(test_package_id),
            attributes_json TEXT NOT NULL,
            import_batch_id TEXT NOT NULL,
            source_row      INTEGER NOT NULL,
            created_at      TEXT NOT NULL,
            PRIMARY KEY (drawing_id, component_id)
        );

        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id            TEXT PRIMARY KEY,
            project_id          TEXT NOT NULL REFERENCES project(project_id),
            file_name           TEXT,
            total_rows          INTEGER NOT NULL,
            success_rows        INTEGER NOT NULL,
            error_rows          INTEGER NOT NULL,
            components_inserted INTEGER NOT NULL,
            drawings_created    INTEGER NOT NULL,
            drawings_updated    INTEGER NOT NULL,
            imported_at         TEXT,
            imported_by         TEXT,
            elapsed_ms          INTEGER,
            error_report_json   TEXT
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id  TEXT NOT NULL,
            key       TEXT NOT NULL,
            value     TEXT NOT NULL,
            PRIMARY KEY (scope_id, key)
        );

        -- components are listed per batch (audit drill-down) and per drawing
        CREATE INDEX IF NOT EXISTS idx_component_batch ON component(import_batch_id);
        CREATE INDEX IF NOT EXISTS idx_drawing_project ON drawing(project_id);
        CREATE INDEX IF NOT EXISTS idx_batch_project_time ON import_batch(project_id, imported_at);
        "#,
    )?;

    // Record the version once; re-running init on the same file is a no-op.
    let recorded: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    if recorded.is_none() {
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![CURRENT_SCHEMA_VERSION, chrono::Utc::now().to_rfc3339()],
        )?;
    }

    Ok(())
}

/// Insert a project row if it does not exist yet.
///
/// Used by the CLI `init` command and the test helpers.
pub fn seed_project(conn: &Connection, project_id: &str, name: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO project (project_id, name, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![project_id, name, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// Grant a user membership in a project (idempotent).
pub fn add_project_member(
    conn: &Connection,
    project_id: &str,
    user_id: &str,
    role: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO project_member (project_id, user_id, role, added_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(project_id, user_id) DO UPDATE SET role = ?3
        "#,
        rusqlite::params![project_id, user_id, role, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}
