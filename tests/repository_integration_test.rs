// ==========================================
// Repository layer integration tests
// ==========================================
// Target: commit_import transaction semantics (upserts, chunked inserts,
// audit row, rollback) and the discovery / audit read paths
// ==========================================


use sitetrak::db::open_sqlite_connection;
use sitetrak::domain::{
    ComponentAttributes, ComponentRecord, ComponentType, ImportCommit, MetadataPlan,
    MetadataReference, ReferenceKind, RowError,
};
use sitetrak::logging;
use sitetrak::repository::{RepositoryError, TakeoffImportRepository, TakeoffImportRepositoryImpl};
use std::time::Duration;
use test_helpers::{count_rows, create_test_db, seed_test_project};

const PROJECT: &str = "PRJ-1";
const USER: &str = "alice";

fn component(
    drawing_no: &str,
    component_id: &str,
    component_type: ComponentType,
    area: Option<&str>,
    source_row: usize,
) -> ComponentRecord {
    ComponentRecord {
        component_id: component_id.to_string(),
        drawing_no: drawing_no.to_string(),
        component_type,
        size_token: "2".to_string(),
        commodity_code: "VBALU-001".to_string(),
        sequence: Some(1),
        area: area.map(str::to_string),
        system: None,
        test_package: None,
        attributes: ComponentAttributes {
            source_quantity: 1,
            ..Default::default()
        },
        source_row,
    }
}

fn build_commit(
    batch_id: &str,
    drawing_nos: &[&str],
    components: Vec<ComponentRecord>,
    metadata: MetadataPlan,
) -> ImportCommit {
    let total_rows = components.len();
    ImportCommit {
        batch_id: batch_id.to_string(),
        project_id: PROJECT.to_string(),
        file_name: Some("takeoff.csv".to_string()),
        imported_by: Some(USER.to_string()),
        drawing_nos: drawing_nos.iter().map(|d| d.to_string()).collect(),
        components,
        metadata,
        total_rows,
        error_rows: 0,
        row_errors: Vec::new(),
        elapsed_ms: 7,
    }
}

fn scalar(db_path: &str, sql: &str) -> i64 {
    let conn = open_sqlite_connection(db_path).expect("Failed to open db");
    conn.query_row(sql, [], |row| row.get(0))
        .expect("Scalar query failed")
}

// ==========================================
// Test cases
// ==========================================

#[tokio::test]
async fn test_commit_import_writes_everything_in_one_transaction() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_test_project(&db_path, PROJECT, USER).expect("Failed to seed project");
    let repo = TakeoffImportRepositoryImpl::new(&db_path).expect("Failed to create repo");

    let metadata = MetadataPlan {
        areas: vec![MetadataReference::missing("Unit 100")],
        systems: vec![
            MetadataReference::missing("CW-01"),
            MetadataReference::missing("CW-02"),
        ],
        test_packages: Vec::new(),
    };
    let mut commit = build_commit(
        "batch-1",
        &["P-001", "P-002"],
        vec![
            component("P-001", "P-001-2-VBALU-001-001", ComponentType::Valve, Some("Unit 100"), 1),
            component("P-001", "P-001-2-VBALU-001-002", ComponentType::Valve, Some("Unit 100"), 1),
            component("P-002", "P-002-2-VBALU-001-001", ComponentType::Gasket, None, 2),
        ],
        metadata,
    );
    commit.total_rows = 3;
    commit.error_rows = 1;
    commit.row_errors = vec![RowError::new(3, Some("qty"), "qty must be a whole number: x")];

    let outcome = repo
        .commit_import(&commit, 500)
        .await
        .expect("Commit should succeed");

    assert_eq!(outcome.drawings_created, 2);
    assert_eq!(outcome.drawings_updated, 0);
    assert_eq!(outcome.components_inserted, 3);
    assert_eq!(outcome.metadata_created[&ReferenceKind::Area], 1);
    assert_eq!(outcome.metadata_created[&ReferenceKind::System], 2);
    assert_eq!(outcome.metadata_reused[&ReferenceKind::Area], 0);
    // No test packages were planned, so the outcome carries no entry at all
    assert!(!outcome.metadata_created.contains_key(&ReferenceKind::TestPackage));

    // Audit row
    let batch = repo
        .get_batch("batch-1")
        .await
        .expect("Failed to read batch")
        .expect("Batch row should exist");
    assert_eq!(batch.project_id, PROJECT);
    assert_eq!(batch.file_name.as_deref(), Some("takeoff.csv"));
    assert_eq!(batch.total_rows, 3);
    assert_eq!(batch.success_rows, 2);
    assert_eq!(batch.error_rows, 1);
    assert_eq!(batch.components_inserted, 3);
    assert_eq!(batch.drawings_created, 2);
    assert_eq!(batch.imported_by.as_deref(), Some(USER));
    let report = batch.error_report_json.expect("Error report should be set");
    assert!(report.contains("qty"));

    // Drawing state
    let drawing = repo
        .find_drawing(PROJECT, "P-001")
        .await
        .expect("Failed to query drawing")
        .expect("Drawing should exist");
    assert_eq!(drawing.last_import_batch_id.as_deref(), Some("batch-1"));

    // Counts
    assert_eq!(
        repo.count_components(PROJECT).await.expect("count failed"),
        3
    );
    assert_eq!(
        repo.count_references(PROJECT, ReferenceKind::Area)
            .await
            .expect("count failed"),
        1
    );
    assert_eq!(
        repo.count_references(PROJECT, ReferenceKind::System)
            .await
            .expect("count failed"),
        2
    );
    assert_eq!(
        repo.count_references(PROJECT, ReferenceKind::TestPackage)
            .await
            .expect("count failed"),
        0
    );

    // Components that carried an area name point at the upserted area row
    assert_eq!(
        scalar(
            &db_path,
            "SELECT COUNT(*) FROM component WHERE area_id IS NOT NULL"
        ),
        2
    );
}

#[tokio::test]
async fn test_second_commit_reuses_drawings_and_references() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_test_project(&db_path, PROJECT, USER).expect("Failed to seed project");
    let repo = TakeoffImportRepositoryImpl::new(&db_path).expect("Failed to create repo");

    let first = build_commit(
        "batch-1",
        &["P-001"],
        vec![component(
            "P-001",
            "P-001-2-VBALU-001-001",
            ComponentType::Valve,
            Some("Unit 100"),
            1,
        )],
        MetadataPlan {
            areas: vec![MetadataReference::missing("Unit 100")],
            ..Default::default()
        },
    );
    repo.commit_import(&first, 500)
        .await
        .expect("First commit should succeed");

    // Same drawing, same area name, new component id
    let second = build_commit(
        "batch-2",
        &["P-001"],
        vec![component(
            "P-001",
            "P-001-3-VGATU-002-001",
            ComponentType::Valve,
            Some("Unit 100"),
            1,
        )],
        MetadataPlan {
            areas: vec![MetadataReference::missing("Unit 100")],
            ..Default::default()
        },
    );
    let outcome = repo
        .commit_import(&second, 500)
        .await
        .expect("Second commit should succeed");

    assert_eq!(outcome.drawings_created, 0);
    assert_eq!(outcome.drawings_updated, 1);
    assert_eq!(outcome.metadata_created[&ReferenceKind::Area], 0);
    assert_eq!(outcome.metadata_reused[&ReferenceKind::Area], 1);

    // The drawing row now points at the newer batch, and no duplicate
    // area row appeared
    let drawing = repo
        .find_drawing(PROJECT, "P-001")
        .await
        .expect("Failed to query drawing")
        .expect("Drawing should exist");
    assert_eq!(drawing.last_import_batch_id.as_deref(), Some("batch-2"));
    assert_eq!(count_rows(&db_path, "area").expect("count failed"), 1);
    assert_eq!(count_rows(&db_path, "drawing").expect("count failed"), 1);
}

#[tokio::test]
async fn test_commit_rolls_back_completely_on_identity_collision() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_test_project(&db_path, PROJECT, USER).expect("Failed to seed project");
    let repo = TakeoffImportRepositoryImpl::new(&db_path).expect("Failed to create repo");

    let first = build_commit(
        "batch-1",
        &["P-001"],
        vec![
            component("P-001", "P-001-2-VBALU-001-001", ComponentType::Valve, None, 1),
            component("P-001", "P-001-2-VBALU-001-002", ComponentType::Valve, None, 1),
        ],
        MetadataPlan::default(),
    );
    repo.commit_import(&first, 500)
        .await
        .expect("First commit should succeed");

    // The second commit re-inserts an id that already exists on P-001.
    // The fresh component comes first and insert_batch_size = 1 forces it
    // into its own INSERT, so it lands before the collision fires. It also
    // creates a new area inside the same transaction.
    let second = build_commit(
        "batch-2",
        &["P-001"],
        vec![
            component(
                "P-001",
                "P-001-4-GAX-7-001",
                ComponentType::Gasket,
                Some("Unit 900"),
                1,
            ),
            component("P-001", "P-001-2-VBALU-001-001", ComponentType::Valve, None, 2),
        ],
        MetadataPlan {
            areas: vec![MetadataReference::missing("Unit 900")],
            ..Default::default()
        },
    );
    let err = repo
        .commit_import(&second, 1)
        .await
        .expect_err("Colliding commit should fail");
    assert!(
        matches!(err, RepositoryError::UniqueConstraintViolation(_)),
        "unexpected error: {:?}",
        err
    );

    // Nothing from the failed commit persists: not the chunk that inserted
    // cleanly before the collision, and not the area it created
    assert_eq!(
        repo.count_components(PROJECT).await.expect("count failed"),
        2
    );
    assert_eq!(count_rows(&db_path, "area").expect("count failed"), 0);
    assert!(repo
        .get_batch("batch-2")
        .await
        .expect("Failed to read batch")
        .is_none());
    let drawing = repo
        .find_drawing(PROJECT, "P-001")
        .await
        .expect("Failed to query drawing")
        .expect("Drawing should exist");
    assert_eq!(drawing.last_import_batch_id.as_deref(), Some("batch-1"));
    assert_eq!(count_rows(&db_path, "import_batch").expect("count failed"), 1);
}

#[tokio::test]
async fn test_find_reference_ids_returns_only_existing_names() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_test_project(&db_path, PROJECT, USER).expect("Failed to seed project");
    let repo = TakeoffImportRepositoryImpl::new(&db_path).expect("Failed to create repo");

    let seed = build_commit(
        "batch-1",
        &[],
        Vec::new(),
        MetadataPlan {
            areas: vec![
                MetadataReference::missing("Unit 100"),
                MetadataReference::missing("Unit 200"),
            ],
            ..Default::default()
        },
    );
    repo.commit_import(&seed, 500)
        .await
        .expect("Seed commit should succeed");

    let ids = repo
        .find_reference_ids(
            PROJECT,
            ReferenceKind::Area,
            &["Unit 100".to_string(), "Unit 300".to_string()],
        )
        .await
        .expect("Lookup should succeed");
    assert_eq!(ids.len(), 1);
    assert!(ids.contains_key("Unit 100"));
    assert!(!ids.contains_key("Unit 300"));

    // Empty input short-circuits without touching the database
    let ids = repo
        .find_reference_ids(PROJECT, ReferenceKind::Area, &[])
        .await
        .expect("Lookup should succeed");
    assert!(ids.is_empty());

    // Kinds are isolated tables: an area name is not a system name
    let ids = repo
        .find_reference_ids(PROJECT, ReferenceKind::System, &["Unit 100".to_string()])
        .await
        .expect("Lookup should succeed");
    assert!(ids.is_empty());
}

#[tokio::test]
async fn test_get_recent_batches_filters_by_project_and_orders_newest_first() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_test_project(&db_path, PROJECT, USER).expect("Failed to seed project");
    seed_test_project(&db_path, "PRJ-2", USER).expect("Failed to seed project");
    let repo = TakeoffImportRepositoryImpl::new(&db_path).expect("Failed to create repo");

    for batch_id in ["batch-1", "batch-2"] {
        let commit = build_commit(batch_id, &[], Vec::new(), MetadataPlan::default());
        repo.commit_import(&commit, 500)
            .await
            .expect("Commit should succeed");
        // imported_at drives the ordering; keep the timestamps apart
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let mut other = build_commit("batch-3", &[], Vec::new(), MetadataPlan::default());
    other.project_id = "PRJ-2".to_string();
    repo.commit_import(&other, 500)
        .await
        .expect("Commit should succeed");

    let batches = repo
        .get_recent_batches(PROJECT, 10)
        .await
        .expect("Query should succeed");
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].batch_id, "batch-2");
    assert_eq!(batches[1].batch_id, "batch-1");

    let batches = repo
        .get_recent_batches(PROJECT, 1)
        .await
        .expect("Query should succeed");
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].batch_id, "batch-2");

    let batches = repo
        .get_recent_batches("PRJ-2", 10)
        .await
        .expect("Query should succeed");
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].batch_id, "batch-3");
}

#[tokio::test]
async fn test_project_exists() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_test_project(&db_path, PROJECT, USER).expect("Failed to seed project");
    let repo = TakeoffImportRepositoryImpl::new(&db_path).expect("Failed to create repo");

    assert!(repo.project_exists(PROJECT).await.expect("query failed"));
    assert!(!repo.project_exists("PRJ-404").await.expect("query failed"));
}
