use super::*;
use crate::embeddings::vector::l2_norm;
use tempfile::TempDir;

const EPSILON: f32 = 1e-6;

fn create_test_config(upsert_mode: UpsertMode) -> (Config, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    config.database.upsert_mode = upsert_mode;
    (config, temp_dir)
}

fn create_store() -> (VectorStore, TempDir) {
    let (config, temp_dir) = create_test_config(UpsertMode::CheckThenWrite);
    let store = VectorStore::new(&config).expect("should create vector store");
    (store, temp_dir)
}

#[tokio::test]
async fn vector_store_initialization() {
    let (config, _temp_dir) = create_test_config(UpsertMode::CheckThenWrite);

    let store = VectorStore::new(&config).expect("should create vector store");

    assert_eq!(store.table_name(), "embeddings_table");
    assert!(config.vector_database_path().is_dir());
    assert_eq!(store.count().await.expect("should count"), 0);
    assert_eq!(store.dimension().await.expect("should read dimension"), None);
}

#[tokio::test]
async fn missing_table_reads_as_empty() {
    let (store, _temp_dir) = create_store();

    assert!(!store.exists("/tmp/a.txt").await);
    assert_eq!(store.get("/tmp/a.txt").await.expect("should query"), None);
    assert!(
        store
            .nearest(&[1.0, 0.0, 0.0], 5)
            .await
            .expect("should search")
            .is_empty()
    );
}

#[tokio::test]
async fn upsert_inserts_then_updates() {
    let (store, _temp_dir) = create_store();

    let first = store
        .upsert("/tmp/a.txt", &[3.0, 4.0, 0.0])
        .await
        .expect("first upsert should succeed");
    assert_eq!(first, UpsertOutcome::Inserted);
    assert!(store.exists("/tmp/a.txt").await);

    let second = store
        .upsert("/tmp/a.txt", &[0.0, 0.0, 2.0])
        .await
        .expect("second upsert should succeed");
    assert_eq!(second, UpsertOutcome::Updated);

    assert_eq!(store.count_path("/tmp/a.txt").await.expect("should count"), 1);
    assert_eq!(store.count().await.expect("should count"), 1);

    let stored = store
        .get("/tmp/a.txt")
        .await
        .expect("should query")
        .expect("row should exist");
    assert_eq!(stored.embedding, vec![0.0, 0.0, 1.0]);
    assert!(!stored.indexed_at.is_empty());
}

#[tokio::test]
async fn stored_vectors_are_unit_length() {
    let (store, _temp_dir) = create_store();

    let vectors: [&[f32]; 3] = [&[10.0, 0.5, -3.0], &[0.001, 0.002, 0.003], &[-1.0, -1.0, -1.0]];
    for (i, vector) in vectors.iter().enumerate() {
        let path = format!("/tmp/file_{i}.txt");
        store
            .upsert(&path, vector)
            .await
            .expect("upsert should succeed");

        let stored = store
            .get(&path)
            .await
            .expect("should query")
            .expect("row should exist");
        assert!((l2_norm(&stored.embedding) - 1.0).abs() < EPSILON);
    }
}

#[tokio::test]
async fn zero_vector_is_rejected_before_storage() {
    let (store, _temp_dir) = create_store();

    let result = store.upsert("/tmp/zero.txt", &[0.0, 0.0, 0.0]).await;

    assert!(matches!(
        result,
        Err(FileVectorError::DegenerateVector { .. })
    ));
    assert_eq!(store.count().await.expect("should count"), 0);
}

#[tokio::test]
async fn dimension_is_fixed_by_first_write() {
    let (store, _temp_dir) = create_store();

    store
        .upsert("/tmp/a.txt", &[1.0, 2.0, 3.0])
        .await
        .expect("upsert should succeed");
    assert_eq!(store.dimension().await.expect("should read"), Some(3));

    let result = store.upsert("/tmp/b.txt", &[1.0, 2.0]).await;
    assert!(matches!(
        result,
        Err(FileVectorError::DimensionMismatch {
            expected: 3,
            actual: 2
        })
    ));

    let search = store.nearest(&[1.0, 2.0], 5).await;
    assert!(matches!(
        search,
        Err(FileVectorError::DimensionMismatch { .. })
    ));
}

#[tokio::test]
async fn nearest_orders_by_distance() {
    let (store, _temp_dir) = create_store();

    store
        .upsert("/tmp/far.txt", &[0.0, 1.0, 0.0])
        .await
        .expect("upsert should succeed");
    store
        .upsert("/tmp/close.txt", &[1.0, 0.1, 0.0])
        .await
        .expect("upsert should succeed");
    store
        .upsert("/tmp/middle.txt", &[1.0, 1.0, 0.0])
        .await
        .expect("upsert should succeed");
    store
        .upsert("/tmp/opposite.txt", &[-1.0, 0.0, 0.0])
        .await
        .expect("upsert should succeed");

    let results = store
        .nearest(&[5.0, 0.0, 0.0], 3)
        .await
        .expect("search should succeed");

    assert_eq!(results.len(), 3);
    let paths: Vec<&str> = results.iter().map(|m| m.file_path.as_str()).collect();
    assert_eq!(paths, vec!["/tmp/close.txt", "/tmp/middle.txt", "/tmp/far.txt"]);
    assert!(
        results
            .windows(2)
            .all(|pair| pair[0].distance <= pair[1].distance)
    );
    assert!((l2_norm(&results[0].embedding) - 1.0).abs() < EPSILON);
}

#[tokio::test]
async fn nearest_returns_at_most_available_rows() {
    let (store, _temp_dir) = create_store();

    store
        .upsert("/tmp/only.txt", &[1.0, 0.0])
        .await
        .expect("upsert should succeed");

    let results = store
        .nearest(&[1.0, 0.0], 5)
        .await
        .expect("search should succeed");
    assert_eq!(results.len(), 1);
    assert!(results[0].distance.abs() < 1e-5);
}

#[tokio::test]
async fn nearest_rejects_zero_limit_and_zero_query() {
    let (store, _temp_dir) = create_store();

    assert!(matches!(
        store.nearest(&[1.0, 0.0], 0).await,
        Err(FileVectorError::Config(_))
    ));
    assert!(matches!(
        store.nearest(&[0.0, 0.0], 5).await,
        Err(FileVectorError::DegenerateVector { .. })
    ));
}

#[tokio::test]
async fn paths_with_quotes_are_matched_exactly() {
    let (store, _temp_dir) = create_store();

    store
        .upsert("/tmp/it's here.txt", &[1.0, 0.0])
        .await
        .expect("upsert should succeed");

    assert!(store.exists("/tmp/it's here.txt").await);
    assert!(!store.exists("/tmp/it").await);
    assert_eq!(
        store
            .upsert("/tmp/it's here.txt", &[0.0, 1.0])
            .await
            .expect("upsert should succeed"),
        UpsertOutcome::Updated
    );
    assert_eq!(store.count().await.expect("should count"), 1);
}

#[tokio::test]
async fn merge_mode_keeps_one_row_per_path() {
    let (config, _temp_dir) = create_test_config(UpsertMode::Merge);
    let store = VectorStore::new(&config).expect("should create vector store");

    for vector in [[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]] {
        let outcome = store
            .upsert("/tmp/a.txt", &vector)
            .await
            .expect("merge should succeed");
        assert_eq!(outcome, UpsertOutcome::Merged);
    }
    store
        .upsert("/tmp/b.txt", &[1.0, 0.0])
        .await
        .expect("merge should succeed");

    assert_eq!(store.count_path("/tmp/a.txt").await.expect("should count"), 1);
    assert_eq!(store.count().await.expect("should count"), 2);

    let stored = store
        .get("/tmp/a.txt")
        .await
        .expect("should query")
        .expect("row should exist");
    let expected = std::f32::consts::FRAC_1_SQRT_2;
    assert!((stored.embedding[0] - expected).abs() < EPSILON);
    assert!((stored.embedding[1] - expected).abs() < EPSILON);
}

#[tokio::test]
async fn separate_stores_share_the_same_table() {
    let (config, _temp_dir) = create_test_config(UpsertMode::CheckThenWrite);
    let writer = VectorStore::new(&config).expect("should create vector store");
    let reader = VectorStore::new(&config).expect("should create vector store");

    writer
        .upsert("/tmp/a.txt", &[1.0, 2.0])
        .await
        .expect("upsert should succeed");

    assert!(reader.exists("/tmp/a.txt").await);
    assert_eq!(reader.count().await.expect("should count"), 1);
}

#[tokio::test]
async fn unreachable_database_fails_open_on_exists() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    config.database.uri = Some("unknown-scheme://nowhere/vectors".to_string());
    let store = VectorStore::new(&config).expect("should create vector store");

    assert!(!store.exists("/tmp/a.txt").await);
    assert!(store.count().await.is_err());
}
