//! Integration tests for database initialization

use radiovote_common::db::{init_database, SCHEMA_VERSION};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("radiovote.db");
    assert!(!db_path.exists());

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());

    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("radiovote.db");

    let pool1 = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO votes (track_identity, identity, polarity) VALUES ('t1', 'a', 1)")
        .execute(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    // Reopening keeps existing rows and does not duplicate the schema version
    let pool2 = init_database(&db_path).await.unwrap();
    let votes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(votes, 1);

    let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_version")
        .fetch_all(&pool2)
        .await
        .unwrap();
    assert_eq!(versions, vec![SCHEMA_VERSION]);
}

#[tokio::test]
async fn test_wal_mode_enabled() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("radiovote.db")).await.unwrap();

    let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}

#[tokio::test]
async fn test_votes_unique_constraint() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("radiovote.db")).await.unwrap();

    sqlx::query("INSERT INTO votes (track_identity, identity, polarity) VALUES ('t1', 'a', 1)")
        .execute(&pool)
        .await
        .unwrap();

    let err = sqlx::query(
        "INSERT INTO votes (track_identity, identity, polarity) VALUES ('t1', 'a', -1)",
    )
    .execute(&pool)
    .await
    .unwrap_err();

    match err {
        sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
        other => panic!("expected a database error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_votes_reject_empty_track_identity() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("radiovote.db")).await.unwrap();

    let result = sqlx::query(
        "INSERT INTO votes (track_identity, identity, polarity) VALUES ('', 'a', 1)",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err());
}
