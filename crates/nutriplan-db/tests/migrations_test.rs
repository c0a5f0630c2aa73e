//! Integration tests for database migrations and connection pooling.
//!
//! Uses the shared PostgreSQL from `nutriplan-test-utils`: a testcontainers
//! instance, or the server named by `NUTRIPLAN_TEST_PG_URL`.

use uuid::Uuid;

use nutriplan_db::config::DbConfig;
use nutriplan_db::pool;
use nutriplan_test_utils::{create_test_db, drop_test_db, pg_url};

#[tokio::test]
async fn migrations_create_all_tables() {
    let (pool, db_name) = create_test_db().await;

    let mut created: Vec<String> = sqlx::query_scalar(
        "SELECT tablename::text FROM pg_tables \
         WHERE schemaname = 'public' AND tablename NOT LIKE '\\_sqlx%'",
    )
    .fetch_all(&pool)
    .await
    .expect("should list tables");
    created.sort();
    let mut expected: Vec<&str> = pool::TABLES.to_vec();
    expected.sort_unstable();
    assert_eq!(created, expected, "migration should create exactly the nutriplan tables");

    let counts = pool::table_counts(&pool)
        .await
        .expect("table_counts should succeed");
    let names: Vec<&str> = counts.iter().map(|(name, _)| *name).collect();
    assert_eq!(names, pool::TABLES);
    for (name, count) in &counts {
        assert_eq!(*count, 0, "table {name} should be empty");
    }

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let (pool, db_name) = create_test_db().await;

    // create_test_db already ran them once.
    pool::run_migrations(&pool)
        .await
        .expect("second migration run should succeed (idempotent)");

    let counts = pool::table_counts(&pool).await.expect("should count");
    assert_eq!(counts.len(), pool::TABLES.len());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn ensure_database_exists_is_idempotent() {
    let db_name = format!("nutriplan_test_{}", Uuid::new_v4().simple());
    let config = DbConfig::new(format!("{}/{db_name}", pg_url().await));

    pool::ensure_database_exists(&config)
        .await
        .expect("first ensure should succeed");
    pool::ensure_database_exists(&config)
        .await
        .expect("second ensure should succeed (idempotent)");

    let pool = pool::create_pool(&config)
        .await
        .expect("should connect to the created database");
    let one: (i32,) = sqlx::query_as("SELECT 1")
        .fetch_one(&pool)
        .await
        .expect("simple query should work");
    assert_eq!(one.0, 1);
    pool.close().await;

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn dropping_a_missing_database_is_fine() {
    let maintenance = pool::connect(&format!("{}/postgres", pg_url().await), 1)
        .await
        .expect("maintenance connection");
    pool::drop_database(&maintenance, "nutriplan_never_created")
        .await
        .expect("drop should ignore a missing database");
    maintenance.close().await;
}
