use clubhouse::db::MIGRATOR;
use clubhouse::test_support::TestDatabase;

#[tokio::test]
async fn migrations_apply_and_revert_cleanly() {
    let test_db = match TestDatabase::new().await {
        Ok(db) => db,
        Err(err) if err.is_environmental() => {
            eprintln!("skipping migration revert test: {err}");
            return;
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    };

    let pool = test_db.pool_clone();

    // TestDatabase already ran the migrations; revert them all.
    MIGRATOR.undo(&pool, 0).await.expect("migrations revert");

    let users_tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'public' AND table_name = 'users'",
    )
    .fetch_one(&pool)
    .await
    .expect("lookup succeeded");
    assert_eq!(users_tables, 0, "users should be dropped after revert");

    MIGRATOR.run(&pool).await.expect("migrations rerun");

    let tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'public' AND table_name IN ('users', 'sessions')",
    )
    .fetch_one(&pool)
    .await
    .expect("lookup succeeded");
    assert_eq!(tables, 2);

    test_db.close().await.expect("failed to drop test database");
}
