//! Session store lifecycle against a real database: create, load, expiry,
//! idempotent destroy, and background purge.

use chrono::{Duration, Utc};
use clubhouse::auth::{AuthError, SessionStore};
use clubhouse::models::Role;
use clubhouse::test_support::TestDatabase;

async fn provision() -> Option<TestDatabase> {
    match TestDatabase::new().await {
        Ok(db) => Some(db),
        Err(err) if err.is_environmental() => {
            eprintln!("skipping database test: {err}");
            None
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    }
}

#[tokio::test]
async fn created_sessions_load_back_authenticated() {
    let Some(test_db) = provision().await else { return };
    let store = SessionStore::new(test_db.pool_clone());
    let now = Utc::now();

    let issued = store
        .create("ann", "ann@x.com", Role::User, now, Duration::hours(1))
        .await
        .expect("create");

    let record = store.load(&issued.token, now).await.expect("load");
    assert!(record.authenticated);
    assert_eq!(record.username, "ann");
    assert_eq!(record.email, "ann@x.com");
    assert_eq!(record.role, Role::User);
    // Postgres stores timestamps at microsecond precision.
    assert_eq!(
        record.expires_at.timestamp_micros(),
        issued.expires_at.timestamp_micros()
    );

    // A tampered secret is rejected even though the id exists.
    let tampered = format!("{}.not-the-secret", issued.token_id);
    assert!(matches!(
        store.load(&tampered, now).await,
        Err(AuthError::SessionInvalid)
    ));

    test_db.close().await.expect("drop test database");
}

#[tokio::test]
async fn expired_sessions_are_rejected_and_dropped() {
    let Some(test_db) = provision().await else { return };
    let pool = test_db.pool_clone();
    let store = SessionStore::new(pool.clone());
    let now = Utc::now();

    let issued = store
        .create("ann", "ann@x.com", Role::User, now, Duration::hours(1))
        .await
        .expect("create");

    let after_expiry = now + Duration::hours(2);
    assert!(matches!(
        store.load(&issued.token, after_expiry).await,
        Err(AuthError::SessionExpired)
    ));

    // The expired row was deleted on sight.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(count, 0);

    test_db.close().await.expect("drop test database");
}

#[tokio::test]
async fn destroy_is_idempotent() {
    let Some(test_db) = provision().await else { return };
    let store = SessionStore::new(test_db.pool_clone());
    let now = Utc::now();

    let issued = store
        .create("ann", "ann@x.com", Role::User, now, Duration::hours(1))
        .await
        .expect("create");

    store.destroy(&issued.token).await.expect("first destroy");
    store.destroy(&issued.token).await.expect("second destroy");
    store.destroy("garbage-token").await.expect("garbage is a no-op");

    assert!(matches!(
        store.load(&issued.token, now).await,
        Err(AuthError::SessionInvalid)
    ));

    test_db.close().await.expect("drop test database");
}

#[tokio::test]
async fn purge_drops_only_expired_rows() {
    let Some(test_db) = provision().await else { return };
    let pool = test_db.pool_clone();
    let store = SessionStore::new(pool.clone());
    let now = Utc::now();

    let stale = store
        .create("old", "old@x.com", Role::User, now - Duration::hours(3), Duration::hours(1))
        .await
        .expect("create stale");
    let live = store
        .create("ann", "ann@x.com", Role::User, now, Duration::hours(1))
        .await
        .expect("create live");

    let purged = store.purge_expired(now).await.expect("purge");
    assert_eq!(purged, 1);

    assert!(store.load(&live.token, now).await.is_ok());
    assert!(store.load(&stale.token, now).await.is_err());

    test_db.close().await.expect("drop test database");
}
