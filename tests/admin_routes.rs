//! Admin panel authorization and role promotion flows.

use chrono::{Duration, Utc};
use clubhouse::auth::{AuthState, PasswordService};
use clubhouse::models::Role;
use clubhouse::routes::{admin, pages};
use clubhouse::test_support::{TestDatabase, TestFixtures, TestRocketBuilder, test_auth_state};
use rocket::http::{Cookie, Status};
use rocket::local::asynchronous::Client;
use rocket::routes;
use sqlx::PgPool;

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

async fn admin_client(pool: &PgPool, state: AuthState) -> Client {
    let rocket = TestRocketBuilder::new()
        .manage_pg_pool(pool.clone())
        .manage_auth_state(state)
        .mount_routes(routes![
            pages::home,
            pages::login_page,
            admin::admin_panel,
            admin::promote,
            admin::demote,
        ])
        .build();

    Client::untracked(rocket)
        .await
        .expect("valid Rocket instance")
}

async fn seed_users(pool: &PgPool) {
    let passwords = PasswordService::new().expect("password service");
    let hash = passwords.hash_password("secret1").expect("hash");
    let fixtures = TestFixtures::new(pool);
    fixtures
        .insert_user("root", "root@x.com", &hash, "admin")
        .await
        .expect("seed admin");
    fixtures
        .insert_user("bob", "bob@x.com", &hash, "user")
        .await
        .expect("seed user");
}

/// Issue a session cookie the way a successful login would.
async fn session_cookie(state: &AuthState, username: &str, email: &str, role: Role) -> Cookie<'static> {
    let session = state
        .sessions
        .create(username, email, role, Utc::now(), Duration::hours(1))
        .await
        .expect("create session");
    Cookie::new("clubhouse_session", session.token)
}

#[tokio::test]
async fn admin_panel_gates_by_authentication_and_role() {
    let Some(test_db) = provision().await else { return };
    let pool = test_db.pool_clone();
    seed_users(&pool).await;

    let state = test_auth_state(&pool);
    let client = admin_client(&pool, state.clone()).await;

    // Anonymous: off to the login form, no user data touched.
    let anonymous = client.get("/admin").dispatch().await;
    assert_eq!(anonymous.status(), Status::SeeOther);
    assert_eq!(anonymous.headers().get_one("Location"), Some("/login"));

    // Authenticated non-admin: 403 page.
    let bob = session_cookie(&state, "bob", "bob@x.com", Role::User).await;
    let forbidden = client.get("/admin").cookie(bob).dispatch().await;
    assert_eq!(forbidden.status(), Status::Forbidden);
    assert!(forbidden.into_string().await.expect("body").contains("403"));

    // Admin: full user listing.
    let root = session_cookie(&state, "root", "root@x.com", Role::Admin).await;
    let panel = client.get("/admin").cookie(root).dispatch().await;
    assert_eq!(panel.status(), Status::Ok);
    let body = panel.into_string().await.expect("body");
    assert!(body.contains("bob"));
    assert!(body.contains("root"));

    test_db.close().await.expect("drop test database");
}

#[tokio::test]
async fn promote_then_demote_flips_admin_access() {
    let Some(test_db) = provision().await else { return };
    let pool = test_db.pool_clone();
    seed_users(&pool).await;

    let state = test_auth_state(&pool);
    let client = admin_client(&pool, state.clone()).await;
    let root = session_cookie(&state, "root", "root@x.com", Role::Admin).await;

    let promote = client
        .get("/promote/bob")
        .cookie(root.clone())
        .dispatch()
        .await;
    assert_eq!(promote.status(), Status::SeeOther);
    assert_eq!(promote.headers().get_one("Location"), Some("/admin"));

    let role: String = sqlx::query_scalar("SELECT role FROM users WHERE username = 'bob'")
        .fetch_one(&pool)
        .await
        .expect("role");
    assert_eq!(role, "admin");

    // A session issued after promotion passes the admin gate.
    let bob_admin = session_cookie(&state, "bob", "bob@x.com", Role::Admin).await;
    let panel = client.get("/admin").cookie(bob_admin).dispatch().await;
    assert_eq!(panel.status(), Status::Ok);

    let demote = client
        .get("/demote/bob")
        .cookie(root.clone())
        .dispatch()
        .await;
    assert_eq!(demote.status(), Status::SeeOther);

    let role: String = sqlx::query_scalar("SELECT role FROM users WHERE username = 'bob'")
        .fetch_one(&pool)
        .await
        .expect("role");
    assert_eq!(role, "user");

    let bob_user = session_cookie(&state, "bob", "bob@x.com", Role::User).await;
    let forbidden = client.get("/admin").cookie(bob_user).dispatch().await;
    assert_eq!(forbidden.status(), Status::Forbidden);

    test_db.close().await.expect("drop test database");
}

#[tokio::test]
async fn promote_tolerates_unknown_usernames() {
    let Some(test_db) = provision().await else { return };
    let pool = test_db.pool_clone();
    seed_users(&pool).await;

    let state = test_auth_state(&pool);
    let client = admin_client(&pool, state.clone()).await;
    let root = session_cookie(&state, "root", "root@x.com", Role::Admin).await;

    let response = client.get("/promote/ghost").cookie(root).dispatch().await;
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(response.headers().get_one("Location"), Some("/admin"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(count, 2);

    test_db.close().await.expect("drop test database");
}

#[tokio::test]
async fn promote_requires_an_admin_session() {
    let Some(test_db) = provision().await else { return };
    let pool = test_db.pool_clone();
    seed_users(&pool).await;

    let state = test_auth_state(&pool);
    let client = admin_client(&pool, state.clone()).await;

    // Anonymous callers are bounced to the login form by the 401 catcher.
    let anonymous = client.get("/promote/bob").dispatch().await;
    assert_eq!(anonymous.status(), Status::SeeOther);
    assert_eq!(anonymous.headers().get_one("Location"), Some("/login"));

    // Non-admin sessions get the 403 page.
    let bob = session_cookie(&state, "bob", "bob@x.com", Role::User).await;
    let forbidden = client.get("/promote/bob").cookie(bob).dispatch().await;
    assert_eq!(forbidden.status(), Status::Forbidden);

    let role: String = sqlx::query_scalar("SELECT role FROM users WHERE username = 'bob'")
        .fetch_one(&pool)
        .await
        .expect("role");
    assert_eq!(role, "user");

    test_db.close().await.expect("drop test database");
}
