#[macro_use]
extern crate rocket;

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod request_logger;
pub mod routes;
pub mod users;

use std::sync::Once;

use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::fs::{FileServer, relative};
use rocket::{Build, Rocket};
use rocket_db_pools::Database;
use rocket_dyn_templates::Template;

use crate::auth::{AuthConfig, AuthState, PasswordService, SessionStore};
use crate::db::ClubhouseDb;
use crate::request_logger::RequestLogger;

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    log::info!("starting clubhouse portal");

    let figment = rocket::Config::figment();
    let figment = match db::database_url_from_env() {
        Some(url) => figment.merge(("databases.clubhouse.url", url)),
        None => figment,
    };

    rocket::custom(figment)
        .attach(RequestLogger)
        .attach(Template::fairing())
        .attach(ClubhouseDb::init())
        // Run database migrations on startup
        .attach(AdHoc::try_on_ignite("Run Migrations", |rocket| async move {
            match ClubhouseDb::fetch(&rocket) {
                Some(database) => {
                    let pool = (**database).clone();
                    match db::run_migrations(&pool).await {
                        Ok(_) => Ok(rocket),
                        Err(err) => {
                            log::error!("database migrations failed: {}", err);
                            Err(rocket)
                        }
                    }
                }
                None => {
                    log::error!("database pool not available for migrations");
                    Err(rocket)
                }
            }
        }))
        // Clone the pool out of the rocket_db_pools wrapper and build the
        // auth state (config, password hasher, session store) around it.
        .attach(AdHoc::try_on_ignite(
            "Manage DB Pool and Auth State",
            |rocket| async move {
                match ClubhouseDb::fetch(&rocket) {
                    Some(database) => {
                        let pool = (**database).clone();
                        let passwords = match PasswordService::new() {
                            Ok(passwords) => passwords,
                            Err(err) => {
                                log::error!("failed to initialize password hasher: {}", err);
                                return Err(rocket);
                            }
                        };
                        let state = AuthState::new(
                            AuthConfig::from_env(),
                            passwords,
                            SessionStore::new(pool.clone()),
                        );
                        Ok(rocket.manage(pool).manage(state))
                    }
                    None => Err(rocket),
                }
            },
        ))
        // Expired sessions are dropped lazily on load; this task sweeps the
        // rest in the background.
        .attach(AdHoc::on_liftoff("Spawn Session Purge", |rocket| {
            Box::pin(async move {
                if let Some(state) = rocket.state::<AuthState>() {
                    let sessions = state.sessions.clone();
                    let interval = std::time::Duration::from_secs(state.config.purge_interval_secs);
                    tokio::spawn(async move {
                        let mut ticker = tokio::time::interval(interval);
                        loop {
                            ticker.tick().await;
                            match sessions.purge_expired(chrono::Utc::now()).await {
                                Ok(0) => {}
                                Ok(purged) => log::info!("purged {} expired sessions", purged),
                                Err(err) => log::warn!("session purge failed: {}", err),
                            }
                        }
                    });
                } else {
                    log::error!("failed to spawn session purge: auth state not found");
                }
            })
        }))
        .mount(
            "/",
            routes![
                // Pages
                routes::pages::home,
                routes::pages::signup_page,
                routes::pages::login_page,
                routes::pages::members,
                // Auth form handlers
                auth::routes::signup_submit,
                auth::routes::login_submit,
                auth::routes::logout,
                // Admin panel
                routes::admin::admin_panel,
                routes::admin::promote,
                routes::admin::demote,
                // Ops
                routes::health::health_check,
            ],
        )
        .mount("/", FileServer::from(relative!("public")))
        .register(
            "/",
            catchers![
                routes::catchers::not_found,
                routes::catchers::forbidden,
                routes::catchers::unauthorized,
                routes::catchers::internal_error,
            ],
        )
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};
    use rocket_db_pools::sqlx::{self, PgPool};
    use rocket_dyn_templates::Template;

    use crate::auth::{AuthConfig, AuthState, PasswordService, SessionStore};

    pub use database::{TestDatabase, TestDatabaseError};

    /// Auth state wired for tests: insecure cookies, one-hour TTL.
    pub fn test_auth_state(pool: &PgPool) -> AuthState {
        let config = AuthConfig {
            session_ttl_secs: 60 * 60,
            session_cookie_name: "clubhouse_session".into(),
            cookie_secure: false,
            purge_interval_secs: 10 * 60,
        };

        AuthState::new(
            config,
            PasswordService::new().expect("password service"),
            SessionStore::new(pool.clone()),
        )
    }

    /// Convenience helpers for seeding the users table in tests.
    pub struct TestFixtures<'a> {
        pool: &'a PgPool,
    }

    impl<'a> TestFixtures<'a> {
        pub fn new(pool: &'a PgPool) -> Self {
            Self { pool }
        }

        /// Insert a user row, returning the new user id.
        pub async fn insert_user(
            &self,
            username: &str,
            email: &str,
            password_hash: &str,
            role: &str,
        ) -> Result<i32, sqlx::Error> {
            sqlx::query_scalar(
                "INSERT INTO users (username, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .bind(role)
            .fetch_one(self.pool)
            .await
        }
    }

    pub mod database {
        use rocket_db_pools::sqlx::postgres::PgPoolOptions;
        use rocket_db_pools::sqlx::{self, PgPool};
        use testcontainers_modules::postgres::Postgres;
        use testcontainers_modules::testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use thiserror::Error;

        use crate::db::MIGRATOR;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        impl TestDatabaseError {
            /// True when the failure is the Docker environment, not the
            /// code under test; callers skip instead of failing.
            pub fn is_environmental(&self) -> bool {
                matches!(self, TestDatabaseError::Container(_))
            }
        }

        /// Ephemeral migrated Postgres for integration tests, one
        /// disposable container per instance.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            container: Option<ContainerAsync<Postgres>>,
        }

        impl TestDatabase {
            pub async fn new() -> Result<Self, TestDatabaseError> {
                let container = Postgres::default().start().await?;
                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&url)
                    .await?;

                MIGRATOR.run(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    container: Some(container),
                })
            }

            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Close pool connections before the container goes away.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }

                if let Some(container) = self.container.take() {
                    drop(container);
                }

                Ok(())
            }
        }
    }

    /// Builder for constructing Rocket instances tailored for tests.
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        pg_pool: Option<PgPool>,
        auth_state: Option<AuthState>,
    }

    impl TestRocketBuilder {
        /// Sensible defaults: random port, logging off, templates resolved
        /// relative to the crate root regardless of the test's cwd.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false))
                .merge((
                    "template_dir",
                    concat!(env!("CARGO_MANIFEST_DIR"), "/templates"),
                ));

            Self {
                figment,
                mounts: Vec::new(),
                pg_pool: None,
                auth_state: None,
            }
        }

        /// Mount routes at the site root.
        pub fn mount_routes(mut self, routes: Vec<Route>) -> Self {
            self.mounts.push(("/".to_string(), routes));
            self
        }

        /// Manage a `PgPool` for tests exercising database-backed routes.
        pub fn manage_pg_pool(mut self, pool: PgPool) -> Self {
            self.pg_pool = Some(pool);
            self
        }

        /// Manage an [`AuthState`] so session guards resolve.
        pub fn manage_auth_state(mut self, state: AuthState) -> Self {
            self.auth_state = Some(state);
            self
        }

        /// Finish building: templates and the crate's catchers are always
        /// attached so page responses render like production.
        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment)
                .attach(Template::fairing())
                .register(
                    "/",
                    rocket::catchers![
                        crate::routes::catchers::not_found,
                        crate::routes::catchers::forbidden,
                        crate::routes::catchers::unauthorized,
                        crate::routes::catchers::internal_error,
                    ],
                );

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }

            if let Some(pool) = self.pg_pool {
                rocket = rocket.manage(pool);
            }

            if let Some(state) = self.auth_state {
                rocket = rocket.manage(state);
            }

            rocket
        }

        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }

    impl Default for TestRocketBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
