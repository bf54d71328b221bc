use rocket_db_pools::{Database, sqlx};
use sqlx::PgPool;
use sqlx::migrate::Migrator;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Database)]
#[database("clubhouse")]
pub struct ClubhouseDb(sqlx::PgPool);

/// Assemble the database URL from the environment.
///
/// `DATABASE_URL` wins when set; otherwise the URL is built from the
/// individual `CLUBHOUSE_DB_*` variables. Returns `None` when neither is
/// configured, in which case Rocket's own figment (e.g. `Rocket.toml`)
/// supplies the pool configuration.
pub fn database_url_from_env() -> Option<String> {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        return Some(url);
    }

    let host = std::env::var("CLUBHOUSE_DB_HOST").ok()?;
    let user = std::env::var("CLUBHOUSE_DB_USER").ok()?;
    let password = std::env::var("CLUBHOUSE_DB_PASSWORD").ok()?;
    let name = std::env::var("CLUBHOUSE_DB_NAME").ok()?;

    Some(format!("postgres://{user}:{password}@{host}/{name}"))
}

/// Run database migrations.
///
/// Idempotent: `run` ensures the migrations table exists, verifies
/// checksums, and applies any pending migrations before we start serving
/// traffic.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    log::info!("checking database migration state");
    MIGRATOR.run(pool).await?;
    log::info!("database migrations up to date");
    Ok(())
}
