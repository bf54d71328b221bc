use std::io::{self, Write};

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use clubhouse::auth::passwords::PasswordService;

/// Provision an account out-of-band. Signup through the web always creates
/// role `user`, so the first admin has to come from here.
#[derive(Parser, Debug)]
#[command(name = "create_admin", about = "Create a clubhouse user account")]
struct Args {
    /// Username for the account (alphanumeric).
    #[arg(long)]
    username: String,

    /// Email address for the account (case insensitive).
    #[arg(long)]
    email: String,

    /// Plaintext password to hash and store for this user.
    #[arg(long)]
    password: String,

    /// Role to assign (`user` or `admin`).
    #[arg(long, default_value = "admin")]
    role: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let email = args.email.trim().to_lowercase();
    let username = args.username.trim().to_string();

    if !email.contains('@') {
        writeln!(io::stderr(), "error: email must contain '@'")?;
        std::process::exit(1);
    }

    if username.is_empty() || !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        writeln!(io::stderr(), "error: username must be alphanumeric")?;
        std::process::exit(1);
    }

    let role = match args.role.trim().to_lowercase().as_str() {
        "admin" => "admin",
        "user" => "user",
        other => {
            writeln!(
                io::stderr(),
                "error: unsupported role '{other}'. Use 'user' or 'admin'."
            )?;
            std::process::exit(1);
        }
    };

    let database_url = clubhouse::db::database_url_from_env()
        .ok_or("set DATABASE_URL or the CLUBHOUSE_DB_* variables")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE username = $1 OR lower(email) = lower($2)",
    )
    .bind(&username)
    .bind(&email)
    .fetch_one(&pool)
    .await?;

    if existing > 0 {
        writeln!(
            io::stderr(),
            "error: a user with that username or email already exists."
        )?;
        std::process::exit(1);
    }

    let password_service = PasswordService::new().map_err(|err| {
        io::Error::new(io::ErrorKind::Other, format!("argon2 init failed: {err}"))
    })?;
    let password_hash = password_service
        .hash_password(&args.password)
        .map_err(|err| {
            io::Error::new(io::ErrorKind::Other, format!("password hash failed: {err}"))
        })?;

    let user_id: i32 = sqlx::query_scalar(
        "INSERT INTO users (username, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&username)
    .bind(&email)
    .bind(&password_hash)
    .bind(role)
    .fetch_one(&pool)
    .await?;

    println!("Created {role} user '{username}' <{email}> with id {user_id}");
    Ok(())
}
