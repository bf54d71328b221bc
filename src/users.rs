//! Query helpers for the credential store.

use rocket_db_pools::sqlx::{self, PgPool, Row};

use crate::auth::{AuthError, AuthResult};
use crate::models::{Role, UserListing, UserRecord};

/// Insert a new user, returning its id.
///
/// A unique-key violation on username or email surfaces as
/// [`AuthError::DuplicateUser`]; the race between two concurrent signups is
/// settled by the database constraint.
pub async fn insert_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> AuthResult<i32> {
    let user_id = sqlx::query_scalar(
        "INSERT INTO users (username, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AuthError::DuplicateUser
        } else {
            AuthError::from(err)
        }
    })?;

    Ok(user_id)
}

/// Fetch every user matching the given email (case-insensitive).
///
/// Login requires exactly one match; returning the whole set lets the
/// caller treat zero and many rows the same way without leaking which.
pub async fn find_all_by_email(pool: &PgPool, email: &str) -> AuthResult<Vec<UserRecord>> {
    let rows = sqlx::query(
        "SELECT id, username, email, password_hash, role FROM users WHERE lower(email) = lower($1)",
    )
    .bind(email)
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let role: String = row.try_get("role")?;
        records.push(UserRecord {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role: Role::from_str(&role),
        });
    }

    Ok(records)
}

/// List all users for the admin panel.
pub async fn list_users(pool: &PgPool) -> Result<Vec<UserListing>, sqlx::Error> {
    let rows = sqlx::query("SELECT username, role FROM users ORDER BY username")
        .fetch_all(pool)
        .await?;

    rows.into_iter()
        .map(|row| {
            Ok(UserListing {
                username: row.try_get("username")?,
                role: row.try_get("role")?,
            })
        })
        .collect()
}

/// Set a user's role by username, returning the number of rows updated.
///
/// Idempotent; updating a nonexistent username is a tolerated no-op and
/// reports zero rows.
pub async fn set_role(pool: &PgPool, username: &str, role: Role) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET role = $1 WHERE username = $2")
        .bind(role.as_str())
        .bind(username)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.code().map(|code| code == "23505").unwrap_or(false)
    )
}
