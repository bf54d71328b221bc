//! Server-side session store backed by the `sessions` table.
//!
//! The browser only ever sees an opaque token of the form
//! `"{token_id}.{secret}"`. The secret is stored as a salted SHA-512
//! digest, so a leaked table does not yield usable cookies.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rocket_db_pools::sqlx::{self, PgPool, Row};
use sha2::{Digest, Sha512};
use uuid::Uuid;

use crate::auth::{AuthError, AuthResult};
use crate::models::Role;

const SECRET_LEN: usize = 32;
const SALT_LEN: usize = 16;

/// Freshly created session: the plaintext token goes into the cookie,
/// nothing else leaves the server.
#[derive(Debug, Clone)]
pub struct SessionIssued {
    pub token_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Session state as loaded back from the store for one request.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub token_id: Uuid,
    pub authenticated: bool,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    pool: PgPool,
}

impl SessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an authenticated session snapshotting the verified user.
    ///
    /// The role is taken from the user record the caller just verified,
    /// never from client input.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        role: Role,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> AuthResult<SessionIssued> {
        let token_id = Uuid::new_v4();
        let secret = generate_secret();
        let salt = generate_salt();
        let stored = encode_hash(&salt, &hash_secret(&secret, &salt));
        let expires_at = now + ttl;

        sqlx::query(
            "INSERT INTO sessions (token_id, hashed_secret, authenticated, username, email, role, expires_at) \
             VALUES ($1, $2, TRUE, $3, $4, $5, $6)",
        )
        .bind(token_id)
        .bind(stored)
        .bind(username)
        .bind(email)
        .bind(role.as_str())
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(SessionIssued {
            token_id,
            token: format!("{}.{}", token_id, secret),
            expires_at,
        })
    }

    /// Load and verify the session behind a cookie token.
    ///
    /// Unknown ids, bad secrets, and malformed tokens all come back as
    /// [`AuthError::SessionInvalid`]; an expired row is deleted on sight
    /// and reported as [`AuthError::SessionExpired`].
    pub async fn load(&self, plain_token: &str, now: DateTime<Utc>) -> AuthResult<SessionRecord> {
        let parsed = ParsedSessionToken::parse(plain_token)?;

        let row = sqlx::query(
            "SELECT hashed_secret, authenticated, username, email, role, expires_at \
             FROM sessions WHERE token_id = $1",
        )
        .bind(parsed.token_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Err(AuthError::SessionInvalid),
        };

        let hashed: String = row.try_get("hashed_secret")?;
        let expires_at: DateTime<Utc> = row.try_get("expires_at")?;

        if !verify_secret(&parsed.secret, &hashed)? {
            return Err(AuthError::SessionInvalid);
        }

        if expires_at <= now {
            sqlx::query("DELETE FROM sessions WHERE token_id = $1")
                .bind(parsed.token_id)
                .execute(&self.pool)
                .await?;
            return Err(AuthError::SessionExpired);
        }

        let role: String = row.try_get("role")?;

        Ok(SessionRecord {
            token_id: parsed.token_id,
            authenticated: row.try_get("authenticated")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            role: Role::from_str(&role),
            expires_at,
        })
    }

    /// Destroy the session behind a token. Idempotent: unknown or garbage
    /// tokens are a no-op, not an error.
    pub async fn destroy(&self, plain_token: &str) -> AuthResult<()> {
        let parsed = match ParsedSessionToken::parse(plain_token) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(()),
        };

        sqlx::query("DELETE FROM sessions WHERE token_id = $1")
            .bind(parsed.token_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete every expired session row, returning how many were dropped.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug)]
struct ParsedSessionToken {
    token_id: Uuid,
    secret: String,
}

impl ParsedSessionToken {
    fn parse(token: &str) -> AuthResult<Self> {
        let (id_part, secret) = token.split_once('.').ok_or(AuthError::SessionInvalid)?;
        let token_id = id_part
            .parse::<Uuid>()
            .map_err(|_| AuthError::SessionInvalid)?;
        if secret.is_empty() {
            return Err(AuthError::SessionInvalid);
        }

        Ok(Self {
            token_id,
            secret: secret.to_string(),
        })
    }
}

fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    STANDARD_NO_PAD.encode(bytes)
}

fn generate_salt() -> [u8; SALT_LEN] {
    let mut bytes = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

fn hash_secret(secret: &str, salt: &[u8]) -> Vec<u8> {
    let mut hasher = Sha512::new();
    hasher.update(salt);
    hasher.update(secret.as_bytes());
    hasher.finalize().to_vec()
}

fn encode_hash(salt: &[u8], hash: &[u8]) -> String {
    format!(
        "{}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

fn verify_secret(secret: &str, stored: &str) -> AuthResult<bool> {
    let (salt_b64, hash_b64) = stored.split_once('$').ok_or(AuthError::SessionInvalid)?;
    let salt = STANDARD_NO_PAD
        .decode(salt_b64)
        .map_err(|_| AuthError::SessionInvalid)?;
    let expected = STANDARD_NO_PAD
        .decode(hash_b64)
        .map_err(|_| AuthError::SessionInvalid)?;
    Ok(constant_time_eq(&hash_secret(secret, &salt), &expected))
}

/// Constant-time comparison to avoid timing side-channels.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut acc: u8 = 0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }

    acc == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_parse_requires_uuid_dot_secret() {
        let id = Uuid::new_v4();
        let parsed = ParsedSessionToken::parse(&format!("{id}.abc")).expect("parses");
        assert_eq!(parsed.token_id, id);
        assert_eq!(parsed.secret, "abc");

        assert!(ParsedSessionToken::parse("no-dot-here").is_err());
        assert!(ParsedSessionToken::parse("not-a-uuid.secret").is_err());
        assert!(ParsedSessionToken::parse(&format!("{id}.")).is_err());
    }

    #[test]
    fn secret_hash_round_trips() {
        let secret = generate_secret();
        let salt = generate_salt();
        let stored = encode_hash(&salt, &hash_secret(&secret, &salt));

        assert!(verify_secret(&secret, &stored).expect("verify"));
        assert!(!verify_secret("different-secret", &stored).expect("verify runs"));
        assert!(verify_secret(&secret, "missing-separator").is_err());
    }

    #[test]
    fn constant_time_eq_handles_length_mismatch() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
