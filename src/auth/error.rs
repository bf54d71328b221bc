use rocket::http::Status;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("Invalid email/password combination.")]
    InvalidCredentials,
    #[error("That username or email is already taken.")]
    DuplicateUser,
    #[error("session invalid")]
    SessionInvalid,
    #[error("session expired")]
    SessionExpired,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Sqlx(#[from] rocket_db_pools::sqlx::Error),
    #[error("argon2 parameter error: {0}")]
    Argon2(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

impl AuthError {
    /// HTTP status to report when the error escapes a request guard.
    ///
    /// Validation-style failures never escape: the handlers re-render the
    /// originating form at 200 with an inline message.
    pub fn status(&self) -> Status {
        match self {
            AuthError::Validation { .. }
            | AuthError::InvalidCredentials
            | AuthError::DuplicateUser => Status::Ok,
            AuthError::SessionInvalid
            | AuthError::SessionExpired
            | AuthError::Unauthorized => Status::Unauthorized,
            AuthError::Forbidden => Status::Forbidden,
            AuthError::Config(_)
            | AuthError::Sqlx(_)
            | AuthError::Argon2(_)
            | AuthError::PasswordHash(_) => Status::InternalServerError,
        }
    }
}

impl From<argon2::Error> for AuthError {
    fn from(err: argon2::Error) -> Self {
        AuthError::Argon2(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::PasswordHash(err.to_string())
    }
}
