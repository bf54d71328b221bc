//! Authentication module: configuration, credential validation, password
//! hashing, the server-side session store, Rocket request guards, and the
//! signup/login/logout route handlers.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod guards;
pub mod passwords;
pub mod routes;
pub mod sessions;
pub mod validate;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use guards::{RequireAdmin, SessionUser};
pub use passwords::PasswordService;
pub use sessions::SessionStore;

#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub passwords: Arc<PasswordService>,
    pub sessions: SessionStore,
}

impl AuthState {
    pub fn new(config: AuthConfig, passwords: PasswordService, sessions: SessionStore) -> Self {
        Self {
            config,
            passwords: Arc::new(passwords),
            sessions,
        }
    }
}
