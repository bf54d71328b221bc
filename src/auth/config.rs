use chrono::Duration;

/// Authentication configuration loaded once from environment variables and
/// passed around as immutable state.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session_ttl_secs: i64,
    pub session_cookie_name: String,
    pub cookie_secure: bool,
    pub purge_interval_secs: u64,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let session_ttl_secs = std::env::var("CLUBHOUSE_SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60 * 60);
        let session_cookie_name = std::env::var("CLUBHOUSE_SESSION_COOKIE_NAME")
            .unwrap_or_else(|_| "clubhouse_session".into());
        let cookie_secure = std::env::var("CLUBHOUSE_COOKIE_SECURE")
            .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "on"))
            .unwrap_or(true);
        let purge_interval_secs = std::env::var("CLUBHOUSE_SESSION_PURGE_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(10 * 60);

        Self {
            session_ttl_secs,
            session_cookie_name,
            cookie_secure,
            purge_interval_secs,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_secs)
    }
}
