use std::env;

/// Fallback signing key for local development. Never accepted in Production.
const LOCAL_SESSION_SECRET: &str = "local-dev-session-secret-change-me";

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// immutable afterwards, so every request sees the same settings. It is pulled into
/// handlers and extractors via FromRef on the shared AppState.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Database connection string (SQLite).
    pub db_url: String,
    // Runtime environment marker. Controls log format and cookie hardening.
    pub env: Env,
    // HMAC key used to sign and verify session tokens.
    pub session_secret: String,
    // Name of the cookie carrying the session token.
    pub session_cookie_name: String,
    // Sliding lifetime of a session, in minutes.
    pub session_ttl_minutes: i64,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Insert demo users and articles into an empty database at startup.
    pub seed_demo_content: bool,
}

/// Env
///
/// Defines the runtime context, used to switch between developer conveniences
/// (pretty logs, dev secret fallback, demo data) and production hardening.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for test setup.
    /// Points at a private in-memory SQLite database so no files are touched.
    fn default() -> Self {
        Self {
            db_url: "sqlite::memory:".to_string(),
            env: Env::Local,
            session_secret: LOCAL_SESSION_SECRET.to_string(),
            session_cookie_name: "session".to_string(),
            session_ttl_minutes: 1440,
            bind_addr: "127.0.0.1:0".to_string(),
            seed_demo_content: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the application configuration at startup.
    /// It reads all parameters from environment variables and implements the **fail-fast** principle.
    ///
    /// # Panics
    /// Panics if a variable required in Production (`DATABASE_URL`, `SESSION_SECRET`)
    /// is not set, so the service never starts with a forgeable session key.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let session_cookie_name =
            env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "session".to_string());
        let session_ttl_minutes = env::var("SESSION_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|minutes| *minutes > 0)
            .unwrap_or(1440);
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5555".to_string());
        let seed_override = env::var("SEED_DEMO_CONTENT")
            .ok()
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"));

        match env {
            Env::Local => Self {
                env: Env::Local,
                // The original deployment kept its data in a local `app.db` file.
                db_url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://app.db?mode=rwc".to_string()),
                session_secret: env::var("SESSION_SECRET")
                    .unwrap_or_else(|_| LOCAL_SESSION_SECRET.to_string()),
                session_cookie_name,
                session_ttl_minutes,
                bind_addr,
                seed_demo_content: seed_override.unwrap_or(true),
            },
            Env::Production => Self {
                env: Env::Production,
                db_url: env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                session_secret: env::var("SESSION_SECRET")
                    .expect("FATAL: SESSION_SECRET must be set in production."),
                session_cookie_name,
                session_ttl_minutes,
                bind_addr,
                seed_demo_content: seed_override.unwrap_or(false),
            },
        }
    }
}
