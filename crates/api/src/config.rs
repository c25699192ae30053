use crate::auth::jwt::JwtConfig;

/// Default minimum password length for user accounts.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 12;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks to drain (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// 64 hex characters; AES-256 key for stored TOTP secrets.
    pub totp_encryption_key: String,
    /// Issuer shown by authenticator apps.
    pub totp_issuer: String,
    /// Base URL of the public registration front end, used in QR payloads.
    pub public_base_url: String,
    pub min_password_length: usize,
    /// Shared secret for signed Pocket Receptionist webhooks. `None` disables the endpoint.
    pub pocket_receptionist_secret: Option<String>,
    /// Interval between expired-session purges (default: `3600`).
    pub session_cleanup_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                    |
    /// |---------------------------------|----------------------------|
    /// | `HOST`                          | `0.0.0.0`                  |
    /// | `PORT`                          | `3000`                     |
    /// | `CORS_ORIGINS`                  | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`          | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`         | `30`                       |
    /// | `TOTP_ENCRYPTION_KEY`           | **required**               |
    /// | `TOTP_ISSUER`                   | `OpenDLP`                  |
    /// | `PUBLIC_BASE_URL`               | `http://localhost:5173`    |
    /// | `MIN_PASSWORD_LENGTH`           | `12`                       |
    /// | `POCKET_RECEPTIONIST_SECRET`    | unset                      |
    /// | `SESSION_CLEANUP_INTERVAL_SECS` | `3600`                     |
    ///
    /// JWT settings are read by [`JwtConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics on unparsable numbers or a missing `TOTP_ENCRYPTION_KEY`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();

        let totp_encryption_key = std::env::var("TOTP_ENCRYPTION_KEY")
            .expect("TOTP_ENCRYPTION_KEY must be set in the environment");

        let totp_issuer = std::env::var("TOTP_ISSUER").unwrap_or_else(|_| "OpenDLP".into());

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .trim_end_matches('/')
            .to_string();

        let min_password_length: usize = std::env::var("MIN_PASSWORD_LENGTH")
            .unwrap_or_else(|_| DEFAULT_MIN_PASSWORD_LENGTH.to_string())
            .parse()
            .expect("MIN_PASSWORD_LENGTH must be a valid usize");

        let pocket_receptionist_secret = std::env::var("POCKET_RECEPTIONIST_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let session_cleanup_interval_secs: u64 = std::env::var("SESSION_CLEANUP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("SESSION_CLEANUP_INTERVAL_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt,
            totp_encryption_key,
            totp_issuer,
            public_base_url,
            min_password_length,
            pocket_receptionist_secret,
            session_cleanup_interval_secs,
        }
    }
}
