//! Server configuration loaded from environment variables.

/// Server configuration.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
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
    /// Media storage settings.
    pub storage: StorageConfig,
}

/// Media file storage settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// `local` (default) or `s3`.
    pub provider: String,
    /// Root directory for the local provider.
    pub local_root: String,
    /// Public URL prefix media files are served from.
    pub base_url: String,
    /// Bucket name for the S3 provider.
    pub s3_bucket: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                         |
    /// |------------------------|---------------------------------|
    /// | `HOST`                 | `0.0.0.0`                       |
    /// | `PORT`                 | `3000`                          |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`         |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                            |
    /// | `STORAGE_PROVIDER`     | `local`                         |
    /// | `STORAGE_LOCAL_ROOT`   | `./media`                       |
    /// | `STORAGE_BASE_URL`     | `http://localhost:3000/media`   |
    /// | `STORAGE_S3_BUCKET`    | (empty)                         |
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

        let storage = StorageConfig {
            provider: std::env::var("STORAGE_PROVIDER").unwrap_or_else(|_| "local".into()),
            local_root: std::env::var("STORAGE_LOCAL_ROOT").unwrap_or_else(|_| "./media".into()),
            base_url: std::env::var("STORAGE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000/media".into()),
            s3_bucket: std::env::var("STORAGE_S3_BUCKET").unwrap_or_default(),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            storage,
        }
    }
}
