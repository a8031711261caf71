use hotpush_core::version::EmptyTargetPolicy;

/// Server configuration loaded from environment variables.
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
    /// Root directory of the local blob store.
    pub storage_dir: String,
    /// Base URL prefixed to blob identifiers in update-check responses.
    pub download_base_url: String,
    /// How releases with an empty target-version constraint match.
    pub empty_target_policy: EmptyTargetPolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                      |
    /// |------------------------|------------------------------|
    /// | `HOST`                 | `0.0.0.0`                    |
    /// | `PORT`                 | `3000`                       |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`      |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                         |
    /// | `STORAGE_DIR`          | `./data/storage`             |
    /// | `DOWNLOAD_BASE_URL`    | `http://localhost:3000/download` |
    /// | `EMPTY_TARGET_MATCHES` | `any` (or `none`)            |
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

        let storage_dir =
            std::env::var("STORAGE_DIR").unwrap_or_else(|_| "./data/storage".into());

        let download_base_url = std::env::var("DOWNLOAD_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/download".into());

        let empty_target_policy = match std::env::var("EMPTY_TARGET_MATCHES")
            .unwrap_or_else(|_| "any".into())
            .to_lowercase()
            .as_str()
        {
            "none" => EmptyTargetPolicy::MatchNone,
            _ => EmptyTargetPolicy::MatchAny,
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            storage_dir,
            download_base_url,
            empty_target_policy,
        }
    }

    /// Download URL for a blob identifier.
    pub fn download_url(&self, blob_ref: &str) -> String {
        format!("{}/{blob_ref}", self.download_base_url.trim_end_matches('/'))
    }
}
