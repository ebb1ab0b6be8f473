use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    /// Uploaded images land in `<media_root>/posts/`.
    pub media_root: PathBuf,
    pub max_upload_bytes: usize,
    pub index_cache_ttl: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn new(jwt_secret: impl Into<String>, media_root: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            jwt_secret: jwt_secret.into(),
            token_ttl_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            media_root: media_root.into(),
            max_upload_bytes: 5 * 1024 * 1024,
            index_cache_ttl: Duration::from_secs(20),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Reads the process environment. `.env` is honoured if present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        let mut config = Config::new(jwt_secret, try_load::<String>("MEDIA_ROOT", "media")?);

        config.bind_addr = try_load("BIND_ADDR", &config.bind_addr)?;
        config.token_ttl_hours = try_load("TOKEN_TTL_HOURS", "24")?;
        config.bcrypt_cost = try_load("BCRYPT_COST", &config.bcrypt_cost.to_string())?;
        config.max_upload_bytes =
            try_load("MAX_UPLOAD_BYTES", &config.max_upload_bytes.to_string())?;
        config.index_cache_ttl = Duration::from_secs(try_load("INDEX_CACHE_SECONDS", "20")?);
        config.request_timeout = Duration::from_secs(try_load("REQUEST_TIMEOUT_SECONDS", "30")?);

        Ok(config)
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}
