//! Configuration module
//!
//! Settings are read from the environment (and `.env` through `dotenvy`) once
//! at start-up. Every optional variable has a default; `validate()` rejects
//! combinations the server cannot run with.

use std::env;
use std::time::Duration;

use crate::backends::{CacheBackend, StorageBackend};

const SERVER_PORT: u16 = 8000;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_MB: usize = 10;
const WORKER_POLL_INTERVAL_MS: u64 = 1500;
const WORKER_MAX_RETRIES: u32 = 3;
const MAILBOX_TTL_SECS: u64 = 86_400;
const BUFFER_CACHE_TTL_SECS: u64 = 3_600;
const USER_IMAGES_TTL_SECS: u64 = 30;
const DERIVED_CACHE_TTL_SECS: u64 = 3_600;

/// HTTP server and security settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub environment: String,
}

/// Background worker settings
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub enabled: bool,
    pub poll_interval_ms: u64,
    pub max_retries: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: WORKER_POLL_INTERVAL_MS,
            max_retries: WORKER_MAX_RETRIES,
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub database_url: String,
    // Cache / queue
    pub cache_backend: CacheBackend,
    pub redis_url: String,
    pub mailbox_ttl_secs: u64,
    pub buffer_cache_ttl_secs: u64,
    pub user_images_ttl_secs: u64,
    /// Upper bound on `imageId:` / `imageIdToTransformImages:` entries, which
    /// are otherwise only dropped by invalidation.
    pub derived_cache_ttl_secs: u64,
    // Blob storage
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Uploads
    pub max_file_size_bytes: usize,
    pub worker: WorkerConfig,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port = env::var("PORT")
            .unwrap_or_else(|_| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let base = BaseConfig {
            server_port,
            cors_origins,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_or("DB_TIMEOUT_SECS", CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            environment,
        };

        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let cache_backend = env::var("CACHE_BACKEND")
            .unwrap_or_else(|_| "redis".to_string())
            .parse::<CacheBackend>()?;

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .parse::<StorageBackend>()?;

        let max_file_size_mb: usize = env_or("MAX_FILE_SIZE_MB", MAX_FILE_SIZE_MB);

        let worker = WorkerConfig {
            enabled: env_or("WORKER_ENABLED", true),
            poll_interval_ms: env_or("WORKER_POLL_INTERVAL_MS", WORKER_POLL_INTERVAL_MS),
            max_retries: env_or("WORKER_MAX_RETRIES", WORKER_MAX_RETRIES),
        };

        Ok(Config {
            base,
            database_url,
            cache_backend,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            mailbox_ttl_secs: env_or("MAILBOX_TTL_SECS", MAILBOX_TTL_SECS),
            buffer_cache_ttl_secs: env_or("BUFFER_CACHE_TTL_SECS", BUFFER_CACHE_TTL_SECS),
            user_images_ttl_secs: env_or("USER_IMAGES_TTL_SECS", USER_IMAGES_TTL_SECS),
            derived_cache_ttl_secs: env_or("DERIVED_CACHE_TTL_SECS", DERIVED_CACHE_TTL_SECS),
            storage_backend,
            s3_bucket: env_opt("S3_BUCKET"),
            s3_region: env_opt("S3_REGION").or_else(|| env_opt("AWS_REGION")),
            s3_endpoint: env_opt("S3_ENDPOINT"),
            local_storage_path: env_opt("LOCAL_STORAGE_PATH"),
            local_storage_base_url: env_opt("LOCAL_STORAGE_BASE_URL"),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            worker,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !(self.database_url.starts_with("postgres://")
            || self.database_url.starts_with("postgresql://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.is_production() && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 if self.s3_bucket.is_none() => {
                return Err(anyhow::anyhow!("STORAGE_BACKEND=s3 requires S3_BUCKET"));
            }
            StorageBackend::Local
                if self.local_storage_path.is_none() || self.local_storage_base_url.is_none() =>
            {
                return Err(anyhow::anyhow!(
                    "STORAGE_BACKEND=local requires LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL"
                ));
            }
            _ => {}
        }

        if self.worker.poll_interval_ms == 0 {
            return Err(anyhow::anyhow!("WORKER_POLL_INTERVAL_MS must be greater than 0"));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn jwt_secret(&self) -> &str {
        &self.base.jwt_secret
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.base.cors_origins
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.base.db_timeout_seconds
    }

    pub fn mailbox_ttl(&self) -> Duration {
        Duration::from_secs(self.mailbox_ttl_secs)
    }

    pub fn buffer_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.buffer_cache_ttl_secs)
    }

    pub fn user_images_ttl(&self) -> Duration {
        Duration::from_secs(self.user_images_ttl_secs)
    }

    pub fn derived_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.derived_cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            base: BaseConfig {
                server_port: 8000,
                cors_origins: vec!["*".to_string()],
                db_max_connections: 5,
                db_timeout_seconds: 5,
                jwt_secret: "a".repeat(32),
                environment: "development".to_string(),
            },
            database_url: "postgres://localhost/pictor".to_string(),
            cache_backend: CacheBackend::Memory,
            redis_url: "redis://localhost:6379".to_string(),
            mailbox_ttl_secs: MAILBOX_TTL_SECS,
            buffer_cache_ttl_secs: BUFFER_CACHE_TTL_SECS,
            user_images_ttl_secs: USER_IMAGES_TTL_SECS,
            derived_cache_ttl_secs: DERIVED_CACHE_TTL_SECS,
            storage_backend: StorageBackend::Local,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: Some("/tmp/pictor".to_string()),
            local_storage_base_url: Some("http://localhost:8000/media".to_string()),
            max_file_size_bytes: 1024,
            worker: WorkerConfig::default(),
        }
    }

    #[test]
    fn test_sample_config_is_valid() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut config = sample();
        config.base.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        let mut config = sample();
        config.base.environment = "production".to_string();
        assert!(config.is_production());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_s3_backend_requires_bucket() {
        let mut config = sample();
        config.storage_backend = StorageBackend::S3;
        assert!(config.validate().is_err());
        config.s3_bucket = Some("images".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_worker_defaults() {
        let worker = WorkerConfig::default();
        assert!(worker.enabled);
        assert_eq!(worker.poll_interval_ms, 1500);
        assert_eq!(worker.max_retries, 3);
    }
}
