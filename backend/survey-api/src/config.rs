use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    File { path: PathBuf },
    Redis { uri: String },
}

/// Upper bound for `session_ttl_seconds`, one week.
pub const MAX_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub storage: StorageConfig,
    pub storage_key: String,
    pub export_filename: String,
    pub session_ttl_seconds: i64,
    pub sweep_interval_secs: u64,
    pub pointer_max_samples: usize,
    pub otlp_endpoint: Option<String>,
    /// `user:password` for the metrics endpoint; open when unset.
    pub metrics_auth: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8081".to_string(),
            storage: StorageConfig::File {
                path: PathBuf::from("data/surveys.json"),
            },
            storage_key: "surveys".to_string(),
            export_filename: "survey_responses.xlsx".to_string(),
            session_ttl_seconds: 3600,
            sweep_interval_secs: 60,
            pointer_max_samples: 50_000,
            otlp_endpoint: None,
            metrics_auth: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Root .env first, then a local one
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let defaults = Config::default();

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or(defaults.bind_addr);

        let backend = settings
            .get_string("storage.backend")
            .or_else(|_| env::var("STORAGE_BACKEND"))
            .unwrap_or_else(|_| "file".to_string());

        let storage = match backend.as_str() {
            "redis" => {
                let uri = settings
                    .get_string("redis.uri")
                    .or_else(|_| env::var("REDIS_URI"))
                    .unwrap_or_else(|_| {
                        let host = env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
                        let port = env::var("REDIS_PORT").unwrap_or_else(|_| "6379".to_string());
                        format!("redis://{}:{}/0", host, port)
                    });
                StorageConfig::Redis { uri }
            }
            "file" => {
                let path = settings
                    .get_string("storage.path")
                    .or_else(|_| env::var("SURVEY_STORE_PATH"))
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("data/surveys.json"));
                StorageConfig::File { path }
            }
            other => {
                return Err(config::ConfigError::Message(format!(
                    "unknown storage.backend '{}', expected 'file' or 'redis'",
                    other
                )))
            }
        };

        let storage_key = settings
            .get_string("storage.key")
            .unwrap_or(defaults.storage_key);

        let export_filename = settings
            .get_string("export.filename")
            .unwrap_or(defaults.export_filename);

        let session_ttl_seconds = settings
            .get_int("session.ttl_seconds")
            .ok()
            .or_else(|| {
                env::var("SESSION_DURATION_SECONDS")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok())
            })
            .and_then(clamp_session_ttl)
            .unwrap_or(defaults.session_ttl_seconds);

        let sweep_interval_secs = settings
            .get_int("session.sweep_interval_secs")
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.sweep_interval_secs);

        let pointer_max_samples = settings
            .get_int("pointer.max_samples")
            .ok()
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(defaults.pointer_max_samples);

        let otlp_endpoint = settings
            .get_string("telemetry.otlp_endpoint")
            .or_else(|_| env::var("OTEL_EXPORTER_OTLP_ENDPOINT"))
            .ok()
            .filter(|v| !v.is_empty());

        let metrics_auth = settings
            .get_string("metrics.auth")
            .or_else(|_| env::var("METRICS_AUTH"))
            .ok()
            .filter(|v| !v.is_empty());

        if metrics_auth.is_none() && app_env == "prod" {
            eprintln!("WARNING: METRICS_AUTH is not set, /metrics is unauthenticated");
        }

        Ok(Config {
            bind_addr,
            storage,
            storage_key,
            export_filename,
            session_ttl_seconds,
            sweep_interval_secs,
            pointer_max_samples,
            otlp_endpoint,
            metrics_auth,
        })
    }
}

/// Non-positive values are rejected, large ones capped.
pub fn clamp_session_ttl(seconds: i64) -> Option<i64> {
    (seconds > 0).then(|| seconds.min(MAX_SESSION_TTL_SECONDS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage_key, "surveys");
        assert_eq!(config.export_filename, "survey_responses.xlsx");
        assert_eq!(config.session_ttl_seconds, 3600);
        assert_eq!(config.pointer_max_samples, 50_000);
        assert!(matches!(config.storage, StorageConfig::File { .. }));
    }

    #[test]
    fn test_session_ttl_is_bounded() {
        assert_eq!(clamp_session_ttl(0), None);
        assert_eq!(clamp_session_ttl(-5), None);
        assert_eq!(clamp_session_ttl(90), Some(90));
        assert_eq!(clamp_session_ttl(i64::MAX), Some(MAX_SESSION_TTL_SECONDS));
    }
}
