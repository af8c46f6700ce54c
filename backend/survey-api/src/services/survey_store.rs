use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::path::PathBuf;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::metrics::track_store_operation;
use crate::models::Survey;
use crate::utils::retry::{retry_with_backoff, RetryConfig};

/// Persistence for the survey list.
///
/// The whole list lives under one named record and is read and replaced
/// wholesale. Implementations serialize their read-modify-write cycles.
#[async_trait]
pub trait SurveyStore: Send + Sync {
    async fn list_surveys(&self) -> Result<Vec<Survey>>;

    async fn append_survey(&self, survey: Survey) -> Result<()>;

    /// Returns `false` when no survey had that id.
    async fn remove_survey(&self, id: Uuid) -> Result<bool>;

    async fn ping(&self) -> Result<()>;

    fn backend(&self) -> &'static str;
}

fn decode_record(raw: Option<&str>) -> Result<Vec<Survey>> {
    match raw {
        None => Ok(Vec::new()),
        Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(raw).context("survey record is not a valid survey list"),
    }
}

pub struct RedisSurveyStore {
    redis: ConnectionManager,
    key: String,
    retry: RetryConfig,
    write_lock: Mutex<()>,
}

impl RedisSurveyStore {
    pub fn new(redis: ConnectionManager, key: impl Into<String>) -> Self {
        Self {
            redis,
            key: key.into(),
            retry: RetryConfig::default(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_record(&self) -> Result<Vec<Survey>> {
        let raw: Option<String> = retry_with_backoff(&self.retry, "redis GET surveys", || {
            let mut conn = self.redis.clone();
            let key = self.key.clone();
            async move {
                redis::cmd("GET")
                    .arg(&key)
                    .query_async::<Option<String>>(&mut conn)
                    .await
            }
        })
        .await
        .with_context(|| format!("Failed to read survey record '{}'", self.key))?;

        decode_record(raw.as_deref())
    }

    async fn write_record(&self, surveys: &[Survey]) -> Result<()> {
        let payload = serde_json::to_string(surveys)?;
        retry_with_backoff(&self.retry, "redis SET surveys", || {
            let mut conn = self.redis.clone();
            let key = self.key.clone();
            let payload = payload.clone();
            async move {
                redis::cmd("SET")
                    .arg(&key)
                    .arg(payload)
                    .query_async::<()>(&mut conn)
                    .await
            }
        })
        .await
        .with_context(|| format!("Failed to write survey record '{}'", self.key))
    }
}

#[async_trait]
impl SurveyStore for RedisSurveyStore {
    async fn list_surveys(&self) -> Result<Vec<Survey>> {
        track_store_operation("list", self.backend(), self.read_record()).await
    }

    async fn append_survey(&self, survey: Survey) -> Result<()> {
        track_store_operation("append", self.backend(), async {
            let _guard = self.write_lock.lock().await;
            let mut surveys = self.read_record().await?;
            surveys.push(survey);
            self.write_record(&surveys).await
        })
        .await
    }

    async fn remove_survey(&self, id: Uuid) -> Result<bool> {
        track_store_operation("remove", self.backend(), async {
            let _guard = self.write_lock.lock().await;
            let mut surveys = self.read_record().await?;
            let before = surveys.len();
            surveys.retain(|survey| survey.id != id);
            if surveys.len() == before {
                return Ok(false);
            }
            self.write_record(&surveys).await?;
            Ok(true)
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.redis.clone();
        tokio::time::timeout(
            std::time::Duration::from_secs(5),
            redis::cmd("PING").query_async::<String>(&mut conn),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Redis PING timeout after 5s"))??;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// Survey record kept in a local JSON file.
pub struct FileSurveyStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSurveyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read_record(&self) -> Result<Vec<Survey>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => decode_record(Some(&raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }

    async fn write_record(&self, surveys: &[Survey]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let payload = serde_json::to_vec_pretty(surveys)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, payload)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))
    }
}

#[async_trait]
impl SurveyStore for FileSurveyStore {
    async fn list_surveys(&self) -> Result<Vec<Survey>> {
        track_store_operation("list", self.backend(), self.read_record()).await
    }

    async fn append_survey(&self, survey: Survey) -> Result<()> {
        track_store_operation("append", self.backend(), async {
            let _guard = self.write_lock.lock().await;
            let mut surveys = self.read_record().await?;
            surveys.push(survey);
            self.write_record(&surveys).await
        })
        .await
    }

    async fn remove_survey(&self, id: Uuid) -> Result<bool> {
        track_store_operation("remove", self.backend(), async {
            let _guard = self.write_lock.lock().await;
            let mut surveys = self.read_record().await?;
            let before = surveys.len();
            surveys.retain(|survey| survey.id != id);
            if surveys.len() == before {
                return Ok(false);
            }
            self.write_record(&surveys).await?;
            Ok(true)
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.read_record().await.map(|_| ())
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}
