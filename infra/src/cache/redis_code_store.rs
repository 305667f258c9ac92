//! Redis-backed `CodeStore`
//!
//! One key per subject and purpose holding the JSON record. Keys expire on
//! their own once the record is past expiry plus the grace period, so the
//! sweeper has nothing to do for this backend.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use redis::Script;
use tracing::debug;
use uuid::Uuid;

use pv_core::domain::entities::verification_record::{Purpose, VerificationRecord};
use pv_core::errors::DomainResult;
use pv_core::repositories::CodeStore;

use super::redis_client::RedisClient;
use crate::config::CacheConfig;
use crate::InfrastructureError;

/// Marks the stored record consumed if it is still the expected, unconsumed one
static CONSUME_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
local raw = redis.call('GET', KEYS[1])
if not raw then
    return 0
end
local record = cjson.decode(raw)
if record.id ~= ARGV[1] or record.consumed then
    return 0
end
record.consumed = true
redis.call('SET', KEYS[1], cjson.encode(record), 'KEEPTTL')
return 1
"#,
    )
});

/// Code store keeping one JSON record per key in Redis
#[derive(Clone)]
pub struct RedisCodeStore {
    client: RedisClient,
    config: CacheConfig,
    grace_period: Duration,
}

impl RedisCodeStore {
    pub fn new(client: RedisClient, config: CacheConfig, grace_period: Duration) -> Self {
        Self {
            client,
            config,
            grace_period,
        }
    }

    /// Connect to Redis and build the store
    pub async fn connect(
        config: &CacheConfig,
        grace_period: Duration,
    ) -> Result<Self, InfrastructureError> {
        let client = RedisClient::new(config).await?;
        if !client.health_check().await? {
            return Err(InfrastructureError::Config(
                "Redis did not answer PING".to_string(),
            ));
        }
        Ok(Self::new(client, config.clone(), grace_period))
    }

    /// Key holding the record for `subject` and `purpose`
    pub fn key(&self, subject: &str, purpose: Purpose) -> String {
        record_key(&self.config, subject, purpose)
    }
}

fn record_key(config: &CacheConfig, subject: &str, purpose: Purpose) -> String {
    config.make_key(&format!("verification:{}:{}", purpose.as_str(), subject))
}

/// Seconds the key should live: remaining validity plus grace, at least one
fn key_ttl_seconds(record: &VerificationRecord, grace_period: Duration, now: DateTime<Utc>) -> u64 {
    let remaining = record.expires_at + grace_period - now;
    remaining.num_seconds().max(1) as u64
}

#[async_trait]
impl CodeStore for RedisCodeStore {
    async fn put(&self, subject: &str, purpose: Purpose, record: VerificationRecord) -> DomainResult<()> {
        let key = self.key(subject, purpose);
        let value = serde_json::to_string(&record).map_err(InfrastructureError::from)?;
        let expiry = key_ttl_seconds(&record, self.grace_period, Utc::now());
        self.client.set_with_expiry(&key, &value, expiry).await?;
        Ok(())
    }

    async fn get(&self, subject: &str, purpose: Purpose) -> DomainResult<Option<VerificationRecord>> {
        let key = self.key(subject, purpose);
        match self.client.get(&key).await? {
            Some(raw) => {
                let record = serde_json::from_str(&raw).map_err(InfrastructureError::from)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, subject: &str, purpose: Purpose) -> DomainResult<()> {
        let key = self.key(subject, purpose);
        self.client.delete(&key).await?;
        Ok(())
    }

    async fn mark_consumed(&self, subject: &str, purpose: Purpose, record_id: Uuid) -> DomainResult<bool> {
        let key = self.key(subject, purpose);
        let swapped: i64 = self
            .client
            .eval_script(&CONSUME_SCRIPT, &[key], &[record_id.to_string()])
            .await?;
        Ok(swapped == 1)
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> DomainResult<usize> {
        debug!(cutoff = %cutoff, "Redis expires verification keys itself");
        Ok(0)
    }
}
