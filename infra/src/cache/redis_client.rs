//! Redis cache client implementation
//!
//! Wraps a multiplexed connection with connection retry and the handful of
//! commands the code store needs: set with expiry, get, delete and Lua script
//! evaluation. Commands run exactly once; failures surface to the caller.

use redis::{aio::MultiplexedConnection, AsyncCommands, Client, FromRedisValue, RedisResult, Script};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::CacheConfig;
use crate::InfrastructureError;

/// Cap on the delay between connection attempts
const MAX_RETRY_DELAY_MS: u64 = 5000;

/// Redis client with connection retry logic
///
/// Cloning is cheap; clones share the multiplexed connection.
#[derive(Clone)]
pub struct RedisClient {
    /// Redis multiplexed connection for async operations
    connection: MultiplexedConnection,
}

impl RedisClient {
    /// Connect using the retry policy from `config`
    ///
    /// # Returns
    /// * `Ok(RedisClient)` - Connected client
    /// * `Err(InfrastructureError::Config)` - The URL does not parse
    /// * `Err(InfrastructureError::Cache)` - No connection after all retries
    pub async fn new(config: &CacheConfig) -> Result<Self, InfrastructureError> {
        let max_retries = config.connect_retries.max(1);
        let retry_delay_ms = config.retry_delay_ms;

        info!("Creating Redis client with URL: {}", mask_url(&config.url));

        let client = Client::open(config.url.as_str()).map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let connection =
            Self::create_connection_with_retry(client, max_retries, retry_delay_ms).await?;

        info!("Redis client created successfully");

        Ok(Self { connection })
    }

    async fn create_connection_with_retry(
        client: Client,
        max_retries: u32,
        retry_delay_ms: u64,
    ) -> Result<MultiplexedConnection, InfrastructureError> {
        let mut attempts = 0;
        let mut delay = retry_delay_ms;

        loop {
            attempts += 1;
            debug!("Attempting to connect to Redis (attempt {})", attempts);

            match client.get_multiplexed_async_connection().await {
                Ok(connection) => {
                    info!("Successfully connected to Redis");
                    return Ok(connection);
                }
                Err(e) if attempts < max_retries => {
                    warn!(
                        "Failed to connect to Redis (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, max_retries, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY_MS);
                }
                Err(e) => {
                    error!("Failed to connect to Redis after {} attempts: {}", attempts, e);
                    return Err(InfrastructureError::Cache(e));
                }
            }
        }
    }

    /// Set a value that expires after `expiry_seconds`
    pub async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), InfrastructureError> {
        let mut conn = self.connection.clone();
        run_command("SET", || async move {
            conn.set_ex::<_, _, ()>(key, value, expiry_seconds).await
        })
        .await
    }

    /// Get a value; `None` when the key is missing or expired
    pub async fn get(&self, key: &str) -> Result<Option<String>, InfrastructureError> {
        let mut conn = self.connection.clone();
        run_command("GET", || async move { conn.get::<_, Option<String>>(key).await }).await
    }

    /// Delete a key
    ///
    /// # Returns
    /// * `Ok(true)` - The key existed and was removed
    /// * `Ok(false)` - The key was not present
    pub async fn delete(&self, key: &str) -> Result<bool, InfrastructureError> {
        let mut conn = self.connection.clone();
        let deleted: u32 = run_command("DEL", || async move { conn.del(key).await }).await?;
        Ok(deleted > 0)
    }

    /// Run a Lua script atomically on the server
    pub async fn eval_script<T>(
        &self,
        script: &Script,
        keys: &[String],
        args: &[String],
    ) -> Result<T, InfrastructureError>
    where
        T: FromRedisValue,
    {
        let mut conn = self.connection.clone();
        let mut invocation = script.prepare_invoke();
        for key in keys {
            invocation.key(key);
        }
        for arg in args {
            invocation.arg(arg);
        }
        run_command("EVALSHA", || async move {
            invocation.invoke_async::<_, T>(&mut conn).await
        })
        .await
    }

    /// PING the server
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let mut conn = self.connection.clone();
        let response: String = run_command("PING", || async move {
            redis::cmd("PING").query_async(&mut conn).await
        })
        .await?;

        if response != "PONG" {
            warn!("Redis health check returned unexpected response: {}", response);
        }
        Ok(response == "PONG")
    }
}

/// Issue a command exactly once, mapping failure to `InfrastructureError::Cache`
pub(crate) async fn run_command<T, F, Fut>(
    command: &'static str,
    operation: F,
) -> Result<T, InfrastructureError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = RedisResult<T>>,
{
    debug!(command = command, "Running Redis command");
    operation().await.map_err(|e| {
        error!(command = command, error = %e, "Redis command failed");
        InfrastructureError::Cache(e)
    })
}

/// Hide credentials in a Redis URL
pub(crate) fn mask_url(url: &str) -> String {
    if let (Some(at_pos), Some(proto_end)) = (url.find('@'), url.find("://")) {
        if at_pos > proto_end {
            return format!("{}****{}", &url[..proto_end + 3], &url[at_pos..]);
        }
    }
    url.to_string()
}
