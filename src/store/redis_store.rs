//! Redis-backed coordination store.
//!
//! # Responsibilities
//! - Hand out pooled connections, PING-verified before reuse
//! - Close idle connections beyond `max_idle` or older than the idle timeout
//! - Translate `Command`s into Redis commands and MULTI/EXEC pipelines
//! - Open dedicated pub/sub connections

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, PoolConfig, PoolError, Runtime};
use futures_util::{Stream, StreamExt};
use redis::{Cmd, Msg, Value};
use tokio::task::JoinHandle;
use url::Url;

use crate::config::StoreConfig;
use crate::store::{Command, CoordinationStore, Reply, StoreError, StoreResult, Subscription};

/// How often idle connections are inspected.
const REAP_INTERVAL: Duration = Duration::from_secs(30);

impl From<PoolError> for StoreError {
    fn from(e: PoolError) -> Self {
        match e {
            PoolError::Backend(e) => e.into(),
            other => StoreError::Pool(other.to_string()),
        }
    }
}

/// Coordination store talking to a Redis server.
pub struct RedisStore {
    pool: Pool,
    /// Pub/sub needs a connection of its own, outside the pool.
    client: redis::Client,
    reaper: JoinHandle<()>,
}

impl RedisStore {
    /// Build the pool and verify the server is reachable.
    ///
    /// Dial and AUTH failures surface here so they are fatal at startup.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let url = connection_url(config)?;
        let client = redis::Client::open(url.as_str())?;

        let mut pool_config = Config::from_url(url.as_str());
        pool_config.pool = Some(PoolConfig::new(config.max_connections));
        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::Pool(e.to_string()))?;

        let mut conn = pool.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        drop(conn);

        let reaper = tokio::spawn(reap_idle(
            pool.clone(),
            config.max_idle,
            Duration::from_secs(config.idle_timeout_secs),
        ));

        tracing::info!(
            address = %config.address,
            max_idle = config.max_idle,
            max_connections = config.max_connections,
            "Connected to coordination store"
        );

        Ok(Self { pool, client, reaper })
    }
}

impl Drop for RedisStore {
    fn drop(&mut self) {
        self.reaper.abort();
    }
}

#[async_trait]
impl CoordinationStore for RedisStore {
    async fn execute(&self, command: Command) -> StoreResult<Reply> {
        let mut conn = self.pool.get().await?;
        let value: Value = to_cmd(&command).query_async(&mut conn).await?;
        reply_from_value(value)
    }

    async fn transaction(&self, commands: Vec<Command>) -> StoreResult<Vec<Reply>> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in &commands {
            pipe.add_command(to_cmd(command));
        }

        let mut conn = self.pool.get().await?;
        let values: Vec<Value> = pipe.query_async(&mut conn).await?;
        values.into_iter().map(reply_from_value).collect()
    }

    async fn publish(&self, channel: &str, message: &str) -> StoreResult<usize> {
        let mut conn = self.pool.get().await?;
        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(channel)
            .arg(message)
            .query_async(&mut conn)
            .await?;
        Ok(receivers.max(0) as usize)
    }

    async fn subscribe(&self, channel: &str) -> StoreResult<Box<dyn Subscription>> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(channel).await?;
        Ok(Box::new(RedisSubscription {
            channel: channel.to_string(),
            messages: Box::pin(pubsub.into_on_message()),
        }))
    }
}

struct RedisSubscription {
    channel: String,
    messages: Pin<Box<dyn Stream<Item = Msg> + Send>>,
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn next_message(&mut self) -> StoreResult<String> {
        match self.messages.next().await {
            Some(msg) => Ok(String::from_utf8_lossy(msg.get_payload_bytes()).into_owned()),
            None => Err(StoreError::SubscriptionClosed(self.channel.clone())),
        }
    }
}

/// Build `redis://[:secret@]host:port` from the configuration.
fn connection_url(config: &StoreConfig) -> StoreResult<Url> {
    let mut url = Url::parse(&format!("redis://{}", config.address))
        .map_err(|e| StoreError::InvalidAddress(format!("{}: {}", config.address, e)))?;

    if !config.password.is_empty() {
        url.set_password(Some(&config.password))
            .map_err(|_| StoreError::InvalidAddress(config.address.clone()))?;
    }

    Ok(url)
}

fn to_cmd(command: &Command) -> Cmd {
    match command {
        Command::HSetNx { key, field, value } => {
            redis::cmd("HSETNX").arg(key).arg(field).arg(value).clone()
        }
        Command::HSet { key, field, value } => {
            redis::cmd("HSET").arg(key).arg(field).arg(value).clone()
        }
        Command::HExists { key, field } => redis::cmd("HEXISTS").arg(key).arg(field).clone(),
        Command::HGet { key, field } => redis::cmd("HGET").arg(key).arg(field).clone(),
        Command::HDel { key, fields } => redis::cmd("HDEL").arg(key).arg(fields).clone(),
        Command::Del { key } => redis::cmd("DEL").arg(key).clone(),
        Command::SAdd { key, member } => redis::cmd("SADD").arg(key).arg(member).clone(),
        Command::SRem { key, member } => redis::cmd("SREM").arg(key).arg(member).clone(),
        Command::Expire { key, seconds } => redis::cmd("EXPIRE").arg(key).arg(*seconds).clone(),
        Command::LIndex { key, index } => redis::cmd("LINDEX").arg(key).arg(*index).clone(),
        Command::RPush { key, values } => redis::cmd("RPUSH").arg(key).arg(values).clone(),
        Command::Set { key, value } => redis::cmd("SET").arg(key).arg(value).clone(),
    }
}

fn reply_from_value(value: Value) -> StoreResult<Reply> {
    match value {
        Value::Nil => Ok(Reply::Nil),
        Value::Okay => Ok(Reply::Ok),
        Value::Int(n) => Ok(Reply::Int(n)),
        Value::Boolean(b) => Ok(Reply::Int(i64::from(b))),
        Value::SimpleString(s) => Ok(Reply::Data(s)),
        Value::BulkString(bytes) => String::from_utf8(bytes)
            .map(Reply::Data)
            .map_err(|e| StoreError::UnexpectedReply(e.to_string())),
        other => Err(StoreError::UnexpectedReply(format!("{:?}", other))),
    }
}

/// Close idle connections: anything unused for longer than `idle_timeout`,
/// and everything beyond the first `max_idle`.
async fn reap_idle(pool: Pool, max_idle: usize, idle_timeout: Duration) {
    let mut ticker = tokio::time::interval(REAP_INTERVAL);
    loop {
        ticker.tick().await;
        let mut kept = 0;
        let _ = pool.retain(|_, metrics| {
            if kept >= max_idle || metrics.last_used() > idle_timeout {
                return false;
            }
            kept += 1;
            true
        });
        tracing::trace!(idle = kept, "Reaped idle store connections");
    }
}
