//! Redis connection shared by the mid horizon store and the near horizon
//! channel. Every mutation goes through a Lua script so it is applied
//! atomically no matter how many instances talk to the same server.

use fred::{
    interfaces::*,
    prelude::*,
    types::{ReconnectPolicy, RedisConfig as FredRedisConfig},
};
use std::sync::Arc;

const PREFIX: &str = "reminders";

/// Redis key naming
pub struct Keys;

impl Keys {
    /// Mid horizon index (ZSet), member = reminder id, score = due millis
    pub fn mid_index() -> String {
        format!("{}:mid:index", PREFIX)
    }

    /// Mid horizon side table (Hash), reminder id -> payload json
    pub fn mid_payloads() -> String {
        format!("{}:mid:payloads", PREFIX)
    }

    /// Cancellation marker of a single reminder (String with PX expiry)
    pub fn tombstone(reminder_id: &str) -> String {
        format!("{}:tombstone:{}", PREFIX, reminder_id)
    }

    /// Near horizon messages (ZSet), member = delivery tag, score = millis
    /// at which the message becomes visible to consumers
    pub fn near_queue() -> String {
        format!("{}:near:queue", PREFIX)
    }

    /// Near horizon message bodies (Hash), delivery tag -> payload json
    pub fn near_messages() -> String {
        format!("{}:near:messages", PREFIX)
    }
}

#[derive(Clone)]
pub struct RedisStore {
    pool: Arc<RedisPool>,
}

impl RedisStore {
    pub async fn from_url(url: &str, pool_size: usize) -> anyhow::Result<Self> {
        let redis_config = FredRedisConfig::from_url(url)?;
        let pool = RedisPool::new(
            redis_config,
            None,
            None,
            Some(ReconnectPolicy::default()),
            pool_size,
        )?;

        pool.init().await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub async fn eval<R: FromRedis>(
        &self,
        script: &'static str,
        keys: Vec<String>,
        args: Vec<String>,
    ) -> anyhow::Result<R> {
        let result: R = self.pool.next().eval(script, keys, args).await?;
        Ok(result)
    }

    /// Server clock in millis, shared by every instance
    pub async fn now_millis(&self) -> anyhow::Result<i64> {
        let time: Vec<String> = self
            .eval("return redis.call('TIME')", vec![], vec![])
            .await?;
        parse_time(&time)
    }
}

fn parse_time(time: &[String]) -> anyhow::Result<i64> {
    match time {
        [seconds, micros] => Ok(seconds.parse::<i64>()? * 1000 + micros.parse::<i64>()? / 1000),
        _ => Err(anyhow::anyhow!("Unexpected reply to TIME: {:?}", time)),
    }
}
