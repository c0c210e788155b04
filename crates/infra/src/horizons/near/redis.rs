use super::{Delivery, INearHorizonChannel};
use crate::horizons::redis::{Keys, RedisStore};
use reminder_scheduler_domain::{ReminderPayload, ID};

// Visibility is measured on the server clock so every instance agrees on it
const PUBLISH: &str = r#"
local time = redis.call('TIME')
local now = tonumber(time[1]) * 1000 + math.floor(tonumber(time[2]) / 1000)
redis.call('ZADD', KEYS[1], now + tonumber(ARGV[2]), ARGV[1])
redis.call('HSET', KEYS[2], ARGV[1], ARGV[3])
return 1
"#;

// Hides every handed out message for the visibility timeout and replies
// with a flat list of tag, payload pairs
const RECEIVE: &str = r#"
local time = redis.call('TIME')
local now = tonumber(time[1]) * 1000 + math.floor(tonumber(time[2]) / 1000)
local tags = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', now, 'LIMIT', 0, ARGV[1])
local received = {}
for _, tag in ipairs(tags) do
    local payload = redis.call('HGET', KEYS[2], tag)
    if payload then
        redis.call('ZADD', KEYS[1], now + tonumber(ARGV[2]), tag)
        table.insert(received, tag)
        table.insert(received, payload)
    else
        redis.call('ZREM', KEYS[1], tag)
    end
end
return received
"#;

const ACK: &str = r#"
redis.call('ZREM', KEYS[1], ARGV[1])
return redis.call('HDEL', KEYS[2], ARGV[1])
"#;

pub struct RedisNearHorizonChannel {
    redis: RedisStore,
    visibility_timeout: i64,
}

impl RedisNearHorizonChannel {
    pub fn new(redis: RedisStore, visibility_timeout: i64) -> Self {
        Self {
            redis,
            visibility_timeout,
        }
    }

    fn keys() -> Vec<String> {
        vec![Keys::near_queue(), Keys::near_messages()]
    }
}

fn parse_received(reply: Vec<String>) -> anyhow::Result<Vec<Delivery>> {
    reply
        .chunks(2)
        .map(|pair| match pair {
            [tag, payload] => Ok(Delivery {
                tag: tag.clone(),
                payload: serde_json::from_str(payload)?,
            }),
            _ => Err(anyhow::anyhow!("Uneven reply from the near horizon receive")),
        })
        .collect()
}

#[async_trait::async_trait]
impl INearHorizonChannel for RedisNearHorizonChannel {
    async fn publish(&self, payload: &ReminderPayload, delay: i64) -> anyhow::Result<()> {
        let _: i64 = self
            .redis
            .eval(
                PUBLISH,
                Self::keys(),
                vec![
                    ID::default().as_string(),
                    std::cmp::max(delay, 0).to_string(),
                    serde_json::to_string(payload)?,
                ],
            )
            .await?;
        Ok(())
    }

    async fn receive(&self, max: usize) -> anyhow::Result<Vec<Delivery>> {
        let reply: Vec<String> = self
            .redis
            .eval(
                RECEIVE,
                Self::keys(),
                vec![max.to_string(), self.visibility_timeout.to_string()],
            )
            .await?;
        parse_received(reply)
    }

    async fn ack(&self, delivery: &Delivery) -> anyhow::Result<()> {
        let _: i64 = self
            .redis
            .eval(ACK, Self::keys(), vec![delivery.tag.clone()])
            .await?;
        Ok(())
    }
}
