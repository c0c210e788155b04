use super::IMidHorizonStore;
use crate::horizons::redis::{Keys, RedisStore};
use reminder_scheduler_domain::{ReminderPayload, ID};
use tracing::warn;

// A cancelled reminder is never indexed again while its tombstone lives
const INSERT: &str = r#"
if redis.call('EXISTS', KEYS[3]) == 1 then
    return 0
end
redis.call('ZADD', KEYS[1], ARGV[2], ARGV[1])
redis.call('HSET', KEYS[2], ARGV[1], ARGV[3])
return 1
"#;

// Replies with the number of entries dropped for a missing payload,
// followed by a flat list of due, payload pairs
const CLAIM_DUE: &str = r#"
local entries = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1], 'WITHSCORES', 'LIMIT', 0, ARGV[2])
local claimed = {'0'}
local dropped = 0
for i = 1, #entries, 2 do
    local id = entries[i]
    redis.call('ZREM', KEYS[1], id)
    local payload = redis.call('HGET', KEYS[2], id)
    if payload then
        table.insert(claimed, entries[i + 1])
        table.insert(claimed, payload)
    else
        dropped = dropped + 1
    end
end
claimed[1] = tostring(dropped)
return claimed
"#;

const FORGET_PAYLOAD: &str = r#"
if redis.call('ZSCORE', KEYS[1], ARGV[1]) then
    return 0
end
return redis.call('HDEL', KEYS[2], ARGV[1])
"#;

const REMOVE: &str = r#"
local removed = redis.call('ZREM', KEYS[1], ARGV[1])
if removed == 1 then
    redis.call('HDEL', KEYS[2], ARGV[1])
end
return removed
"#;

const SET_TOMBSTONE: &str = r#"
if redis.call('SET', KEYS[1], '1', 'PX', ARGV[1], 'NX') then
    return 1
end
return 0
"#;

const TAKE_TOMBSTONE: &str = r#"
return redis.call('DEL', KEYS[1])
"#;

pub struct RedisMidHorizonStore {
    redis: RedisStore,
}

impl RedisMidHorizonStore {
    pub fn new(redis: RedisStore) -> Self {
        Self { redis }
    }

    fn keys() -> Vec<String> {
        vec![Keys::mid_index(), Keys::mid_payloads()]
    }
}

struct ClaimReply {
    claimed: Vec<(ReminderPayload, i64)>,
    dropped: usize,
}

fn parse_claimed(reply: Vec<String>) -> anyhow::Result<ClaimReply> {
    let (dropped, entries) = reply
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("Empty reply from the mid horizon claim"))?;
    let dropped = dropped.parse::<usize>()?;
    let claimed = entries
        .chunks(2)
        .map(|pair| match pair {
            [due_at, payload] => {
                // Scores come back as their float representation
                let due_at = due_at.parse::<f64>()? as i64;
                let payload = serde_json::from_str::<ReminderPayload>(payload)?;
                Ok((payload, due_at))
            }
            _ => Err(anyhow::anyhow!("Uneven reply from the mid horizon claim")),
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(ClaimReply { claimed, dropped })
}

#[async_trait::async_trait]
impl IMidHorizonStore for RedisMidHorizonStore {
    async fn now_millis(&self) -> anyhow::Result<i64> {
        self.redis.now_millis().await
    }

    async fn insert(&self, payload: &ReminderPayload, due_at: i64) -> anyhow::Result<bool> {
        let mut keys = Self::keys();
        keys.push(Keys::tombstone(&payload.id.as_string()));
        let indexed: i64 = self
            .redis
            .eval(
                INSERT,
                keys,
                vec![
                    payload.id.as_string(),
                    due_at.to_string(),
                    serde_json::to_string(payload)?,
                ],
            )
            .await?;
        Ok(indexed == 1)
    }

    async fn claim_due(
        &self,
        until: i64,
        limit: usize,
    ) -> anyhow::Result<Vec<(ReminderPayload, i64)>> {
        let reply: Vec<String> = self
            .redis
            .eval(
                CLAIM_DUE,
                Self::keys(),
                vec![until.to_string(), limit.to_string()],
            )
            .await?;
        let ClaimReply { claimed, dropped } = parse_claimed(reply)?;
        if dropped > 0 {
            warn!("Dropped {} mid horizon entries without a payload", dropped);
        }
        Ok(claimed)
    }

    async fn restore(&self, payload: &ReminderPayload, due_at: i64) -> anyhow::Result<()> {
        self.insert(payload, due_at).await.map(|_| ())
    }

    async fn forget_payload(&self, reminder_id: &ID) -> anyhow::Result<()> {
        let _: i64 = self
            .redis
            .eval(FORGET_PAYLOAD, Self::keys(), vec![reminder_id.as_string()])
            .await?;
        Ok(())
    }

    async fn remove(&self, reminder_id: &ID) -> anyhow::Result<bool> {
        let removed: i64 = self
            .redis
            .eval(REMOVE, Self::keys(), vec![reminder_id.as_string()])
            .await?;
        Ok(removed == 1)
    }

    async fn set_tombstone(&self, reminder_id: &ID, ttl: i64) -> anyhow::Result<bool> {
        let created: i64 = self
            .redis
            .eval(
                SET_TOMBSTONE,
                vec![Keys::tombstone(&reminder_id.as_string())],
                vec![ttl.to_string()],
            )
            .await?;
        Ok(created == 1)
    }

    async fn take_tombstone(&self, reminder_id: &ID) -> anyhow::Result<bool> {
        let deleted: i64 = self
            .redis
            .eval(
                TAKE_TOMBSTONE,
                vec![Keys::tombstone(&reminder_id.as_string())],
                vec![],
            )
            .await?;
        Ok(deleted == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_claim_reply() {
        let payload = ReminderPayload {
            id: ID::default(),
            user_id: "user-1".into(),
            title: "Call mom".into(),
            description: "Sunday call".into(),
            cron: "0 0 18 * * SUN".parse().unwrap(),
            timezone: chrono_tz::Europe::Oslo,
            is_recurring: true,
            due_at: 1_700_000_000_000,
        };
        let reply = vec![
            "2".to_string(),
            "1700000000000".to_string(),
            serde_json::to_string(&payload).unwrap(),
        ];
        let parsed = parse_claimed(reply).unwrap();
        assert_eq!(parsed.claimed, vec![(payload, 1_700_000_000_000)]);
        assert_eq!(parsed.dropped, 2);

        let empty = parse_claimed(vec!["0".into()]).unwrap();
        assert!(empty.claimed.is_empty());
        assert_eq!(empty.dropped, 0);

        assert!(parse_claimed(vec!["0".into(), "1".into()]).is_err());
        assert!(parse_claimed(vec![]).is_err());
    }
}
