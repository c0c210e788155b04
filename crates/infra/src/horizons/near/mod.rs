mod inmemory;
mod redis;

pub use self::redis::RedisNearHorizonChannel;
pub use inmemory::InMemoryNearHorizonChannel;
use reminder_scheduler_domain::ReminderPayload;

/// A message handed out by the near horizon channel. It stays in the
/// channel until acknowledged and is handed out again once the
/// visibility timeout runs out.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub tag: String,
    pub payload: ReminderPayload,
}

/// Delay capable transport with at least once delivery
#[async_trait::async_trait]
pub trait INearHorizonChannel: Send + Sync {
    /// Makes the payload receivable no earlier than `delay` millis from now
    async fn publish(&self, payload: &ReminderPayload, delay: i64) -> anyhow::Result<()>;
    /// Up to `max` deliveries that are due. Never blocks waiting for more.
    async fn receive(&self, max: usize) -> anyhow::Result<Vec<Delivery>>;
    async fn ack(&self, delivery: &Delivery) -> anyhow::Result<()>;
}
