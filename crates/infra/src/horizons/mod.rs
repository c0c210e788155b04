mod mid;
mod near;
mod redis;

pub use self::redis::RedisStore;
pub use mid::{IMidHorizonStore, InMemoryMidHorizonStore, RedisMidHorizonStore};
pub use near::{Delivery, INearHorizonChannel, InMemoryNearHorizonChannel, RedisNearHorizonChannel};
use crate::system::ISys;
use crate::Config;
use std::sync::Arc;

#[derive(Clone)]
pub struct Horizons {
    pub mid: Arc<dyn IMidHorizonStore>,
    pub near: Arc<dyn INearHorizonChannel>,
}

impl Horizons {
    pub async fn create_redis(connection_string: &str, config: &Config) -> anyhow::Result<Self> {
        let redis = RedisStore::from_url(connection_string, config.consumer.workers + 4).await?;
        Ok(Self {
            mid: Arc::new(RedisMidHorizonStore::new(redis.clone())),
            near: Arc::new(RedisNearHorizonChannel::new(
                redis,
                config.consumer.visibility_timeout,
            )),
        })
    }

    pub fn create_inmemory(sys: Arc<dyn ISys>, config: &Config) -> Self {
        Self {
            mid: Arc::new(InMemoryMidHorizonStore::new(sys.clone())),
            near: Arc::new(InMemoryNearHorizonChannel::new(
                sys,
                config.consumer.visibility_timeout,
            )),
        }
    }
}
