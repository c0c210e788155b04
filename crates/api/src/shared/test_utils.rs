use chrono::{TimeZone, Utc};
use reminder_scheduler_domain::{Reminder, ReminderPayload, Tz, ID};
use reminder_scheduler_infra::{
    Config, ConsumerConfig, Delivery, HorizonConfig, INearHorizonChannel,
    InMemoryMidHorizonStore, InMemoryNearHorizonChannel, InMemoryPushSender, ManualSys,
    ReminderContext,
};
use std::sync::Arc;

pub const SECOND: i64 = 1000;
pub const MINUTE: i64 = SECOND * 60;
pub const HOUR: i64 = MINUTE * 60;

/// Inmemory context on a manual clock with handles to the concrete stores
pub struct TestContext {
    pub ctx: ReminderContext,
    pub sys: Arc<ManualSys>,
    pub mid: Arc<InMemoryMidHorizonStore>,
    pub near: Arc<InMemoryNearHorizonChannel>,
    pub push: Arc<InMemoryPushSender>,
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        default_timezone: "UTC".into(),
        push_gateway_url: None,
        horizon: HorizonConfig {
            max_near_horizon_delay: 5 * MINUTE,
            max_mid_horizon_delay: 24 * HOUR,
            promotion_sweep_period: MINUTE,
            promotion_safety_margin: 5 * SECOND,
            promotion_sweep_batch_size: 3,
            cold_poll_period: 10 * MINUTE,
            cold_poll_batch_size: 3,
            tombstone_ttl: 10 * MINUTE,
        },
        consumer: ConsumerConfig {
            workers: 1,
            batch_size: 16,
            idle_interval: 500,
            visibility_timeout: MINUTE,
        },
    }
}

pub fn setup(now: i64) -> TestContext {
    let sys = Arc::new(ManualSys::new(now));
    let config = test_config();
    let mid = Arc::new(InMemoryMidHorizonStore::new(sys.clone()));
    let near = Arc::new(InMemoryNearHorizonChannel::new(
        sys.clone(),
        config.consumer.visibility_timeout,
    ));
    let push = Arc::new(InMemoryPushSender::new());

    let mut ctx = ReminderContext::create_inmemory_with(config, sys.clone());
    ctx.horizons.mid = mid.clone();
    ctx.horizons.near = near.clone();
    ctx.services.push = push.clone();

    TestContext {
        ctx,
        sys,
        mid,
        near,
        push,
    }
}

/// Millis of a UTC wall clock time
pub fn utc_millis(year: i32, month: u32, day: u32, hour: u32, min: u32) -> i64 {
    Utc.with_ymd_and_hms(year, month, day, hour, min, 0)
        .unwrap()
        .timestamp_millis()
}

pub fn resting_reminder(user_id: &str, cron: &str, next_execution: i64) -> Reminder {
    Reminder {
        id: ID::default(),
        user_id: user_id.into(),
        title: "Evening walk".into(),
        description: "Thirty minutes around the lake".into(),
        cron: cron.parse().unwrap(),
        timezone: Tz::UTC,
        is_recurring: true,
        next_execution,
        is_scheduled: false,
        created: 0,
    }
}

/// Near horizon channel whose transport is down
pub struct UnavailableNearChannel {}

#[async_trait::async_trait]
impl INearHorizonChannel for UnavailableNearChannel {
    async fn publish(&self, _: &ReminderPayload, _: i64) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("Channel down"))
    }

    async fn receive(&self, _: usize) -> anyhow::Result<Vec<Delivery>> {
        Err(anyhow::anyhow!("Channel down"))
    }

    async fn ack(&self, _: &Delivery) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("Channel down"))
    }
}
