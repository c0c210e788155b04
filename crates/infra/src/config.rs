use reminder_scheduler_domain::HorizonPolicy;
use thiserror::Error;
use tracing::{info, warn};

const SECOND: i64 = 1000;
const MINUTE: i64 = SECOND * 60;
const HOUR: i64 = MINUTE * 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// Timezone used for `Reminder`s created without one
    pub default_timezone: String,
    /// Base url of the multicast push gateway. Notifications are only
    /// recorded in memory when this is not set.
    pub push_gateway_url: Option<String>,
    pub horizon: HorizonConfig,
    pub consumer: ConsumerConfig,
}

/// Thresholds and periods of the tiered scheduler. All values are millis.
#[derive(Debug, Clone)]
pub struct HorizonConfig {
    /// Longest delay handed to the near horizon channel
    pub max_near_horizon_delay: i64,
    /// Farthest ahead a `Reminder` is buffered in the mid horizon store.
    /// Anything beyond rests in the database.
    pub max_mid_horizon_delay: i64,
    /// How often the mid horizon store is swept for items entering the
    /// near horizon
    pub promotion_sweep_period: i64,
    /// Extra lookahead of every sweep to absorb the sweeper's own latency
    pub promotion_safety_margin: i64,
    /// Max number of entries claimed per round trip during a sweep
    pub promotion_sweep_batch_size: usize,
    /// How often the database is polled for items entering the mid horizon
    pub cold_poll_period: i64,
    /// Max number of rows claimed per poll
    pub cold_poll_batch_size: usize,
    /// How long a cancellation tombstone lives. Must outlive any message in
    /// flight in the near horizon channel.
    pub tombstone_ttl: i64,
}

#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Number of concurrent delivery workers per instance
    pub workers: usize,
    /// Max deliveries received per poll of the near horizon channel
    pub batch_size: usize,
    /// Pause between polls when the channel had nothing due
    pub idle_interval: i64,
    /// How long a received but unacknowledged delivery stays invisible
    /// before it is handed out again
    pub visibility_timeout: i64,
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("`{0}` must be a positive duration")]
    NotPositive(&'static str),
    #[error("The promotion sweep period plus its safety margin ({0} ms) must not exceed the max near horizon delay ({1} ms)")]
    SweepExceedsNearHorizon(i64, i64),
    #[error("The max near horizon delay ({0} ms) must be below the max mid horizon delay ({1} ms)")]
    NearHorizonNotBelowMid(i64, i64),
    #[error("The cold poll period ({0} ms) must not exceed the max mid horizon delay ({1} ms)")]
    PollExceedsMidHorizon(i64, i64),
}

fn env_value<T: std::str::FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(value) => match value.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {}.",
                    name, value, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

impl HorizonConfig {
    pub fn new() -> Self {
        let max_near_horizon_delay = env_value("MAX_NEAR_HORIZON_DELAY_MILLIS", 5 * MINUTE);
        let tombstone_floor = 2 * max_near_horizon_delay;
        let mut tombstone_ttl = env_value("TOMBSTONE_TTL_MILLIS", tombstone_floor);
        if tombstone_ttl < tombstone_floor {
            warn!(
                "TOMBSTONE_TTL_MILLIS: {} is shorter than twice the max near horizon delay, a cancelled reminder could still be delivered. Using {} instead.",
                tombstone_ttl, tombstone_floor
            );
            tombstone_ttl = tombstone_floor;
        }

        Self {
            max_near_horizon_delay,
            max_mid_horizon_delay: env_value("MAX_MID_HORIZON_DELAY_MILLIS", 24 * HOUR),
            promotion_sweep_period: env_value("PROMOTION_SWEEP_PERIOD_MILLIS", MINUTE),
            promotion_safety_margin: env_value("PROMOTION_SAFETY_MARGIN_MILLIS", 5 * SECOND),
            promotion_sweep_batch_size: env_value("PROMOTION_SWEEP_BATCH_SIZE", 500),
            cold_poll_period: env_value("COLD_POLL_PERIOD_MILLIS", 10 * MINUTE),
            cold_poll_batch_size: env_value("COLD_POLL_BATCH_SIZE", 500),
            tombstone_ttl,
        }
    }

    pub fn policy(&self) -> HorizonPolicy {
        HorizonPolicy::new(self.max_near_horizon_delay, self.max_mid_horizon_delay)
    }

    /// Checks the deployment invariants the tiers rely on to never let an
    /// item wait past its entry point into the next tier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("max_near_horizon_delay", self.max_near_horizon_delay),
            ("max_mid_horizon_delay", self.max_mid_horizon_delay),
            ("promotion_sweep_period", self.promotion_sweep_period),
            ("cold_poll_period", self.cold_poll_period),
            ("tombstone_ttl", self.tombstone_ttl),
        ];
        for (name, value) in durations.iter() {
            if *value <= 0 {
                return Err(ConfigError::NotPositive(name));
            }
        }
        if self.promotion_safety_margin < 0 {
            return Err(ConfigError::NotPositive("promotion_safety_margin"));
        }

        let sweep_lookahead = self.promotion_sweep_period + self.promotion_safety_margin;
        if sweep_lookahead > self.max_near_horizon_delay {
            return Err(ConfigError::SweepExceedsNearHorizon(
                sweep_lookahead,
                self.max_near_horizon_delay,
            ));
        }
        if self.max_near_horizon_delay >= self.max_mid_horizon_delay {
            return Err(ConfigError::NearHorizonNotBelowMid(
                self.max_near_horizon_delay,
                self.max_mid_horizon_delay,
            ));
        }
        if self.cold_poll_period > self.max_mid_horizon_delay {
            return Err(ConfigError::PollExceedsMidHorizon(
                self.cold_poll_period,
                self.max_mid_horizon_delay,
            ));
        }
        Ok(())
    }
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsumerConfig {
    pub fn new() -> Self {
        Self {
            workers: env_value("CONSUMER_WORKERS", 4),
            batch_size: env_value("CONSUMER_BATCH_SIZE", 16),
            idle_interval: env_value("CONSUMER_IDLE_INTERVAL_MILLIS", 500),
            visibility_timeout: env_value("NEAR_VISIBILITY_TIMEOUT_MILLIS", MINUTE),
        }
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        let default_timezone = match std::env::var("DEFAULT_TIMEZONE") {
            Ok(tz) => tz,
            Err(_) => {
                info!("Did not find DEFAULT_TIMEZONE environment variable. Going to use UTC.");
                "UTC".into()
            }
        };

        let push_gateway_url = std::env::var("PUSH_GATEWAY_URL").ok();
        if push_gateway_url.is_none() {
            warn!("Did not find PUSH_GATEWAY_URL environment variable. Push notifications will not leave this process.");
        }

        Self {
            port: env_value("PORT", 5000),
            default_timezone,
            push_gateway_url,
            horizon: HorizonConfig::new(),
            consumer: ConsumerConfig::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.horizon.validate()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizon() -> HorizonConfig {
        HorizonConfig {
            max_near_horizon_delay: 5 * MINUTE,
            max_mid_horizon_delay: 24 * HOUR,
            promotion_sweep_period: MINUTE,
            promotion_safety_margin: 5 * SECOND,
            promotion_sweep_batch_size: 100,
            cold_poll_period: 10 * MINUTE,
            cold_poll_batch_size: 100,
            tombstone_ttl: 10 * MINUTE,
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert_eq!(horizon().validate(), Ok(()));
        assert_eq!(Config::new().validate(), Ok(()));
    }

    #[test]
    fn default_tombstone_outlives_near_horizon() {
        let config = HorizonConfig::new();
        assert!(config.tombstone_ttl >= 2 * config.max_near_horizon_delay);
    }

    #[test]
    fn rejects_sweep_slower_than_near_horizon() {
        let mut config = horizon();
        config.promotion_sweep_period = 5 * MINUTE;
        assert_eq!(
            config.validate(),
            Err(ConfigError::SweepExceedsNearHorizon(
                5 * MINUTE + 5 * SECOND,
                5 * MINUTE
            ))
        );
    }

    #[test]
    fn rejects_poll_slower_than_mid_horizon() {
        let mut config = horizon();
        config.cold_poll_period = 25 * HOUR;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PollExceedsMidHorizon(_, _))
        ));
    }

    #[test]
    fn rejects_overlapping_horizons() {
        let mut config = horizon();
        config.max_mid_horizon_delay = config.max_near_horizon_delay;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NearHorizonNotBelowMid(_, _))
        ));
    }

    #[test]
    fn rejects_non_positive_periods() {
        let mut config = horizon();
        config.promotion_sweep_period = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive("promotion_sweep_period"))
        );
    }
}
