mod config;
mod horizons;
mod repos;
mod services;
mod system;

pub use config::{Config, ConfigError, ConsumerConfig, HorizonConfig};
pub use horizons::{
    Delivery, Horizons, IMidHorizonStore, INearHorizonChannel, InMemoryMidHorizonStore,
    InMemoryNearHorizonChannel,
};
pub use repos::{IDeliveryTargetRepo, IReminderRepo, Repos};
pub use services::*;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use system::{ISys, ManualSys, RealSys};
use tracing::info;

#[derive(Clone)]
pub struct ReminderContext {
    pub repos: Repos,
    pub horizons: Horizons,
    pub services: Services,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
}

struct ContextParams {
    pub postgres_connection_string: String,
    pub redis_connection_string: String,
}

impl ReminderContext {
    pub fn create_inmemory() -> Self {
        Self::create_inmemory_with(Config::new(), Arc::new(RealSys {}))
    }

    /// Inmemory infrastructure where every component reads time from `sys`
    pub fn create_inmemory_with(config: Config, sys: Arc<dyn ISys>) -> Self {
        Self {
            repos: Repos::create_inmemory(),
            horizons: Horizons::create_inmemory(sys.clone(), &config),
            services: Services::create_inmemory(),
            config,
            sys,
        }
    }

    async fn create(params: ContextParams, config: Config) -> Self {
        let repos = Repos::create_postgres(&params.postgres_connection_string)
            .await
            .expect("Postgres credentials must be set and valid");
        let horizons = Horizons::create_redis(&params.redis_connection_string, &config)
            .await
            .expect("Redis url must be set and valid");
        Self {
            repos,
            horizons,
            services: Services::create(config.push_gateway_url.as_deref()),
            config,
            sys: Arc::new(RealSys {}),
        }
    }
}

const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";
const REDIS_CONNECTION_STRING: &str = "REDIS_URL";

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> ReminderContext {
    let config = Config::new();
    config
        .validate()
        .unwrap_or_else(|e| panic!("Invalid scheduler configuration: {}", e));

    let args: Vec<_> = std::env::args().collect();

    // cargo run inmemory
    let inmemory_arg_set = args.len() > 1 && args[1].eq("inmemory");
    if inmemory_arg_set {
        info!("Inmemory argument provided. Going to use inmemory infra.");
        return ReminderContext::create_inmemory_with(config, Arc::new(RealSys {}));
    }

    match (
        std::env::var(PSQL_CONNECTION_STRING),
        std::env::var(REDIS_CONNECTION_STRING),
    ) {
        (Ok(postgres_connection_string), Ok(redis_connection_string)) => {
            info!(
                "{} and {} env vars was provided. Going to use postgres and redis.",
                PSQL_CONNECTION_STRING, REDIS_CONNECTION_STRING
            );
            ReminderContext::create(
                ContextParams {
                    postgres_connection_string,
                    redis_connection_string,
                },
                config,
            )
            .await
        }
        _ => {
            info!(
                "{} and {} env vars was not provided. Going to use inmemory infra.",
                PSQL_CONNECTION_STRING, REDIS_CONNECTION_STRING
            );
            ReminderContext::create_inmemory_with(config, Arc::new(RealSys {}))
        }
    }
}

/// Applies the embedded migrations. A no-op without `DATABASE_URL`.
pub async fn run_migration() -> Result<(), MigrateError> {
    let connection_string = match std::env::var(PSQL_CONNECTION_STRING) {
        Ok(connection_string) => connection_string,
        Err(_) => return Ok(()),
    };
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await
        .expect("TO CONNECT TO POSTGRES");

    sqlx::migrate!().run(&pool).await
}
