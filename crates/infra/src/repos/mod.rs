mod delivery_target;
mod reminder;
mod shared;

pub use delivery_target::IDeliveryTargetRepo;
use delivery_target::{InMemoryDeliveryTargetRepo, PostgresDeliveryTargetRepo};
pub use reminder::IReminderRepo;
use reminder::{InMemoryReminderRepo, PostgresReminderRepo};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct Repos {
    pub reminders: Arc<dyn IReminderRepo>,
    pub delivery_targets: Arc<dyn IDeliveryTargetRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("DB CHECKING CONNECTION ... [done]");
        Ok(Self {
            reminders: Arc::new(PostgresReminderRepo::new(pool.clone())),
            delivery_targets: Arc::new(PostgresDeliveryTargetRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        Self {
            reminders: Arc::new(InMemoryReminderRepo::new()),
            delivery_targets: Arc::new(InMemoryDeliveryTargetRepo::new()),
        }
    }
}
