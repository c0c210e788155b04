mod inmemory;
mod postgres;

pub use inmemory::InMemoryDeliveryTargetRepo;
pub use postgres::PostgresDeliveryTargetRepo;

/// Push tokens of the devices a user has registered
#[async_trait::async_trait]
pub trait IDeliveryTargetRepo: Send + Sync {
    /// Registering the same token twice is a no-op
    async fn insert(&self, user_id: &str, token: &str) -> anyhow::Result<()>;
    async fn find_by_user(&self, user_id: &str) -> anyhow::Result<Vec<String>>;
    async fn delete_targets(&self, user_id: &str, tokens: &[String]) -> anyhow::Result<()>;
}
