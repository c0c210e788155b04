use super::IDeliveryTargetRepo;
use sqlx::{FromRow, PgPool};

pub struct PostgresDeliveryTargetRepo {
    pool: PgPool,
}

impl PostgresDeliveryTargetRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DeviceTokenRaw {
    token: String,
}

#[async_trait::async_trait]
impl IDeliveryTargetRepo for PostgresDeliveryTargetRepo {
    async fn insert(&self, user_id: &str, token: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_devices
            (user_id, token)
            VALUES($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(token)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_user(&self, user_id: &str) -> anyhow::Result<Vec<String>> {
        let rows = sqlx::query_as::<_, DeviceTokenRaw>(
            r#"
            SELECT d.token FROM user_devices AS d
            WHERE d.user_id = $1
            ORDER BY d.created
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|row| row.token).collect())
    }

    async fn delete_targets(&self, user_id: &str, tokens: &[String]) -> anyhow::Result<()> {
        if tokens.is_empty() {
            return Ok(());
        }
        sqlx::query(
            r#"
            DELETE FROM user_devices AS d
            WHERE d.user_id = $1 AND d.token = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(tokens)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
