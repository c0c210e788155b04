use super::IDeliveryTargetRepo;
use crate::repos::shared::inmemory_repo::*;
use std::sync::Mutex;

#[derive(Clone)]
struct DeliveryTarget {
    user_id: String,
    token: String,
}

pub struct InMemoryDeliveryTargetRepo {
    targets: Mutex<Vec<DeliveryTarget>>,
}

impl InMemoryDeliveryTargetRepo {
    pub fn new() -> Self {
        Self {
            targets: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IDeliveryTargetRepo for InMemoryDeliveryTargetRepo {
    async fn insert(&self, user_id: &str, token: &str) -> anyhow::Result<()> {
        let mut targets = self.targets.lock().unwrap();
        if !targets
            .iter()
            .any(|t| t.user_id == user_id && t.token == token)
        {
            targets.push(DeliveryTarget {
                user_id: user_id.into(),
                token: token.into(),
            });
        }
        Ok(())
    }

    async fn find_by_user(&self, user_id: &str) -> anyhow::Result<Vec<String>> {
        let targets = find_by(&self.targets, |t| t.user_id == user_id);
        Ok(targets.into_iter().map(|t| t.token).collect())
    }

    async fn delete_targets(&self, user_id: &str, tokens: &[String]) -> anyhow::Result<()> {
        find_and_delete_by(&self.targets, |t| {
            t.user_id == user_id && tokens.contains(&t.token)
        });
        Ok(())
    }
}
