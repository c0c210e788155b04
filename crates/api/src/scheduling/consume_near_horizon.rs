use super::deliver_reminder::DeliverReminderUseCase;
use crate::shared::usecase::{execute, UseCase};
use futures::future::join_all;
use reminder_scheduler_infra::{Delivery, ReminderContext};
use tracing::error;

/// Receives a batch of due deliveries and handles them concurrently.
/// A delivery is only acknowledged after it was handled, so a failure
/// leaves it in the channel for redelivery.
#[derive(Debug)]
pub struct ConsumeNearHorizonUseCase {
    pub batch_size: usize,
}

#[derive(Debug)]
pub enum UseCaseErrors {
    NearHorizonUnavailable(String),
}

async fn handle(delivery: Delivery, ctx: &ReminderContext) -> bool {
    let usecase = DeliverReminderUseCase {
        payload: delivery.payload.clone(),
    };
    if execute(usecase, ctx).await.is_err() {
        return false;
    }
    match ctx.horizons.near.ack(&delivery).await {
        Ok(_) => true,
        Err(e) => {
            error!(
                "Unable to acknowledge delivery {} of reminder {}: {:?}",
                delivery.tag, delivery.payload.id, e
            );
            false
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for ConsumeNearHorizonUseCase {
    /// Number of deliveries received
    type Response = usize;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let deliveries = ctx
            .horizons
            .near
            .receive(self.batch_size)
            .await
            .map_err(|e| UseCaseErrors::NearHorizonUnavailable(e.to_string()))?;
        let received = deliveries.len();

        join_all(deliveries.into_iter().map(|delivery| handle(delivery, ctx))).await;

        Ok(received)
    }
}
