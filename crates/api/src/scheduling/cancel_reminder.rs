use crate::shared::usecase::UseCase;
use reminder_scheduler_domain::ID;
use reminder_scheduler_infra::ReminderContext;

/// Withdraws the transient entry of a deleted `Reminder` that was scheduled.
///
/// An entry still buffered in the mid horizon is removed outright. Otherwise
/// it is already on its way through the near horizon, where nothing can be
/// removed, so a tombstone tells the consumer to discard it. Losing a race
/// against the sweeper or a consumer is never an error.
///
/// The tombstone also keeps a dispatch that is still pending out of the mid
/// horizon. One that got in before the tombstone is removed right after it.
#[derive(Debug)]
pub struct CancelReminderUseCase {
    pub reminder_id: ID,
}

#[derive(Debug)]
pub enum UseCaseErrors {
    MidHorizonUnavailable(String),
}

#[derive(Debug, PartialEq)]
pub enum Cancellation {
    /// Removed from the mid horizon before it was promoted
    Removed,
    /// In flight, the consumer will discard it
    Tombstoned,
    /// A tombstone was already pending
    AlreadyTombstoned,
}

#[async_trait::async_trait(?Send)]
impl UseCase for CancelReminderUseCase {
    type Response = Cancellation;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let mid = &ctx.horizons.mid;
        let removed = mid
            .remove(&self.reminder_id)
            .await
            .map_err(|e| UseCaseErrors::MidHorizonUnavailable(e.to_string()))?;
        if removed {
            return Ok(Cancellation::Removed);
        }

        let created = mid
            .set_tombstone(&self.reminder_id, ctx.config.horizon.tombstone_ttl)
            .await
            .map_err(|e| UseCaseErrors::MidHorizonUnavailable(e.to_string()))?;
        let removed = mid
            .remove(&self.reminder_id)
            .await
            .map_err(|e| UseCaseErrors::MidHorizonUnavailable(e.to_string()))?;
        if removed {
            Ok(Cancellation::Removed)
        } else if created {
            Ok(Cancellation::Tombstoned)
        } else {
            Ok(Cancellation::AlreadyTombstoned)
        }
    }
}
