use crate::shared::usecase::UseCase;
use reminder_scheduler_domain::{Horizon, ReminderPayload};
use reminder_scheduler_infra::ReminderContext;
use tracing::info;

/// Hands a `Reminder` to the tier matching how far away `payload.due_at` is.
///
/// `now` is a reading of the shared clock made by the caller, which it also
/// used to decide the `is_scheduled` flag it persisted, so the flag and the
/// placement always agree.
#[derive(Debug)]
pub struct DispatchReminderUseCase {
    pub payload: ReminderPayload,
    pub now: i64,
}

#[derive(Debug)]
pub enum UseCaseErrors {
    NearHorizonUnavailable(String),
    MidHorizonUnavailable(String),
}

#[async_trait::async_trait(?Send)]
impl UseCase for DispatchReminderUseCase {
    type Response = Horizon;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let horizon = ctx
            .config
            .horizon
            .policy()
            .classify_due(self.payload.due_at, self.now);

        match horizon {
            Horizon::Near { delay } => ctx
                .horizons
                .near
                .publish(&self.payload, delay)
                .await
                .map_err(|e| UseCaseErrors::NearHorizonUnavailable(e.to_string()))?,
            Horizon::Mid => {
                let indexed = ctx
                    .horizons
                    .mid
                    .insert(&self.payload, self.payload.due_at)
                    .await
                    .map_err(|e| UseCaseErrors::MidHorizonUnavailable(e.to_string()))?;
                if !indexed {
                    info!(
                        "Reminder {} was cancelled before it reached the mid horizon",
                        self.payload.id
                    );
                }
            }
            Horizon::Rest => {}
        }

        Ok(horizon)
    }
}
