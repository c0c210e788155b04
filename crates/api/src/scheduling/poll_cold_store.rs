use super::dispatch_reminder::DispatchReminderUseCase;
use crate::shared::usecase::{execute, UseCase};
use reminder_scheduler_domain::ID;
use reminder_scheduler_infra::ReminderContext;
use tracing::{error, info};

/// Pulls resting `Reminder`s that entered the mid horizon out of the database
/// and dispatches them. Overdue rows are included so nothing is skipped
/// after an outage.
#[derive(Debug)]
pub struct PollColdStoreUseCase {}

#[derive(Debug)]
pub enum UseCaseErrors {
    MidHorizonUnavailable(String),
    StorageError(String),
}

#[derive(Debug, Default, PartialEq)]
pub struct PollReport {
    pub dispatched: usize,
    /// Claimed rows flagged back as unscheduled because dispatch failed
    pub released: usize,
}

#[async_trait::async_trait(?Send)]
impl UseCase for PollColdStoreUseCase {
    type Response = PollReport;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let config = &ctx.config.horizon;
        let now = ctx
            .horizons
            .mid
            .now_millis()
            .await
            .map_err(|e| UseCaseErrors::MidHorizonUnavailable(e.to_string()))?;
        let until = now + config.max_mid_horizon_delay;

        let mut report = PollReport::default();
        let mut failed: Vec<ID> = Vec::new();
        loop {
            let claimed = ctx
                .repos
                .reminders
                .claim_unscheduled(0, until, config.cold_poll_batch_size)
                .await
                .map_err(|e| UseCaseErrors::StorageError(e.to_string()))?;
            let batch_len = claimed.len();

            for reminder in claimed {
                let dispatch = DispatchReminderUseCase {
                    payload: reminder.payload(),
                    now,
                };
                match execute(dispatch, ctx).await {
                    Ok(_) => report.dispatched += 1,
                    Err(_) => failed.push(reminder.id),
                }
            }

            if !failed.is_empty() || batch_len < config.cold_poll_batch_size {
                break;
            }
        }

        if !failed.is_empty() {
            report.released = failed.len();
            if let Err(e) = ctx.repos.reminders.set_scheduled(&failed, false).await {
                error!(
                    "Unable to release {} reminders that failed to dispatch: {:?}",
                    failed.len(),
                    e
                );
            }
        }
        if report.dispatched > 0 {
            info!("Dispatched {} reminders from cold storage", report.dispatched);
        }
        Ok(report)
    }
}
