use crate::shared::usecase::UseCase;
use reminder_scheduler_infra::ReminderContext;
use tracing::{error, info};

/// Moves every mid horizon entry that falls due before the next sweep (plus
/// the safety margin) into the near horizon with its exact remaining delay
#[derive(Debug)]
pub struct PromoteMidHorizonUseCase {}

#[derive(Debug)]
pub enum UseCaseErrors {
    MidHorizonUnavailable(String),
}

#[derive(Debug, Default, PartialEq)]
pub struct PromotionReport {
    pub promoted: usize,
    /// Claimed entries put back because the near horizon refused them
    pub restored: usize,
}

#[async_trait::async_trait(?Send)]
impl UseCase for PromoteMidHorizonUseCase {
    type Response = PromotionReport;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let config = &ctx.config.horizon;
        let mid = &ctx.horizons.mid;
        let now = mid
            .now_millis()
            .await
            .map_err(|e| UseCaseErrors::MidHorizonUnavailable(e.to_string()))?;
        let until = now + config.promotion_sweep_period + config.promotion_safety_margin;

        let mut report = PromotionReport::default();
        loop {
            let claimed = mid
                .claim_due(until, config.promotion_sweep_batch_size)
                .await
                .map_err(|e| UseCaseErrors::MidHorizonUnavailable(e.to_string()))?;
            let batch_len = claimed.len();

            for (payload, due_at) in claimed {
                let delay = std::cmp::max(0, due_at - now);
                match ctx.horizons.near.publish(&payload, delay).await {
                    Ok(_) => {
                        if let Err(e) = mid.forget_payload(&payload.id).await {
                            error!(
                                "Unable to forget the promoted payload of reminder {}: {:?}",
                                payload.id, e
                            );
                        }
                        report.promoted += 1;
                    }
                    Err(e) => {
                        error!(
                            "Unable to promote reminder {} into the near horizon: {:?}",
                            payload.id, e
                        );
                        if let Err(e) = mid.restore(&payload, due_at).await {
                            error!(
                                "Unable to restore reminder {} into the mid horizon: {:?}",
                                payload.id, e
                            );
                        }
                        report.restored += 1;
                    }
                }
            }

            // A refused publish or a partial batch ends the tick, the rest is
            // picked up by the next one
            if report.restored > 0 || batch_len < config.promotion_sweep_batch_size {
                break;
            }
        }

        if report.promoted > 0 {
            info!("Promoted {} reminders into the near horizon", report.promoted);
        }
        Ok(report)
    }
}
