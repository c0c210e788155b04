use crate::{
    scheduling::{
        consume_near_horizon::ConsumeNearHorizonUseCase, poll_cold_store::PollColdStoreUseCase,
        promote_mid_horizon::PromoteMidHorizonUseCase,
    },
    shared::usecase::execute,
};
use actix_web::rt::time::{interval, sleep};
use reminder_scheduler_infra::ReminderContext;
use std::time::Duration;
use tracing::{debug, info};

fn millis(duration: i64) -> Duration {
    Duration::from_millis(std::cmp::max(duration, 1) as u64)
}

/// Moves entries of the mid horizon store that entered the near horizon
/// into the near horizon channel
pub fn start_promotion_sweeper(ctx: ReminderContext) {
    actix_web::rt::spawn(async move {
        let mut interval = interval(millis(ctx.config.horizon.promotion_sweep_period));
        loop {
            interval.tick().await;

            let usecase = PromoteMidHorizonUseCase {};
            if let Ok(report) = execute(usecase, &ctx).await {
                if report.promoted > 0 || report.restored > 0 {
                    debug!(
                        "Promoted {} reminders, restored {}",
                        report.promoted, report.restored
                    );
                }
            }
        }
    });
}

/// Moves resting rows that entered the mid horizon out of the database
pub fn start_cold_store_poller(ctx: ReminderContext) {
    actix_web::rt::spawn(async move {
        let mut interval = interval(millis(ctx.config.horizon.cold_poll_period));
        loop {
            interval.tick().await;

            let usecase = PollColdStoreUseCase {};
            if let Ok(report) = execute(usecase, &ctx).await {
                if report.dispatched > 0 || report.released > 0 {
                    debug!(
                        "Dispatched {} resting reminders, released {}",
                        report.dispatched, report.released
                    );
                }
            }
        }
    });
}

/// Delivery workers draining the near horizon channel. A worker polls again
/// right away while there is work and backs off for the idle interval
/// otherwise.
pub fn start_delivery_consumers(ctx: ReminderContext) {
    let workers = std::cmp::max(ctx.config.consumer.workers, 1);
    info!("Starting {} delivery workers", workers);
    for _ in 0..workers {
        let ctx = ctx.clone();
        actix_web::rt::spawn(async move {
            let idle = millis(ctx.config.consumer.idle_interval);
            loop {
                let usecase = ConsumeNearHorizonUseCase {
                    batch_size: ctx.config.consumer.batch_size,
                };
                match execute(usecase, &ctx).await {
                    Ok(received) if received > 0 => {}
                    _ => sleep(idle).await,
                }
            }
        });
    }
}
