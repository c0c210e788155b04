use super::dispatch_reminder::DispatchReminderUseCase;
use crate::shared::usecase::{execute, UseCase};
use reminder_scheduler_domain::ReminderPayload;
use reminder_scheduler_infra::{PushNotification, ReminderContext};
use tracing::{error, info, warn};

/// Handles one firing received from the near horizon: honors a pending
/// cancellation, pushes the notification and then re-arms or retires the
/// `Reminder`.
#[derive(Debug)]
pub struct DeliverReminderUseCase {
    pub payload: ReminderPayload,
}

#[derive(Debug)]
pub enum UseCaseErrors {
    MidHorizonUnavailable(String),
    StorageError(String),
}

#[derive(Debug, PartialEq)]
pub enum DeliveryOutcome {
    /// A tombstone was found, nothing was sent
    Cancelled,
    /// Sent and moved on to the next firing at this timestamp
    Rearmed(i64),
    /// Sent, but the firing was already re-armed or the `Reminder` deleted
    Stale,
    /// Sent for the last time and removed
    Completed,
}

impl DeliverReminderUseCase {
    /// Failures of individual targets or of the transport never fail the
    /// firing
    async fn push(&self, ctx: &ReminderContext) {
        let user_id = &self.payload.user_id;
        let targets = match ctx.repos.delivery_targets.find_by_user(user_id).await {
            Ok(targets) => targets,
            Err(e) => {
                error!("Unable to look up delivery targets of user {}: {:?}", user_id, e);
                return;
            }
        };
        if targets.is_empty() {
            info!("User {} has no delivery targets", user_id);
            return;
        }

        let notification = PushNotification::from(&self.payload);
        match ctx.services.push.send(&targets, &notification).await {
            Ok(report) if !report.failed_targets.is_empty() => {
                warn!(
                    "Pruning {} failing delivery targets of user {}",
                    report.failed_targets.len(),
                    user_id
                );
                if let Err(e) = ctx
                    .repos
                    .delivery_targets
                    .delete_targets(user_id, &report.failed_targets)
                    .await
                {
                    error!("Unable to prune delivery targets of user {}: {:?}", user_id, e);
                }
            }
            Ok(_) => {}
            Err(e) => error!(
                "Unable to push reminder {} to user {}: {:?}",
                self.payload.id, user_id, e
            ),
        }
    }

    async fn retire(&self, ctx: &ReminderContext) -> Result<DeliveryOutcome, UseCaseErrors> {
        ctx.repos
            .reminders
            .delete(&self.payload.id)
            .await
            .map_err(|e| UseCaseErrors::StorageError(e.to_string()))?;
        Ok(DeliveryOutcome::Completed)
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for DeliverReminderUseCase {
    type Response = DeliveryOutcome;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let mid = &ctx.horizons.mid;
        let cancelled = mid
            .take_tombstone(&self.payload.id)
            .await
            .map_err(|e| UseCaseErrors::MidHorizonUnavailable(e.to_string()))?;
        if cancelled {
            info!("Discarding cancelled reminder {}", self.payload.id);
            return Ok(DeliveryOutcome::Cancelled);
        }

        self.push(ctx).await;

        if !self.payload.is_recurring {
            return self.retire(ctx).await;
        }

        let now = mid
            .now_millis()
            .await
            .map_err(|e| UseCaseErrors::MidHorizonUnavailable(e.to_string()))?;
        // A late firing must not produce a next firing in the past
        let after = std::cmp::max(now, self.payload.due_at);
        let next_execution = match self
            .payload
            .cron
            .next_fire_after_millis(&self.payload.timezone, after)
        {
            Some(next_execution) => next_execution,
            None => return self.retire(ctx).await,
        };

        let is_scheduled = ctx
            .config
            .horizon
            .policy()
            .classify_due(next_execution, now)
            .is_scheduled();
        let rescheduled = ctx
            .repos
            .reminders
            .reschedule(
                &self.payload.id,
                self.payload.due_at,
                next_execution,
                is_scheduled,
            )
            .await
            .map_err(|e| UseCaseErrors::StorageError(e.to_string()))?;
        if !rescheduled {
            return Ok(DeliveryOutcome::Stale);
        }

        if is_scheduled {
            let dispatch = DispatchReminderUseCase {
                payload: self.payload.rearmed(next_execution),
                now,
            };
            if execute(dispatch, ctx).await.is_err() {
                // Leave it to the cold store poller
                if let Err(e) = ctx
                    .repos
                    .reminders
                    .set_scheduled(&[self.payload.id.clone()], false)
                    .await
                {
                    error!(
                        "Unable to release reminder {} after a failed re-arm: {:?}",
                        self.payload.id, e
                    );
                }
            }
        }

        Ok(DeliveryOutcome::Rearmed(next_execution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::*;
    use reminder_scheduler_domain::Reminder;
    use std::sync::Arc;

    async fn in_flight(ctx: &ReminderContext, mut reminder: Reminder) -> Reminder {
        reminder.is_scheduled = true;
        ctx.repos.reminders.insert(&reminder).await.unwrap();
        reminder
    }

    #[actix_web::main]
    #[test]
    async fn one_shot_is_sent_and_removed() {
        let now = utc_millis(2024, 1, 10, 9, 0);
        let TestContext { ctx, push, .. } = setup(now);
        ctx.repos
            .delivery_targets
            .insert("user-1", "token-a")
            .await
            .unwrap();
        let mut reminder = resting_reminder("user-1", "0 9 * * *", now);
        reminder.is_recurring = false;
        let reminder = in_flight(&ctx, reminder).await;

        let outcome = DeliverReminderUseCase {
            payload: reminder.payload(),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(outcome, DeliveryOutcome::Completed);

        let sent = push.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, vec!["token-a".to_string()]);
        assert_eq!(sent[0].1.title, reminder.title);
        assert_eq!(sent[0].1.body, reminder.description);
        assert_eq!(
            sent[0].1.data.get("reminderId"),
            Some(&reminder.id.as_string())
        );
        assert!(ctx.repos.reminders.find(&reminder.id).await.is_none());
    }

    #[actix_web::main]
    #[test]
    async fn recurring_is_rearmed_once_per_firing() {
        let now = utc_millis(2024, 1, 10, 9, 0);
        let TestContext { ctx, mid, .. } = setup(now);
        let reminder = in_flight(&ctx, resting_reminder("user-1", "0 9 * * *", now)).await;
        let next = utc_millis(2024, 1, 11, 9, 0);

        let outcome = DeliverReminderUseCase {
            payload: reminder.payload(),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(outcome, DeliveryOutcome::Rearmed(next));
        assert!(mid.contains(&reminder.id));

        let stored = ctx.repos.reminders.find(&reminder.id).await.unwrap();
        assert_eq!(stored.next_execution, next);
        assert!(stored.is_scheduled);

        // A redelivery of the same firing does not re-arm again
        let outcome = DeliverReminderUseCase {
            payload: reminder.payload(),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(outcome, DeliveryOutcome::Stale);
        let claimed = ctx.horizons.mid.claim_due(i64::MAX, 10).await.unwrap();
        assert_eq!(claimed, vec![(reminder.payload().rearmed(next), next)]);
    }

    #[actix_web::main]
    #[test]
    async fn late_firing_rearms_after_now() {
        let due_at = utc_millis(2024, 1, 10, 9, 0);
        let now = utc_millis(2024, 1, 12, 12, 0);
        let TestContext { ctx, .. } = setup(now);
        let reminder = in_flight(&ctx, resting_reminder("user-1", "0 9 * * *", due_at)).await;

        let outcome = DeliverReminderUseCase {
            payload: reminder.payload(),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(
            outcome,
            DeliveryOutcome::Rearmed(utc_millis(2024, 1, 13, 9, 0))
        );
    }

    #[actix_web::main]
    #[test]
    async fn rearm_beyond_mid_horizon_rests() {
        let now = utc_millis(2024, 1, 10, 9, 0);
        let TestContext { ctx, mid, near, .. } = setup(now);
        // Every Wednesday at 09:00
        let reminder = in_flight(&ctx, resting_reminder("user-1", "0 9 * * WED", now)).await;

        let outcome = DeliverReminderUseCase {
            payload: reminder.payload(),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(
            outcome,
            DeliveryOutcome::Rearmed(utc_millis(2024, 1, 17, 9, 0))
        );
        assert!(mid.is_empty());
        assert!(near.is_empty());
        let stored = ctx.repos.reminders.find(&reminder.id).await.unwrap();
        assert!(!stored.is_scheduled);
    }

    #[actix_web::main]
    #[test]
    async fn cancelled_firing_is_discarded() {
        let now = utc_millis(2024, 1, 10, 9, 0);
        let TestContext { ctx, push, mid, .. } = setup(now);
        let reminder = resting_reminder("user-1", "0 9 * * *", now);
        ctx.repos
            .delivery_targets
            .insert("user-1", "token-a")
            .await
            .unwrap();
        ctx.horizons
            .mid
            .set_tombstone(&reminder.id, 10 * MINUTE)
            .await
            .unwrap();

        let outcome = DeliverReminderUseCase {
            payload: reminder.payload(),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(outcome, DeliveryOutcome::Cancelled);
        assert!(push.sent().is_empty());
        assert!(!mid.has_tombstone(&reminder.id));
    }

    #[actix_web::main]
    #[test]
    async fn failing_targets_are_pruned() {
        let now = utc_millis(2024, 1, 10, 9, 0);
        let TestContext { ctx, push, .. } = setup(now);
        let targets = &ctx.repos.delivery_targets;
        targets.insert("user-1", "token-a").await.unwrap();
        targets.insert("user-1", "token-stale").await.unwrap();
        push.reject_target("token-stale");
        let reminder = in_flight(&ctx, resting_reminder("user-1", "0 9 * * *", now)).await;

        DeliverReminderUseCase {
            payload: reminder.payload(),
        }
        .execute(&ctx)
        .await
        .unwrap();

        assert_eq!(push.sent()[0].0.len(), 2);
        assert_eq!(
            targets.find_by_user("user-1").await.unwrap(),
            vec!["token-a".to_string()]
        );
    }

    #[actix_web::main]
    #[test]
    async fn transport_failure_does_not_fail_the_firing() {
        let now = utc_millis(2024, 1, 10, 9, 0);
        let TestContext { ctx, push, .. } = setup(now);
        ctx.repos
            .delivery_targets
            .insert("user-1", "token-a")
            .await
            .unwrap();
        push.set_unavailable(true);
        let reminder = in_flight(&ctx, resting_reminder("user-1", "0 9 * * *", now)).await;

        let outcome = DeliverReminderUseCase {
            payload: reminder.payload(),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(
            outcome,
            DeliveryOutcome::Rearmed(utc_millis(2024, 1, 11, 9, 0))
        );
        assert_eq!(
            ctx.repos
                .delivery_targets
                .find_by_user("user-1")
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[actix_web::main]
    #[test]
    async fn failed_rearm_dispatch_leaves_the_row_to_the_poller() {
        let now = utc_millis(2024, 1, 10, 9, 0);
        let TestContext { mut ctx, .. } = setup(now);
        ctx.horizons.near = Arc::new(UnavailableNearChannel {});
        // Every minute, so the next firing lands in the near horizon
        let reminder = in_flight(&ctx, resting_reminder("user-1", "* * * * *", now)).await;

        let outcome = DeliverReminderUseCase {
            payload: reminder.payload(),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(outcome, DeliveryOutcome::Rearmed(now + MINUTE));
        let stored = ctx.repos.reminders.find(&reminder.id).await.unwrap();
        assert_eq!(stored.next_execution, now + MINUTE);
        assert!(!stored.is_scheduled);
    }
}
