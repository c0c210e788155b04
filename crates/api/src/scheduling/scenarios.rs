use super::{
    consume_near_horizon::ConsumeNearHorizonUseCase, dispatch_reminder::DispatchReminderUseCase,
    poll_cold_store::PollColdStoreUseCase, promote_mid_horizon::PromoteMidHorizonUseCase,
};
use crate::reminder::{
    create_reminder::CreateReminderUseCase, delete_reminder::DeleteReminderUseCase,
};
use crate::shared::{test_utils::*, usecase::UseCase};
use reminder_scheduler_infra::ReminderContext;

const USER: &str = "user-1";
const DEVICE: &str = "device-token";

async fn register_device(ctx: &ReminderContext) {
    ctx.repos
        .delivery_targets
        .insert(USER, DEVICE)
        .await
        .unwrap();
}

async fn consume(ctx: &ReminderContext) -> usize {
    ConsumeNearHorizonUseCase { batch_size: 16 }
        .execute(ctx)
        .await
        .unwrap()
}

async fn sweep(ctx: &ReminderContext) -> usize {
    PromoteMidHorizonUseCase {}
        .execute(ctx)
        .await
        .unwrap()
        .promoted
}

async fn poll(ctx: &ReminderContext) -> usize {
    PollColdStoreUseCase {}
        .execute(ctx)
        .await
        .unwrap()
        .dispatched
}

#[actix_web::main]
#[test]
async fn one_shot_within_the_near_horizon_fires_once() {
    let now = utc_millis(2024, 1, 10, 8, 0);
    let TestContext {
        ctx,
        sys,
        mid,
        near,
        push,
    } = setup(now);
    register_device(&ctx).await;

    let reminder = CreateReminderUseCase {
        user_id: USER.into(),
        title: "Stand up".into(),
        description: "Daily sync".into(),
        cron: "2 8 * * *".into(),
        timezone: None,
        is_recurring: false,
    }
    .execute(&ctx)
    .await
    .unwrap();
    assert_eq!(reminder.next_execution, now + 2 * MINUTE);
    assert!(mid.is_empty());
    assert_eq!(near.len(), 1);

    sys.advance(2 * MINUTE - 1);
    assert_eq!(consume(&ctx).await, 0);
    sys.advance(1);
    assert_eq!(consume(&ctx).await, 1);

    let sent = push.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, vec![DEVICE.to_string()]);
    assert_eq!(sent[0].1.title, "Stand up");
    assert!(ctx.repos.reminders.find(&reminder.id).await.is_none());

    // Nothing is redelivered once acknowledged
    sys.advance(10 * MINUTE);
    assert_eq!(consume(&ctx).await, 0);
    assert!(near.is_empty());
    assert_eq!(push.sent().len(), 1);
}

#[actix_web::main]
#[test]
async fn recurring_reminder_walks_down_every_tier() {
    let now = utc_millis(2024, 1, 10, 9, 0);
    let due = now + 48 * HOUR;
    let TestContext {
        ctx,
        sys,
        mid,
        near,
        push,
    } = setup(now);
    register_device(&ctx).await;
    let reminder = resting_reminder(USER, "0 9 * * *", due);
    ctx.repos.reminders.insert(&reminder).await.unwrap();

    // Beyond the mid horizon it stays resting
    assert_eq!(poll(&ctx).await, 0);
    assert!(mid.is_empty());

    sys.set(due - 24 * HOUR + MINUTE);
    assert_eq!(poll(&ctx).await, 1);
    assert!(mid.contains(&reminder.id));
    assert!(ctx.repos.reminders.find(&reminder.id).await.unwrap().is_scheduled);

    // Entering the near horizon, but not yet within reach of this sweep
    sys.set(due - 5 * MINUTE);
    assert_eq!(sweep(&ctx).await, 0);

    sys.set(due - MINUTE);
    assert_eq!(sweep(&ctx).await, 1);
    assert!(mid.is_empty());
    assert_eq!(near.pending(), vec![(reminder.payload(), due)]);

    sys.set(due);
    assert_eq!(consume(&ctx).await, 1);
    assert_eq!(push.sent().len(), 1);

    let rearmed = ctx.repos.reminders.find(&reminder.id).await.unwrap();
    assert_eq!(rearmed.next_execution, due + 24 * HOUR);
    assert!(rearmed.is_scheduled);
    // Exactly the mid horizon ceiling away
    assert!(mid.contains(&reminder.id));
    assert!(near.is_empty());
}

#[actix_web::main]
#[test]
async fn cancelled_after_promotion_is_discarded() {
    let now = utc_millis(2024, 1, 10, 8, 0);
    let TestContext {
        ctx,
        sys,
        mid,
        near,
        push,
    } = setup(now);
    register_device(&ctx).await;

    let reminder = CreateReminderUseCase {
        user_id: USER.into(),
        title: "Leave for the airport".into(),
        description: "Passport is in the drawer".into(),
        cron: "10 8 * * *".into(),
        timezone: None,
        is_recurring: true,
    }
    .execute(&ctx)
    .await
    .unwrap();
    assert!(mid.contains(&reminder.id));

    sys.set(reminder.next_execution - MINUTE);
    assert_eq!(sweep(&ctx).await, 1);

    sys.advance(10 * SECOND);
    DeleteReminderUseCase {
        user_id: USER.into(),
        reminder_id: reminder.id.clone(),
    }
    .execute(&ctx)
    .await
    .unwrap();
    assert!(mid.has_tombstone(&reminder.id));

    sys.set(reminder.next_execution);
    assert_eq!(consume(&ctx).await, 1);
    assert!(push.sent().is_empty());
    assert!(!mid.has_tombstone(&reminder.id));
    assert!(near.is_empty());
    assert!(mid.is_empty());
}

#[actix_web::main]
#[test]
async fn deleted_between_claim_and_dispatch_is_never_delivered() {
    let now = utc_millis(2024, 1, 10, 8, 0);
    let due = now + 20 * HOUR;
    let TestContext {
        ctx,
        sys,
        mid,
        near,
        push,
    } = setup(now);
    register_device(&ctx).await;
    let reminder = resting_reminder(USER, "0 4 * * *", due);
    ctx.repos.reminders.insert(&reminder).await.unwrap();

    // The poller has flagged the row but not yet placed it
    let claimed = ctx
        .repos
        .reminders
        .claim_unscheduled(0, now + 24 * HOUR, 10)
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);

    DeleteReminderUseCase {
        user_id: USER.into(),
        reminder_id: reminder.id.clone(),
    }
    .execute(&ctx)
    .await
    .unwrap();
    assert!(mid.has_tombstone(&reminder.id));

    DispatchReminderUseCase {
        payload: claimed[0].payload(),
        now,
    }
    .execute(&ctx)
    .await
    .unwrap();
    assert!(!mid.contains(&reminder.id));

    // Long after the tombstone expired
    sys.set(due - MINUTE);
    assert!(!mid.has_tombstone(&reminder.id));
    assert_eq!(sweep(&ctx).await, 0);
    sys.set(due);
    assert_eq!(consume(&ctx).await, 0);
    assert!(near.is_empty());
    assert!(push.sent().is_empty());
}

#[actix_web::main]
#[test]
async fn overdue_reminder_is_delivered_on_next_poll() {
    let now = utc_millis(2024, 1, 10, 8, 0);
    let TestContext {
        ctx,
        mid,
        near,
        push,
        ..
    } = setup(now);
    register_device(&ctx).await;
    let reminder = resting_reminder(USER, "0 6 * * *", now - 2 * HOUR);
    ctx.repos.reminders.insert(&reminder).await.unwrap();

    assert_eq!(poll(&ctx).await, 1);
    assert_eq!(near.pending(), vec![(reminder.payload(), now)]);

    assert_eq!(consume(&ctx).await, 1);
    assert_eq!(push.sent().len(), 1);

    // The next firing is computed from now, not from the missed due time
    let rearmed = ctx.repos.reminders.find(&reminder.id).await.unwrap();
    assert_eq!(rearmed.next_execution, utc_millis(2024, 1, 11, 6, 0));
    assert!(mid.contains(&reminder.id));
}
