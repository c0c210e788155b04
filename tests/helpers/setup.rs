use reminder_scheduler_api::Application;
use reminder_scheduler_infra::{Config, ReminderContext};
use reminder_scheduler_sdk::ReminderSDK;

pub struct TestApp {
    pub config: Config,
}

// Launch the application as a background task
pub async fn spawn_app() -> (TestApp, ReminderSDK, String) {
    let mut ctx = ReminderContext::create_inmemory();
    ctx.config.port = 0; // Random port

    let config = ctx.config.clone();
    let application = Application::new(ctx)
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}/api/v1", application.port());
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    let app = TestApp { config };
    let sdk = ReminderSDK::new(address.clone());
    (app, sdk, address)
}
