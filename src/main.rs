mod telemetry;

use reminder_scheduler_api::Application;
use reminder_scheduler_infra::{run_migration, setup_context};
use telemetry::{get_subscriber, init_subscriber};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    openssl_probe::init_ssl_cert_env_vars();

    let subscriber = get_subscriber("reminder_scheduler".into(), "info".into());
    init_subscriber(subscriber);

    run_migration()
        .await
        .expect("Failed to run database migrations");

    let context = setup_context().await;

    let app = Application::new(context).await?;
    app.start().await
}
