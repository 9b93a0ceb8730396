use std::error::Error;
use std::sync::Arc;

use prayer_reminder::{
    router, AdminPolicy, AppContext, AppState, Dispatcher, FcmNotifier, PushNotifier, Settings,
    SmtpProvider,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting prayer reminder service...");

    let settings = Settings::from_env()?;

    let state = match AppState::initialize(&settings.data_dir).await {
        Ok(state) => state,
        Err(e) => {
            log::error!(
                "Failed to initialize store in {}: {}",
                settings.data_dir.display(),
                e
            );
            return Err(e.into());
        }
    };

    let push: Option<Arc<dyn PushNotifier>> = match &settings.fcm {
        Some(fcm) => {
            log::info!("Push notifications enabled for project {}", fcm.project_id);
            Some(Arc::new(FcmNotifier::new(fcm)))
        }
        None => {
            log::info!("Push notifications disabled (FCM_PROJECT_ID / FCM_ACCESS_TOKEN not set)");
            None
        }
    };

    let admins = AdminPolicy::new(&settings.admin_emails);
    if admins.is_empty() {
        log::warn!("ADMIN_EMAILS is empty; admin endpoints will reject every caller");
    }

    let ctx = AppContext {
        state: Arc::new(state),
        dispatcher: Dispatcher::new(Arc::new(SmtpProvider), push, settings.send_timeout),
        admins: Arc::new(admins),
    };

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(ctx)).await?;
    Ok(())
}
