use anyhow::Context as _;
use storefront_core::settings::SettingsServiceTrait;
use storefront_core::sync::{MirrorState, MirrorStatusRepositoryTrait};
use storefront_core::users::AuthServiceTrait;
use storefront_server::config::ServerConfig;
use storefront_server::context::initialize_context;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("Failed to load configuration")?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting with {:?}", config);
    let mut context = initialize_context(&config)?;

    let settings = context.settings_service().get_settings()?;
    info!(
        "Currency {}, theme {}, signed in: {}",
        settings.currency,
        settings.theme.as_str(),
        context.auth_service().current_user()?.is_some()
    );
    if let Some(previous) = context.mirror_status_repository.get_mirror_status()? {
        info!(
            "Previous mirror run ended {:?} after {} snapshot(s)",
            previous.state, previous.snapshots_applied
        );
    }

    let mut events = context.event_bus.subscribe();
    let event_logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!("Domain event: {:?}", event),
                Err(RecvError::Lagged(skipped)) => warn!("Event log skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let Some(mirror) = context.start_mirror() else {
        anyhow::bail!("Product mirror already started");
    };
    let mut status = mirror.status();
    let status_logger = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();
            match current.state {
                MirrorState::FailedSilent => warn!(
                    "Product mirror stopped listening: {}",
                    current.last_error.as_deref().unwrap_or("unknown error")
                ),
                MirrorState::Retrying => info!(
                    "Product mirror retrying at {}",
                    current.next_retry_at.as_deref().unwrap_or("-")
                ),
                _ => debug!("Product mirror status: {:?}", current),
            }
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutting down");

    mirror.shutdown().await;
    status_logger.abort();
    event_logger.abort();
    info!("Database at {} closed", context.db_path);
    Ok(())
}
