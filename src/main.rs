mod appsettings;
mod delivery;
mod email;

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use appsettings::AppSettings;
use chrono::{TimeDelta, Utc};
use delivery::NotificationDeliveryChannel;
use email::{EmailSender, HttpEmailSender};
use glowfit_api::{AppState, SessionSettings, UploadSettings};
use glowfit_scheduler::DueReminderPoller;
use glowfit_storage::{
    UserStorage,
    sqlite::{self, SqliteNotificationStorage, SqliteReminderStorage, SqliteUserStorage},
};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::load().context("Could not load appsettings")?;
    log::info!("Starting glowfit. [bind = {}]", settings.server.bind);

    let pool = sqlite::connect(&settings.database.url, settings.database.max_connections)
        .await
        .context("Could not open database")?;

    tokio::fs::create_dir_all(&settings.uploads.dir)
        .await
        .with_context(|| format!("Could not create {}", settings.uploads.dir.display()))?;

    let cancellation_token = CancellationToken::new();

    let email: Option<Arc<dyn EmailSender>> = match settings.email.clone() {
        Some(email_settings) => Some(Arc::new(HttpEmailSender::new(email_settings))),
        None => {
            log::warn!("No email section configured, reminders are delivered in-app only");
            None
        }
    };
    let delivery = Arc::new(NotificationDeliveryChannel::new(
        Arc::new(SqliteNotificationStorage::new(pool.clone())),
        email,
    ));
    let poller = DueReminderPoller::new(
        Arc::new(SqliteReminderStorage::new(pool.clone())),
        delivery,
        settings.scheduler.poll_interval(),
    )
    .spawn(cancellation_token.clone());

    let sweeper = spawn_session_sweeper(
        Arc::new(SqliteUserStorage::new(pool.clone())),
        cancellation_token.clone(),
    );

    let state = AppState::sqlite(
        pool,
        UploadSettings {
            dir: settings.uploads.dir.clone(),
            max_bytes: settings.uploads.max_bytes,
        },
        SessionSettings {
            ttl: TimeDelta::hours(settings.session.ttl_hours),
            secure_cookie: settings.session.secure_cookie,
        },
    );

    let listener = TcpListener::bind(&settings.server.bind)
        .await
        .with_context(|| format!("Could not bind {}", settings.server.bind))?;
    log::info!("Listening. [addr = {}]", listener.local_addr()?);

    tokio::spawn(shutdown_on_ctrl_c(cancellation_token.clone()));

    axum::serve(listener, glowfit_api::router(state))
        .with_graceful_shutdown(cancellation_token.clone().cancelled_owned())
        .await
        .context("HTTP server failed")?;

    cancellation_token.cancel();
    let _ = tokio::join!(poller, sweeper);
    log::info!("Shut down");

    Ok(())
}

async fn shutdown_on_ctrl_c(cancellation_token: CancellationToken) {
    if let Err(error) = tokio::signal::ctrl_c().await {
        log::error!("Could not listen for Ctrl-C. [error = {error}]");
        return;
    }
    log::info!("Ctrl-C received, shutting down");
    cancellation_token.cancel();
}

fn spawn_session_sweeper(
    users: Arc<dyn UserStorage>,
    cancellation_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => break,
                _ = interval.tick() => {
                    match users.delete_expired_sessions(Utc::now()).await {
                        Ok(0) => {}
                        Ok(removed) => log::info!("Expired sessions removed. [count = {removed}]"),
                        Err(error) => log::error!("Could not remove expired sessions. [error = {error}]"),
                    }
                }
            }
        }
    })
}
