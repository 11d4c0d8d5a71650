use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use watchtrack_core::{FileUserConfig, RemoteSyncClient, SyncConfig};
use watchtrack_server::{config::ServerConfig, router, AppState};
use watchtrack_trakt::{TraktClient, TraktConfig};

/// How long shutdown waits for the last flush before cancelling it.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let server_config = ServerConfig::from_env();
    let sync_config = SyncConfig::from_env();

    let users = Arc::new(
        FileUserConfig::load(&sync_config.users_file).expect("failed to load tracked users"),
    );
    let remote: Arc<dyn RemoteSyncClient> = Arc::new(
        TraktClient::new(&TraktConfig::from_env()).expect("failed to build Trakt client"),
    );

    let state = Arc::new(AppState::new(&sync_config, users.clone(), remote));

    #[cfg(unix)]
    spawn_reload_on_sighup(users);

    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind(server_config.bind)
        .await
        .expect("failed to bind listener");
    tracing::info!(addr = %server_config.bind, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("draining library sync queue...");
    match tokio::time::timeout(DRAIN_TIMEOUT, state.queue.flush_now()).await {
        Ok(Ok(report)) => tracing::info!(
            entries = report.entries,
            sent = report.batches_sent,
            failed = report.batches_failed,
            "final flush complete"
        ),
        Ok(Err(e)) => tracing::warn!("final flush skipped: {e}"),
        Err(_) => tracing::warn!("final flush timed out, cancelling"),
    }
    state.queue.shutdown().await;
    tracing::info!("shutdown complete");
}

/// Reload the users file on SIGHUP.
#[cfg(unix)]
fn spawn_reload_on_sighup(users: Arc<FileUserConfig>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("failed to install SIGHUP handler: {e}");
                return;
            }
        };
        while hangup.recv().await.is_some() {
            if let Err(e) = users.reload() {
                tracing::error!(path = %users.path().display(), "users reload failed: {e}");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
