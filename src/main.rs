use anyhow::Context;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use cellar_wms::catalog::InMemoryCatalog;
use cellar_wms::{app, config, db, events, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    info!(
        environment = %cfg.environment,
        "starting cellar-wms {}",
        env!("CARGO_PKG_VERSION")
    );

    let pool = db::establish_connection(&cfg)
        .await
        .context("failed to connect to database")?;
    if cfg.auto_migrate {
        db::run_migrations(&pool)
            .await
            .context("failed to run migrations")?;
    }
    let pool = Arc::new(pool);

    let (event_sender, event_receiver) = events::channel();
    tokio::spawn(events::process_events(event_receiver));

    let catalog = Arc::new(InMemoryCatalog::new());
    let state = Arc::new(AppState::new(
        pool,
        cfg.clone(),
        event_sender,
        catalog.clone(),
        catalog,
    ));

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c"),
        _ = terminate => info!("received SIGTERM"),
    }
}
