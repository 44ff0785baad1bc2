use std::sync::Arc;
use std::net::SocketAddr;
use anyhow::Context;
use encore_api::{app, AppState};
use encore_core::{spawn_sweeper, HoldStore, ReservationService};
use encore_store::{app_config::Config, DbClient, PostgresTicketRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encore_api=debug,encore_core=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Encore API on port {}", config.server.port);

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    let tickets = Arc::new(PostgresTicketRepository::new(db.pool.clone()));

    // One hold store for the whole process
    let holds = Arc::new(HoldStore::with_system_clock(config.holds.hold_duration()?));
    let _sweeper = spawn_sweeper(holds.clone(), config.holds.sweep_interval());
    tracing::info!("Holds last {}s, batch limit {}", config.holds.hold_seconds, config.holds.max_batch_size);

    let reservations = ReservationService::new(holds, tickets)
        .with_max_batch_size(config.holds.max_batch_size);

    let app = app(AppState::new(reservations));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
