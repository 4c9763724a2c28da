use bistro_api::{app, AppState};
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bistro_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = bistro_store::Config::load()?;
    tracing::info!("Starting Bistro API on port {}", config.server.port);

    let app_state = AppState::from_config(&config)?;
    tracing::info!(
        zones = app_state.engine.catalog().all().len(),
        restaurants = config.menu.restaurants.len(),
        "Delivery catalog loaded"
    );

    // Idle session sweeper
    let sessions = app_state.sessions.clone();
    let sweep_every = Duration::from_secs(config.session.idle_ttl_seconds.clamp(1, 60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_every);
        loop {
            ticker.tick().await;
            sessions.purge_idle();
        }
    });

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
