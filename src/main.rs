use creative_opportunities::{
    config::Config, routes, services::scheduler::spawn_fetch_scheduler, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    info!(
        store = config.store.backend_name(),
        profile = %config.profile.name,
        "configuration loaded"
    );

    let app_state = AppState::from_config(&config).await?;

    if config.scheduler_enabled {
        info!(
            interval_secs = config.fetch_interval.as_secs(),
            cooldown_secs = config.fetch_cooldown.as_secs(),
            "starting fetch scheduler"
        );
        spawn_fetch_scheduler(
            app_state.fetch.clone(),
            config.fetch_interval,
            config.fetch_cooldown,
        );
    } else {
        info!("fetch scheduler disabled");
    }

    let app = routes::router(app_state, config.trigger_rps);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
