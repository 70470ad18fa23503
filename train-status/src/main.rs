use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use train_status::cache::RouteCache;
use train_status::config::AppConfig;
use train_status::poller::{Poller, PollerConfig};
use train_status::rtt::{RttClient, RttConfig};
use train_status::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    if !config.has_credentials() {
        warn!("RTT_USERNAME/RTT_PASSWORD not set; status will report missing credentials");
    }

    let client = RttClient::new(RttConfig::new(&config.username, &config.password))
        .expect("Failed to build RTT client");

    let cache = Arc::new(RouteCache::new());
    let poller_config = PollerConfig {
        credentials_present: config.has_credentials(),
        ..PollerConfig::default()
    };
    let poller = Poller::new(
        Arc::new(client),
        config.routes.clone(),
        Arc::clone(&cache),
        poller_config,
    );
    let handle = poller.handle();

    // The poller and its pending inter-cycle wait live in this one task;
    // dropping the runtime cancels both together.
    tokio::spawn(poller.run());

    let state = AppState::new(handle, cache, config.routes);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .expect("Failed to bind listen address");
    info!(addr = %config.listen_addr, "train status listening");

    axum::serve(listener, app).await.expect("server error");
}
