use std::sync::Arc;

use boardroom::config::Config;
use boardroom::services::rooms::{MemoryRoomDirectory, PgRoomDirectory, RoomDirectory};
use boardroom::state::AppState;
use boardroom::{db, hub, routes};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let rooms: Arc<dyn RoomDirectory> = match config.database_url.as_deref() {
        Some(url) => match db::init_pool(url, config.db_max_connections).await {
            Ok(pool) => Arc::new(PgRoomDirectory::new(pool)),
            Err(e) => {
                error!(error = %e, "database init failed");
                std::process::exit(1);
            }
        },
        None => {
            warn!("DATABASE_URL not set; using an empty in-memory room directory");
            Arc::new(MemoryRoomDirectory::new())
        }
    };

    let (hub, _hub_task) = hub::spawn(config.hub_queue);
    let addr = config.listen_addr();
    let app = routes::app(AppState::new(hub, rooms, config));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(%addr, "boardroom listening");
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server failed");
        std::process::exit(1);
    }
}
