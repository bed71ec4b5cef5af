use std::sync::Arc;

use anyhow::Result;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use checkin::{
    AppState, routes,
    session::{SessionConfig, SessionManager},
    store::{EventStore, MemoryStore, PgStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting check-in service");

    let (store, session_store): (Arc<dyn EventStore>, Arc<dyn SessionStore>) =
        if std::env::var("DATABASE_URL").is_ok() {
            let db_config = common::database::DatabaseConfig::from_env()?;
            let pool = common::database::init_pool(&db_config).await?;

            if common::database::health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }

            let store = PgStore::new(pool);
            store.init_schema().await?;

            let store = Arc::new(store);
            (store.clone() as Arc<dyn EventStore>, store as Arc<dyn SessionStore>)
        } else {
            warn!("DATABASE_URL not set, falling back to in-memory storage");
            let store = Arc::new(MemoryStore::new());
            (store.clone() as Arc<dyn EventStore>, store as Arc<dyn SessionStore>)
        };

    let sessions = SessionManager::new(session_store, SessionConfig::from_env());
    let state = AppState { store, sessions };

    let app = routes::create_router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Check-in service listening on 0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
