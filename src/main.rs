use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shelfwise_api::{
    config::Config,
    routes::{create_router, AppState},
    services::{
        catalog::load_catalog,
        recommendations::Recommender,
        store::{DocumentStore, FirestoreStore, InMemoryStore},
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let catalog = load_catalog(&config.catalog_path)?;
    let recommender = Recommender::standard()?;

    let store: Arc<dyn DocumentStore> = match &config.firestore_project_id {
        Some(project_id) => Arc::new(FirestoreStore::new(
            &config.firestore_api_url,
            project_id,
            &config.firestore_database,
            config.firestore_access_token.clone(),
        )),
        None => {
            tracing::warn!("FIRESTORE_PROJECT_ID not set, using in-memory document store");
            Arc::new(InMemoryStore::new())
        }
    };

    tracing::info!(store = store.name(), books = catalog.len(), "Starting server");

    let app = create_router(AppState::new(catalog, recommender, store));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
