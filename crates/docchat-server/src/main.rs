use std::sync::Arc;

use docchat::backends::http::HttpSearchBackend;
use docchat::DocSearch;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod configuration;
mod error;
mod routes;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let settings = configuration::Settings::new()?;
    let search_url = settings.search.search_url()?;
    info!(
        search_url = %search_url,
        error_policy = %settings.search.error_policy,
        "configured documentation search"
    );

    // Create app state
    let backend = HttpSearchBackend::new(search_url, settings.search.api_key.clone());
    let doc_search =
        DocSearch::new(Arc::new(backend)).with_error_policy(settings.search.error_policy);
    let state = state::AppState::new(doc_search);

    // The widget is embedded on other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(settings.server.socket_addr()?).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
