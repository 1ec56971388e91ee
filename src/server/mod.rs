pub mod handlers;
pub mod types;

use crate::{
    Result,
    classifier::{Classifier, OnnxModel},
    config::Config,
    llm::OpenAiClient,
    plant_info::PlantInfoService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub use handlers::AppState;

/// Builds the application router around already-constructed state.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .route("/plant-info/", get(handlers::plant_info_without_name))
        .route("/plant-info/:plant_name", get(handlers::plant_info))
        .route("/plants", get(handlers::list_plants))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    // A missing or broken model is fatal; there is nothing useful to serve without it.
    let model_path = config.model.path.clone();
    let default_size = config.model.default_input_size;
    let model = tokio::task::spawn_blocking(move || OnnxModel::load(model_path, default_size))
        .await
        .map_err(|e| crate::Error::internal(format!("model loading task failed: {}", e)))??;
    let classifier = Classifier::new(model)?;

    let llm = OpenAiClient::new(config.llm.clone());
    info!("Plant information provider: model {} at {}", llm.model(), config.llm.base_url);
    let plant_info = PlantInfoService::from_config(Arc::new(llm), &config.llm);

    let app_state = AppState {
        classifier: Some(Arc::new(classifier)),
        plant_info: Arc::new(plant_info),
        llm_configured: !config.llm.api_key.trim().is_empty(),
    };

    let app = router(app_state, config.server.max_upload_bytes);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
