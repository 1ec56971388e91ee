use super::types::{ErrorResponse, HealthResponse, PlantsResponse, PredictResponse};
use crate::{
    Error,
    classifier::{Classifier, PLANT_CLASS_NAMES},
    plant_info::{PlantInfo, PlantInfoService},
};
use axum::{
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Name of the multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

#[derive(Clone)]
pub struct AppState {
    /// `None` only when the server is wired without a model; requests then fail fast.
    pub classifier: Option<Arc<Classifier>>,
    pub plant_info: Arc<PlantInfoService>,
    pub llm_configured: bool,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "Plant identification server is running".to_string(),
        gemini_api: if state.llm_configured {
            "connected"
        } else {
            "not configured"
        }
        .to_string(),
    })
}

pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, HandlerError> {
    let request_id = Uuid::new_v4();
    info!("Received prediction request {}", request_id);

    let Some(classifier) = state.classifier.clone() else {
        error!("Prediction request {} rejected: model not loaded", request_id);
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Plant model not loaded",
        ));
    };

    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            warn!("Request {} is not a multipart upload: {}", request_id, rejection);
            return Err(error_response(StatusCode::BAD_REQUEST, "No file provided"));
        }
    };

    let mut file_bytes = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(FILE_FIELD) => {
                info!(
                    "Received file: {}",
                    field.file_name().unwrap_or("<unnamed>")
                );
                let bytes = field.bytes().await.map_err(|e| {
                    warn!("Failed to read uploaded file: {}", e);
                    error_response(StatusCode::BAD_REQUEST, format!("Failed to read file: {}", e))
                })?;
                file_bytes = Some(bytes);
                break;
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart body: {}", e);
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid multipart request: {}", e),
                ));
            }
        }
    }

    let Some(file_bytes) = file_bytes else {
        warn!("No file in request {}", request_id);
        return Err(error_response(StatusCode::BAD_REQUEST, "No file provided"));
    };

    let prediction = tokio::task::spawn_blocking(move || classifier.classify_bytes(&file_bytes))
        .await
        .map_err(|e| Error::internal(format!("inference task failed: {}", e)))
        .and_then(|result| result)
        .map_err(|e| {
            let status = e.status_code();
            let message = match &e {
                Error::InvalidImage(reason) => format!("Failed to open image: {}", reason),
                Error::Preprocess(_) => "Image processing failed".to_string(),
                other => format!("Prediction failed: {}", other),
            };
            if status.is_client_error() {
                warn!("Rejected upload in request {}: {}", request_id, e);
            } else {
                error!("Prediction request {} failed: {}", request_id, e);
            }
            error_response(status, message)
        })?;

    info!(
        "Prediction successful: {} ({:.2}%)",
        prediction.predicted_plant, prediction.accuracy
    );

    let plant_info = state.plant_info.lookup(&prediction.predicted_plant).await;
    let message = format!(
        "Identified plant as {} with {}% accuracy",
        prediction.predicted_plant, prediction.accuracy
    );

    Ok(Json(PredictResponse {
        prediction,
        plant_info,
        message,
    }))
}

pub async fn plant_info(
    State(state): State<AppState>,
    Path(plant_name): Path<String>,
) -> Json<PlantInfo> {
    info!("Received plant info request for: {}", plant_name);
    Json(state.plant_info.lookup(&plant_name).await)
}

/// `GET /plant-info/` with nothing after the slash.
pub async fn plant_info_without_name(State(state): State<AppState>) -> Json<PlantInfo> {
    warn!("Received plant info request without a plant name");
    Json(state.plant_info.lookup("").await)
}

pub async fn list_plants(State(state): State<AppState>) -> Json<PlantsResponse> {
    let plants: Vec<String> = state
        .classifier
        .as_ref()
        .map_or(PLANT_CLASS_NAMES, |classifier| classifier.labels())
        .iter()
        .map(|name| name.to_string())
        .collect();

    Json(PlantsResponse {
        status: "success".to_string(),
        count: plants.len(),
        plants,
    })
}
