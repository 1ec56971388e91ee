use crate::{classifier::Prediction, plant_info::PlantInfo};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub gemini_api: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(flatten)]
    pub prediction: Prediction,
    pub plant_info: PlantInfo,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlantsResponse {
    pub status: String,
    pub plants: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
