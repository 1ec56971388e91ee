use super::mocks::{FakeModel, MockLlmClient};
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use botanisnap::{
    classifier::Classifier,
    config::{Config, LlmConfig, LogsConfig, ModelConfig, ServerConfig},
    plant_info::PlantInfoService,
    server::{AppState, router},
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;

pub const BOUNDARY: &str = "botanisnap-test-boundary";

/// Create a test configuration with sensible defaults
pub fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5001,
            max_upload_bytes: 16 * 1024 * 1024,
            logs: LogsConfig {
                level: "debug".to_string(),
            },
        },
        model: ModelConfig {
            path: "model/plant_identification_model.onnx".to_string(),
            default_input_size: 224,
        },
        llm: LlmConfig {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            api_key: "test-api-key".to_string(),
            model: "gemini-2.0-flash".to_string(),
            system_prompt: None,
            temperature: 0.7,
            max_tokens: None,
        },
    }
}

/// Router wired with the given model (or none) and LLM double.
pub fn create_test_app(model: Option<FakeModel>, llm: MockLlmClient) -> Router {
    let classifier = model.map(|model| Arc::new(Classifier::new(model).unwrap()));
    let state = AppState {
        classifier,
        plant_info: Arc::new(PlantInfoService::new(Arc::new(llm))),
        llm_configured: true,
    };
    router(state, create_test_config().server.max_upload_bytes)
}

/// Encodes a deterministic gradient image in the given format.
pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 3 % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

pub fn png_image(width: u32, height: u32) -> Vec<u8> {
    encoded_image(width, height, ImageFormat::Png)
}

/// Builds a `multipart/form-data` body with a single file part.
pub fn multipart_body(field: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// `POST /predict` request carrying `bytes` in the named field.
pub fn predict_request(field: &str, bytes: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(
            field,
            "plant.png",
            "image/png",
            bytes,
        )))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
