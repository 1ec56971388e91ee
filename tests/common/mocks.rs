use async_trait::async_trait;
use botanisnap::{
    Error, Result,
    classifier::{ImageModel, InputSize, PLANT_CLASS_NAMES},
    llm::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, LlmClient},
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tract_onnx::prelude::tract_ndarray::Array4;

/// Mock LLM client for testing
#[derive(Debug, Clone)]
pub struct MockLlmClient {
    pub reply: Option<String>,
    pub requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
    pub error: Option<String>,
}

impl MockLlmClient {
    /// Answers every request with the same text.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            requests: Arc::new(Mutex::new(Vec::new())),
            error: None,
        }
    }

    /// Fails every request, as an unreachable service would.
    pub fn failing(error: impl Into<String>) -> Self {
        Self {
            reply: None,
            requests: Arc::new(Mutex::new(Vec::new())),
            error: Some(error.into()),
        }
    }

    pub fn get_requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn create_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.requests.lock().unwrap().push(request);

        if let Some(ref error) = self.error {
            return Err(Error::llm(error.clone()));
        }

        Ok(ChatCompletionResponse {
            choices: vec![Choice {
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content: self.reply.clone().unwrap_or_default(),
                },
            }],
        })
    }
}

/// Model double returning canned scores for any input of the right shape.
#[derive(Debug, Clone)]
pub struct FakeModel {
    pub scores: Vec<f32>,
    pub input_size: InputSize,
    pub error: Option<String>,
    pub runs: Arc<AtomicUsize>,
}

impl FakeModel {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            input_size: InputSize::square(224),
            error: None,
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(error: impl Into<String>) -> Self {
        let mut model = Self::new(peaked_scores(&[(0, 0.9)]));
        model.error = Some(error.into());
        model
    }

    pub fn with_input_size(mut self, input_size: InputSize) -> Self {
        self.input_size = input_size;
        self
    }

    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl ImageModel for FakeModel {
    fn input_size(&self) -> InputSize {
        self.input_size
    }

    fn output_classes(&self) -> Option<usize> {
        Some(PLANT_CLASS_NAMES.len())
    }

    fn run(&self, input: Array4<f32>) -> Result<Vec<f32>> {
        self.runs.fetch_add(1, Ordering::SeqCst);

        let expected = [
            1,
            self.input_size.height as usize,
            self.input_size.width as usize,
            3,
        ];
        if input.shape() != &expected[..] {
            return Err(Error::inference(format!(
                "unexpected input shape {:?}",
                input.shape()
            )));
        }
        if input.iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(Error::inference("input not normalized"));
        }
        if let Some(ref error) = self.error {
            return Err(Error::inference(error.clone()));
        }

        Ok(self.scores.clone())
    }
}

/// Probability vector over all plant classes with the given peaks; the
/// remaining mass is spread evenly over the other classes.
pub fn peaked_scores(peaks: &[(usize, f32)]) -> Vec<f32> {
    let n = PLANT_CLASS_NAMES.len();
    let peak_mass: f32 = peaks.iter().map(|(_, p)| p).sum();
    let rest = (1.0 - peak_mass).max(0.0) / (n - peaks.len()) as f32;

    let mut scores = vec![rest; n];
    for &(index, p) in peaks {
        scores[index] = p;
    }
    scores
}
