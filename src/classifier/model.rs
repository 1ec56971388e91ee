use super::preprocess::InputSize;
use crate::{Error, Result};
use std::path::Path;
use tract_onnx::prelude::*;
use tracing::{debug, info};

/// A loaded classification network.
///
/// Implementations are immutable once constructed and are shared between
/// requests, hence `Send + Sync`.
pub trait ImageModel: Send + Sync {
    /// Spatial size the model expects for its `(1, H, W, 3)` input.
    fn input_size(&self) -> InputSize;

    /// Width of the output vector, when the model declares it.
    fn output_classes(&self) -> Option<usize>;

    /// Runs a single forward pass and returns the flattened output scores.
    fn run(&self, input: tract_ndarray::Array4<f32>) -> Result<Vec<f32>>;
}

type Plan = TypedRunnableModel<TypedModel>;

/// ONNX model executed with tract, expecting NHWC `f32` input.
pub struct OnnxModel {
    plan: Plan,
    input_size: InputSize,
    output_classes: Option<usize>,
}

impl OnnxModel {
    /// Loads and optimizes the model at `path`.
    ///
    /// Height and width are read from the model's declared input shape;
    /// `default_size` stands in for either one when it is symbolic or absent.
    pub fn load(path: impl AsRef<Path>, default_size: u32) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::model(format!(
                "Plant model file not found at {}",
                path.display()
            )));
        }

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| Error::model(format!("Failed to load ONNX model: {}", e)))?;
        let loaded = Self::from_inference_model(model, default_size)?;

        info!(
            "Plant identification model loaded from {} (input {}x{}, {} classes)",
            path.display(),
            loaded.input_size.width,
            loaded.input_size.height,
            loaded
                .output_classes
                .map_or_else(|| "unknown".to_string(), |n| n.to_string())
        );
        Ok(loaded)
    }

    /// Builds the model from an ONNX graph that is already in memory.
    pub fn from_proto(proto: &tract_onnx::pb::ModelProto, default_size: u32) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_proto_model(proto)
            .map_err(|e| Error::model(format!("Failed to load ONNX model: {}", e)))?;
        Self::from_inference_model(model, default_size)
    }

    fn from_inference_model(model: InferenceModel, default_size: u32) -> Result<Self> {
        // Symbolic or missing dimensions come back as None and take the default.
        let declared: TVec<TDim> = model
            .clone()
            .into_typed()
            .ok()
            .and_then(|typed| typed.input_fact(0).ok().map(|fact| fact.shape.to_tvec()))
            .unwrap_or_default();
        let declared_dim = |axis: usize| -> Option<u32> {
            declared
                .get(axis)
                .and_then(|dim| dim.to_i64().ok())
                .and_then(|dim| u32::try_from(dim).ok())
                .filter(|dim| *dim > 0)
        };
        let input_size = InputSize {
            height: declared_dim(1).unwrap_or(default_size),
            width: declared_dim(2).unwrap_or(default_size),
        };
        debug!(
            "Model input resolved to {}x{}",
            input_size.width, input_size.height
        );

        let optimized = model
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(
                        1,
                        input_size.height as usize,
                        input_size.width as usize,
                        3
                    ),
                ),
            )
            .map_err(|e| Error::model(format!("Failed to fix model input shape: {}", e)))?
            .into_optimized()
            .map_err(|e| Error::model(format!("Failed to optimize ONNX model: {}", e)))?;

        let output_classes = optimized
            .output_fact(0)
            .ok()
            .and_then(|fact| fact.shape.as_concrete().map(|dims| dims.to_vec()))
            .and_then(|dims| dims.last().copied());

        let plan = optimized
            .into_runnable()
            .map_err(|e| Error::model(format!("Failed to make model runnable: {}", e)))?;

        Ok(Self {
            plan,
            input_size,
            output_classes,
        })
    }
}

impl ImageModel for OnnxModel {
    fn input_size(&self) -> InputSize {
        self.input_size
    }

    fn output_classes(&self) -> Option<usize> {
        self.output_classes
    }

    fn run(&self, input: tract_ndarray::Array4<f32>) -> Result<Vec<f32>> {
        let outputs = self
            .plan
            .run(tvec!(Tensor::from(input).into()))
            .map_err(|e| Error::inference(e.to_string()))?;

        let scores = outputs
            .first()
            .ok_or_else(|| Error::inference("model produced no output"))?
            .to_array_view::<f32>()
            .map_err(|e| Error::inference(e.to_string()))?
            .iter()
            .copied()
            .collect();

        Ok(scores)
    }
}
