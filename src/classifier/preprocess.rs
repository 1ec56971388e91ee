use crate::{Error, Result};
use image::{RgbImage, imageops::FilterType};
use tract_onnx::prelude::tract_ndarray::Array4;
use tracing::debug;

/// Spatial input size a model expects, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSize {
    pub width: u32,
    pub height: u32,
}

impl InputSize {
    pub fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }
}

/// Decodes uploaded bytes into an RGB image.
pub fn decode(bytes: &[u8]) -> Result<RgbImage> {
    if bytes.is_empty() {
        return Err(Error::invalid_image("uploaded file is empty"));
    }
    let image = image::load_from_memory(bytes).map_err(|e| Error::invalid_image(e.to_string()))?;
    debug!("Decoded image of {}x{}", image.width(), image.height());
    Ok(image.to_rgb8())
}

/// Resizes to `size` and lays the pixels out as a `(1, H, W, 3)` tensor in `[0, 1]`.
pub fn preprocess(image: &RgbImage, size: InputSize) -> Result<Array4<f32>> {
    if size.width == 0 || size.height == 0 {
        return Err(Error::preprocess(format!(
            "cannot resize to {}x{}",
            size.width, size.height
        )));
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::preprocess("source image has no pixels"));
    }

    debug!(
        "Resizing plant image from {}x{} to {}x{}",
        image.width(),
        image.height(),
        size.width,
        size.height
    );
    let resized = image::imageops::resize(image, size.width, size.height, FilterType::Triangle);

    let shape = (1, size.height as usize, size.width as usize, 3);
    Ok(Array4::from_shape_fn(shape, |(_, y, x, c)| {
        f32::from(resized.get_pixel(x as u32, y as u32)[c]) / 255.0
    }))
}
