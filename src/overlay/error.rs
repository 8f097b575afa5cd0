use thiserror::Error;

/// Failure of a single render call. No partial image is ever produced.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to load image: {0}")]
    ImageLoad(String),

    #[error("failed to load font: {0}")]
    FontLoad(String),

    #[error("invalid style: {0}")]
    InvalidStyle(String),

    #[error("failed to rasterize text layer: {0}")]
    Raster(String),

    #[error("failed to encode image: {0}")]
    Encode(String),
}
