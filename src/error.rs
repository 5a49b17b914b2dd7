use std::path::PathBuf;

/// Errors raised around the filter: loading images, parsing palettes and
/// config, and talking to the GPU. The filter itself never fails.
#[derive(thiserror::Error, Debug)]
pub enum RemapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid color '{0}': expected #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),

    #[error("invalid palette: {0}")]
    InvalidPalette(String),

    #[error("no palette named '{name}' in {dir:?}")]
    UnknownPalette { name: String, dir: PathBuf },

    #[error("GPU error: {0}")]
    Gpu(String),
}

impl RemapError {
    pub fn gpu<T: ToString>(msg: T) -> Self {
        RemapError::Gpu(msg.to_string())
    }

    pub fn invalid_palette<T: ToString>(msg: T) -> Self {
        RemapError::InvalidPalette(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RemapError>;
