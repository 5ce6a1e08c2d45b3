use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("Path has no drawable segments")]
    EmptyPath,

    #[error("Invalid stroke dash pattern: {0:?}")]
    InvalidDash(Vec<f32>),
}

pub type Result<T> = std::result::Result<T, CanvasError>;
