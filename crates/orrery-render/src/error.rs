//! Error types for the renderer

use thiserror::Error;

/// Result type for renderer operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Fatal renderer failures
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No GPU adapter available")]
    NoAdapter,

    #[error("Device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("Shader or pipeline validation failed: {0}")]
    Shader(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Renderer has been disposed")]
    Disposed,
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(err: wgpu::SurfaceError) -> Self {
        RenderError::Surface(err.to_string())
    }
}

impl From<wgpu::CreateSurfaceError> for RenderError {
    fn from(err: wgpu::CreateSurfaceError) -> Self {
        RenderError::Surface(err.to_string())
    }
}
