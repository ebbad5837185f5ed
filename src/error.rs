//! Error types for arix.
//!
//! Construction of fields and configs can fail; per-frame updates cannot.
//! GPU and window errors only surface from the viewer.

use thiserror::Error;

/// Invalid construction parameters or an unreadable scene config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A particle/instance count that must be positive was zero.
    #[error("{what} count must be greater than zero (got {count})")]
    InvalidCount { what: &'static str, count: usize },
    /// A radius, height or scale that must be positive and finite was not.
    #[error("{what} must be positive and finite (got {value})")]
    InvalidRadius { what: &'static str, value: f32 },
    /// A height or offset that must be finite was not.
    #[error("{what} must be finite (got {value})")]
    NonFinite { what: &'static str, value: f32 },
    /// A jitter or push-out distance was negative or not finite.
    #[error("{what} must be finite and non-negative (got {value})")]
    Negative { what: &'static str, value: f32 },
    /// A per-particle or per-instance position had a NaN or infinite component.
    #[error("{what} {index} has a non-finite position")]
    NonFinitePosition { what: &'static str, index: usize },
    /// A foliage seed fell outside `[0, 1)`.
    #[error("particle {index}: seed {value} is outside [0, 1)")]
    InvalidSeed { index: usize, value: f32 },
    /// An index outside `[0, total)` was passed to the spiral generator.
    #[error("index {index} is outside 0..{total}")]
    InvalidTotal { index: usize, total: usize },
    /// Per-particle buffers passed to a field had different lengths.
    #[error("buffer length mismatch: {what} has {found} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// The scene config was not valid JSON for [`SceneConfig`](crate::config::SceneConfig).
    #[error("failed to parse scene config: {0}")]
    Json(#[from] serde_json::Error),
    /// The scene config file could not be read.
    #[error("failed to read scene config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; a WebGPU/Vulkan/Metal/DX12 capable GPU is required")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
}

/// Errors that can occur while running the viewer.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Failed to create or run the event loop.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create the window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// The scene could not be built from its config.
    #[error("scene error: {0}")]
    Config(#[from] ConfigError),
}
