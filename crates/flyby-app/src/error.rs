//! Application-level errors.

use flyby_render::{RenderContextError, SurfaceError};

use crate::platform::PlatformError;

/// Anything that stops the viewer before the window is closed normally.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The winit event loop could not be created or failed while running.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("GPU initialization failed: {0}")]
    Render(#[from] RenderContextError),

    /// A frame could not be presented and the loop was stopped.
    #[error("rendering stopped: {0}")]
    Surface(#[from] SurfaceError),
}
