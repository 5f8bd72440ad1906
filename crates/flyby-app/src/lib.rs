//! The flyby viewer application: scene setup, the render loop, resize
//! handling and the winit event wiring that drives them.

pub mod clock;
pub mod context;
pub mod error;
pub mod platform;
pub mod render_loop;
pub mod renderer;
pub mod resize;
pub mod window;

pub use clock::FrameClock;
pub use context::SceneContext;
pub use error::AppError;
pub use platform::{PlatformDirs, PlatformError, resolve_dirs};
pub use render_loop::{CancellationToken, FrameStep, LoopState, RenderLoop};
pub use renderer::FrameRenderer;
pub use resize::handle_resize;
pub use window::{ConfigSource, FlybyApp, run};
