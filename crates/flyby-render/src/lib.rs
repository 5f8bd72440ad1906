//! wgpu rendering for the flyby viewer: device and surface management, the
//! perspective camera, mesh and point pipelines, and the post-processing
//! composer with its scene and film-grain passes.

pub mod buffer;
pub mod camera;
pub mod color;
pub mod composer;
pub mod depth;
pub mod film;
pub mod frame;
pub mod gpu;
pub mod mesh_pipeline;
pub mod points_pipeline;
pub mod resizable;
pub mod texture;
pub mod viewport;

pub use buffer::{BufferAllocator, IndexData, MeshBuffer, PointsBuffer, VertexPositionNormalUv};
pub use camera::PerspectiveCamera;
pub use color::{hex_to_linear, srgb_to_linear};
pub use composer::{ComposerPass, EffectComposer, PassFrame, RenderTarget, SceneDrawer, ScenePass};
pub use depth::DepthBuffer;
pub use film::{FilmParams, FilmPass, film_grain};
pub use frame::{FogUniform, FrameBindings, FrameUniform, PointLightUniform};
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use mesh_pipeline::{MeshPipeline, MeshUniform, ObjectBinding};
pub use points_pipeline::{PointsPipeline, PointsUniform};
pub use resizable::Resizable;
pub use texture::{GpuTexture, TextureBinder, TextureError};
pub use viewport::Viewport;
