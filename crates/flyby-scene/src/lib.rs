//! Scene graph for the flyby viewer: nodes and materials, the sun, the
//! layered star field, the background model loader and the GPU-side
//! renderer that draws it all.

pub mod geometry;
pub mod loader;
pub mod material;
pub mod node;
pub mod renderer;
pub mod scene;
pub mod starfield;
pub mod sun;

pub use geometry::{MeshGeometry, PointsGeometry};
pub use loader::{AssetError, LoadedModel, ModelLoader, ModelRequest, PendingModel, load_model};
pub use material::{MeshMaterial, PointsMaterial, TextureImage, star_palette};
pub use node::{NodeKind, PointLight, SceneNode, Transform};
pub use renderer::SceneRenderer;
pub use scene::{Fog, Scene};
pub use starfield::{StarField, StarLayer};
pub use sun::build_sun;
