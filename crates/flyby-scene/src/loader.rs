//! Background model loading.
//!
//! [`ModelLoader::spawn`] imports a glTF model and decodes its texture on a
//! dedicated thread. The main thread polls the returned [`PendingModel`]
//! once per frame and hands the outcome to
//! [`Scene::complete_model_load`](crate::Scene::complete_model_load).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use glam::{Quat, Vec3};

use flyby_render::VertexPositionNormalUv;

use crate::geometry::MeshGeometry;
use crate::material::{MeshMaterial, TextureImage};
use crate::node::{NodeKind, SceneNode, Transform};

/// Errors produced while loading a model.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The glTF document or its buffers could not be read.
    #[error("failed to import model {path}: {source}")]
    Import {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    /// The model has no triangle primitives.
    #[error("model {path} contains no triangle meshes")]
    NoMeshes { path: PathBuf },

    /// The texture could not be opened or decoded.
    #[error("failed to load texture {path}: {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The loader thread ended without reporting a result.
    #[error("model loader for {path} stopped without a result")]
    LoaderDisconnected { path: PathBuf },
}

/// What to load.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model_path: PathBuf,
    /// Color map applied to every mesh of the model.
    pub texture_path: Option<PathBuf>,
}

/// A fully imported model, not yet placed in a scene.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    /// Group holding the model's node hierarchy.
    pub root: SceneNode,
    pub texture: Option<Arc<TextureImage>>,
    pub source: PathBuf,
}

/// Starts background loads.
pub struct ModelLoader;

impl ModelLoader {
    /// Load `request` on a new thread.
    pub fn spawn(request: ModelRequest) -> PendingModel {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let path = request.model_path.clone();

        let spawned = std::thread::Builder::new()
            .name("model-loader".into())
            .spawn(move || {
                let result = load_model(&request);
                // The receiver is gone if the viewer shut down first.
                let _ = sender.send(result);
            });

        if let Err(e) = spawned {
            // The sender was dropped with the closure, so the first poll
            // reports the load as disconnected.
            tracing::error!("Failed to start model loader thread: {e}");
        } else {
            tracing::info!(path = %path.display(), "Model load started");
        }

        PendingModel {
            receiver,
            path,
            finished: false,
        }
    }
}

/// Handle to an in-flight load. Yields its outcome exactly once.
pub struct PendingModel {
    receiver: Receiver<Result<LoadedModel, AssetError>>,
    path: PathBuf,
    finished: bool,
}

impl PendingModel {
    /// Non-blocking check for the outcome.
    pub fn poll(&mut self) -> Option<Result<LoadedModel, AssetError>> {
        if self.finished {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(result) => self.finish(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => self.finish_disconnected(),
        }
    }

    /// Block for at most `timeout` waiting for the outcome.
    pub fn wait(&mut self, timeout: Duration) -> Option<Result<LoadedModel, AssetError>> {
        if self.finished {
            return None;
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => self.finish(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => self.finish_disconnected(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn finish(
        &mut self,
        result: Result<LoadedModel, AssetError>,
    ) -> Option<Result<LoadedModel, AssetError>> {
        self.finished = true;
        Some(result)
    }

    fn finish_disconnected(&mut self) -> Option<Result<LoadedModel, AssetError>> {
        self.finish(Err(AssetError::LoaderDisconnected {
            path: self.path.clone(),
        }))
    }
}

/// Import a model synchronously.
///
/// Images embedded in or referenced by the glTF are never read; the color
/// map comes from `texture_path` only. A texture that fails to load is
/// logged and the model is returned untextured.
pub fn load_model(request: &ModelRequest) -> Result<LoadedModel, AssetError> {
    let path = &request.model_path;
    let (document, buffers) = import_geometry(path).map_err(|source| AssetError::Import {
        path: path.clone(),
        source,
    })?;

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    let mut root = SceneNode::group(name);

    let scene = document.default_scene().or_else(|| document.scenes().next());
    let mut primitives = 0usize;
    match scene {
        Some(scene) => {
            for node in scene.nodes() {
                root.add_child(convert_node(&node, &buffers, &mut primitives));
            }
        }
        None => {
            // No scenes: fall back to every mesh at the origin.
            for mesh in document.meshes() {
                let mut node = SceneNode::group(mesh.name().unwrap_or("mesh").to_string());
                add_primitives(&mut node, &mesh, &buffers, &mut primitives);
                root.add_child(node);
            }
        }
    }

    if primitives == 0 {
        return Err(AssetError::NoMeshes { path: path.clone() });
    }

    let texture = request.texture_path.as_deref().and_then(|texture_path| {
        match load_texture(texture_path) {
            Ok(image) => Some(Arc::new(image)),
            Err(e) => {
                tracing::warn!("{e}; model will be untextured");
                None
            }
        }
    });

    tracing::debug!(path = %path.display(), primitives, "Model imported");

    Ok(LoadedModel {
        root,
        texture,
        source: path.clone(),
    })
}

/// Parse the document and load its buffers, skipping images.
fn import_geometry(path: &Path) -> Result<(gltf::Document, Vec<gltf::buffer::Data>), gltf::Error> {
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("./"));
    let buffers = gltf::import_buffers(&document, Some(base), blob)?;
    Ok((document, buffers))
}

/// Decode an image file into RGBA8.
pub fn load_texture(path: &Path) -> Result<TextureImage, AssetError> {
    let image = image::open(path)
        .map_err(|source| AssetError::Texture {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    Ok(TextureImage {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn convert_node(node: &gltf::Node<'_>, buffers: &[gltf::buffer::Data], primitives: &mut usize) -> SceneNode {
    let (translation, rotation, scale) = node.transform().decomposed();
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node-{}", node.index()));

    let mut out = SceneNode::group(name).with_transform(Transform {
        position: Vec3::from(translation),
        rotation: Quat::from_array(rotation),
        scale: Vec3::from(scale),
    });

    if let Some(mesh) = node.mesh() {
        add_primitives(&mut out, &mesh, buffers, primitives);
    }
    for child in node.children() {
        out.add_child(convert_node(&child, buffers, primitives));
    }
    out
}

fn add_primitives(
    parent: &mut SceneNode,
    mesh: &gltf::Mesh<'_>,
    buffers: &[gltf::buffer::Data],
    primitives: &mut usize,
) {
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            tracing::warn!(mode = ?primitive.mode(), "Skipping non-triangle primitive");
            continue;
        }
        let Some(geometry) = read_primitive(&primitive, buffers) else {
            tracing::warn!(mesh = mesh.index(), "Skipping primitive without positions");
            continue;
        };

        let pbr = primitive.material().pbr_metallic_roughness();
        let [r, g, b, _] = pbr.base_color_factor();
        let material = MeshMaterial {
            color: [r, g, b],
            emissive: primitive.material().emissive_factor(),
            ..MeshMaterial::default()
        };

        parent.add_child(SceneNode::new(
            format!("{}-{}", mesh.name().unwrap_or("mesh"), primitive.index()),
            NodeKind::Mesh {
                geometry: Arc::new(geometry),
                material,
            },
        ));
        *primitives += 1;
    }
}

fn read_primitive(primitive: &gltf::Primitive<'_>, buffers: &[gltf::buffer::Data]) -> Option<MeshGeometry> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    if positions.is_empty() {
        return None;
    }

    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|n| n.collect());
    let uvs: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().collect())
        .unwrap_or_default();

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32 - (positions.len() % 3) as u32).collect(),
    };

    let has_normals = normals.as_ref().is_some_and(|n| n.len() == positions.len());
    let vertices = positions
        .iter()
        .enumerate()
        .map(|(i, position)| VertexPositionNormalUv {
            position: *position,
            normal: normals
                .as_ref()
                .and_then(|n| n.get(i).copied())
                .unwrap_or_default(),
            uv: uvs.get(i).copied().unwrap_or_default(),
        })
        .collect();

    let mut geometry = MeshGeometry { vertices, indices };
    if !has_normals {
        geometry.compute_vertex_normals();
    }
    Some(geometry)
}
