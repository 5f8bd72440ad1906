//! Perspective camera with a cached reverse-Z projection.

use glam::{Mat4, Quat, Vec3};

/// A perspective camera.
///
/// The projection matrix is cached: after changing `fov_y_degrees`,
/// `near`, `far` or `aspect` directly, call
/// [`update_projection_matrix`](Self::update_projection_matrix).
/// [`set_aspect_ratio`](Self::set_aspect_ratio) does both steps.
///
/// Depth is reverse-Z: the near plane maps to 1.0 and the far plane to 0.0,
/// which keeps precision usable across a 50 .. 1e7 clip range.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    /// World-space position.
    pub position: Vec3,
    /// Orientation as a unit quaternion.
    pub rotation: Quat,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Width / height.
    pub aspect: f32,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
    projection: Mat4,
}

impl PerspectiveCamera {
    /// Create a camera at the origin looking down -Z.
    pub fn new(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y_degrees,
            aspect,
            near,
            far,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recompute the cached projection matrix from the current parameters.
    pub fn update_projection_matrix(&mut self) {
        // far/near swapped for reverse-Z
        self.projection = Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.far,
            self.near,
        );
    }

    /// Set aspect = width / height and refresh the projection.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        self.aspect = width / height.max(f32::MIN_POSITIVE);
        self.update_projection_matrix();
    }

    /// The cached projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Compute the view matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }

    /// The forward direction vector (-Z in camera space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// The up direction vector (+Y in camera space).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// The right direction vector (+X in camera space).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Move along the camera's own axes.
    pub fn translate_local(&mut self, offset: Vec3) {
        self.position += self.rotation * offset;
    }

    /// Apply a rotation expressed in camera space.
    pub fn rotate_local(&mut self, delta: Quat) {
        self.rotation = (self.rotation * delta).normalize();
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(50.0, 1.0, 0.1, 2000.0)
    }
}
