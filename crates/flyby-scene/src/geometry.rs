//! CPU-side geometry shared between scene nodes.

use glam::Vec3;

use flyby_render::VertexPositionNormalUv;

/// An indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    pub vertices: Vec<VertexPositionNormalUv>,
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    /// UV sphere centered on the origin.
    ///
    /// Produces `(width_segments + 1) * (height_segments + 1)` vertices, with a
    /// duplicated seam column and collapsed pole triangles skipped.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);

        let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
        let mut grid = Vec::with_capacity(height_segments as usize + 1);

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            // Center the pole vertex's u within its segment.
            let u_offset = if iy == 0 {
                0.5 / width_segments as f32
            } else if iy == height_segments {
                -0.5 / width_segments as f32
            } else {
                0.0
            };

            let mut row = Vec::with_capacity(width_segments as usize + 1);
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let phi = u * std::f32::consts::TAU;
                let theta = v * std::f32::consts::PI;

                let position = Vec3::new(
                    -radius * phi.cos() * theta.sin(),
                    radius * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                );
                let normal = position.normalize_or_zero();

                row.push(vertices.len() as u32);
                vertices.push(VertexPositionNormalUv {
                    position: position.to_array(),
                    normal: normal.to_array(),
                    uv: [u + u_offset, 1.0 - v],
                });
            }
            grid.push(row);
        }

        let mut indices = Vec::new();
        for iy in 0..height_segments as usize {
            for ix in 0..width_segments as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];

                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments as usize - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self { vertices, indices }
    }

    /// Replace every normal with the area-weighted average of its faces.
    pub fn compute_vertex_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= accum.len() || b >= accum.len() || c >= accum.len() {
                continue;
            }
            let pa = Vec3::from(self.vertices[a].position);
            let pb = Vec3::from(self.vertices[b].position);
            let pc = Vec3::from(self.vertices[c].position);
            let face = (pc - pb).cross(pa - pb);
            accum[a] += face;
            accum[b] += face;
            accum[c] += face;
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(accum) {
            vertex.normal = normal.normalize_or_zero().to_array();
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Largest vertex distance from the origin.
    pub fn bounding_radius(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| Vec3::from(v.position).length())
            .fold(0.0, f32::max)
    }
}

/// Unconnected points, drawn as screen-space dots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointsGeometry {
    pub positions: Vec<[f32; 3]>,
}

impl PointsGeometry {
    pub fn new(positions: Vec<[f32; 3]>) -> Self {
        Self { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn bounding_radius(&self) -> f32 {
        self.positions
            .iter()
            .map(|p| Vec3::from(*p).length())
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_vertex_and_index_counts() {
        let sphere = MeshGeometry::sphere(6371.0, 100, 50);
        assert_eq!(sphere.vertices.len(), 101 * 51);
        // Each pole row contributes one triangle per segment instead of two.
        assert_eq!(sphere.triangle_count(), 100 * (2 * 50 - 2));
        assert!(sphere.indices.iter().all(|&i| (i as usize) < sphere.vertices.len()));
    }

    #[test]
    fn test_sphere_vertices_lie_on_surface() {
        let sphere = MeshGeometry::sphere(10.0, 16, 8);
        for v in &sphere.vertices {
            let p = Vec3::from(v.position);
            assert!((p.length() - 10.0).abs() < 1e-4);
            let n = Vec3::from(v.normal);
            assert!((n - p / 10.0).length() < 1e-5);
        }
        assert!((sphere.bounding_radius() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_sphere_faces_point_outward() {
        let sphere = MeshGeometry::sphere(1.0, 12, 6);
        for tri in sphere.indices.chunks_exact(3) {
            let p: Vec<Vec3> = tri
                .iter()
                .map(|&i| Vec3::from(sphere.vertices[i as usize].position))
                .collect();
            let normal = (p[1] - p[0]).cross(p[2] - p[0]);
            let center = (p[0] + p[1] + p[2]) / 3.0;
            assert!(normal.dot(center) > 0.0);
        }
    }

    #[test]
    fn test_compute_vertex_normals_flat_quad() {
        let vertex = |x: f32, y: f32| VertexPositionNormalUv {
            position: [x, y, 0.0],
            ..Default::default()
        };
        let mut quad = MeshGeometry {
            vertices: vec![vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(1.0, 1.0), vertex(0.0, 1.0)],
            indices: vec![0, 1, 2, 0, 2, 3],
        };
        quad.compute_vertex_normals();
        for v in &quad.vertices {
            assert!((Vec3::from(v.normal) - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_compute_vertex_normals_skips_bad_indices() {
        let mut geometry = MeshGeometry {
            vertices: vec![VertexPositionNormalUv::default(); 2],
            indices: vec![0, 1, 7],
        };
        geometry.compute_vertex_normals();
        assert!(geometry.vertices.iter().all(|v| v.normal == [0.0; 3]));
    }

    #[test]
    fn test_points_bounding_radius() {
        let points = PointsGeometry::new(vec![[1.0, 0.0, 0.0], [0.0, -3.0, 4.0]]);
        assert_eq!(points.len(), 2);
        assert!((points.bounding_radius() - 5.0).abs() < 1e-6);
    }
}
