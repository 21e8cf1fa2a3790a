/// Flat, upload-ready mesh arrays
use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, Result};

/// Unit cube corners, ordered so that bit 2 is x, bit 1 is y and bit 0 is z.
const CUBE_CORNERS: [[f32; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0],
    [0.0, 1.0, 1.0],
    [1.0, 0.0, 0.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 0.0],
    [1.0, 1.0, 1.0],
];

const CUBE_INDICES: [u32; 36] = [
    0, 6, 4, 0, 2, 6, // back
    0, 3, 2, 0, 1, 3, // left
    2, 7, 6, 2, 3, 7, // top
    4, 6, 7, 4, 7, 5, // right
    0, 4, 5, 0, 5, 1, // bottom
    1, 5, 7, 1, 7, 3, // front
];

/// Indexed triangle mesh stored as four flat arrays.
///
/// `positions` and `normals` hold three floats per vertex, `tex_coords`
/// two, and `indices` three per triangle. The vertex count is fixed at
/// construction; edits only ever rewrite position values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    positions: Vec<f32>,
    tex_coords: Vec<f32>,
    normals: Vec<f32>,
    indices: Vec<u32>,
}

impl MeshGeometry {
    /// Build a geometry from flat arrays, checking lengths and index range.
    pub fn from_arrays(
        positions: Vec<f32>,
        tex_coords: Vec<f32>,
        normals: Vec<f32>,
        indices: Vec<u32>,
    ) -> Result<Self> {
        if positions.len() % 3 != 0 {
            return Err(MeshError::format(
                0,
                format!("position array length {} is not a multiple of 3", positions.len()),
            ));
        }
        let vertex_count = positions.len() / 3;

        if tex_coords.len() != vertex_count * 2 {
            return Err(MeshError::format(
                0,
                format!(
                    "expected {} texture coordinate floats, got {}",
                    vertex_count * 2,
                    tex_coords.len()
                ),
            ));
        }
        if normals.len() != vertex_count * 3 {
            return Err(MeshError::format(
                0,
                format!("expected {} normal floats, got {}", vertex_count * 3, normals.len()),
            ));
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::format(
                0,
                format!("index array length {} is not a multiple of 3", indices.len()),
            ));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::format(
                0,
                format!("index {} out of range for {} vertices", bad, vertex_count),
            ));
        }

        Ok(Self {
            positions,
            tex_coords,
            normals,
            indices,
        })
    }

    /// The default mesh: a cube spanning `[0, 1]` on every axis.
    ///
    /// The eight corners are shared between faces and carry no texture
    /// coordinates or normals.
    pub fn unit_cube() -> Self {
        Self {
            positions: CUBE_CORNERS.iter().flatten().copied().collect(),
            tex_coords: vec![0.0; CUBE_CORNERS.len() * 2],
            normals: vec![0.0; CUBE_CORNERS.len() * 3],
            indices: CUBE_INDICES.to_vec(),
        }
    }

    /// The unit cube's topology, scaled to edge length `size` and centered
    /// on the origin.
    pub fn cube(size: f32) -> Self {
        let mut cube = Self::unit_cube();
        cube.map_positions(|p| Point3::from((p.coords - Vector3::repeat(0.5)) * size));
        cube
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn tex_coords(&self) -> &[f32] {
        &self.tex_coords
    }

    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Position of vertex `i`.
    pub fn position(&self, i: usize) -> Point3<f32> {
        Point3::new(
            self.positions[3 * i],
            self.positions[3 * i + 1],
            self.positions[3 * i + 2],
        )
    }

    /// Corner positions of triangle `face`.
    pub fn triangle(&self, face: usize) -> [Point3<f32>; 3] {
        let base = face * 3;
        [
            self.position(self.indices[base] as usize),
            self.position(self.indices[base + 1] as usize),
            self.position(self.indices[base + 2] as usize),
        ]
    }

    /// Axis-aligned bounding box, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let mut chunks = self.positions.chunks_exact(3);
        let first = chunks.next()?;
        let mut min = Point3::new(first[0], first[1], first[2]);
        let mut max = min;
        for p in chunks {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Some((min, max))
    }

    /// Rewrite every position in place. Vertex count cannot change.
    pub(crate) fn map_positions<F>(&mut self, mut f: F)
    where
        F: FnMut(Point3<f32>) -> Point3<f32>,
    {
        for p in self.positions.chunks_exact_mut(3) {
            let moved = f(Point3::new(p[0], p[1], p[2]));
            p[0] = moved.x;
            p[1] = moved.y;
            p[2] = moved.z;
        }
    }
}

/// Unit normal of a triangle from its winding, or zero when degenerate.
pub fn triangle_normal(corners: &[Point3<f32>; 3]) -> Vector3<f32> {
    let edge1 = corners[1] - corners[0];
    let edge2 = corners[2] - corners[0];

    edge1
        .cross(&edge2)
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshGeometry {
        MeshGeometry::from_arrays(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.0; 6],
            vec![0.0; 9],
            vec![0, 1, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_counts() {
        let mesh = triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.position(1), Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        let result = MeshGeometry::from_arrays(
            vec![0.0; 9],
            vec![0.0; 6],
            vec![0.0; 9],
            vec![0, 1, 3],
        );
        assert!(matches!(result, Err(MeshError::Format { .. })));
    }

    #[test]
    fn test_rejects_mismatched_attribute_lengths() {
        let result = MeshGeometry::from_arrays(vec![0.0; 9], vec![0.0; 4], vec![0.0; 9], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unit_cube_has_corner_at_origin() {
        let cube = MeshGeometry::unit_cube();
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.face_count(), 12);
        assert_eq!(cube.position(0), Point3::origin());
        assert_eq!(cube.position(6), Point3::new(1.0, 1.0, 0.0));
        assert_eq!(&cube.indices()[..6], &[0, 6, 4, 0, 2, 6]);
        let (min, max) = cube.bounds().unwrap();
        assert_eq!(min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_cube_keeps_unit_cube_topology() {
        assert_eq!(MeshGeometry::cube(3.0).indices(), MeshGeometry::unit_cube().indices());
    }

    #[test]
    fn test_cube() {
        let cube = MeshGeometry::cube(2.0);
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.face_count(), 12);
        let (min, max) = cube.bounds().unwrap();
        assert_eq!(min, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_cube_faces_point_outward() {
        let cube = MeshGeometry::cube(1.0);
        for face in 0..cube.face_count() {
            let corners = cube.triangle(face);
            let center = (corners[0].coords + corners[1].coords + corners[2].coords) / 3.0;
            let normal = triangle_normal(&corners);
            assert!(normal.dot(&center) > 0.0, "face {} points inward", face);
        }
    }

    #[test]
    fn test_triangle_normal() {
        let corners = triangle().triangle(0);
        let normal = triangle_normal(&corners);
        assert!((normal - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_degenerate_triangle_normal_is_zero() {
        let p = Point3::new(1.0, 1.0, 1.0);
        assert_eq!(triangle_normal(&[p, p, p]), Vector3::zeros());
    }
}
