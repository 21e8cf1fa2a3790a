/// Derived device buffers: layout descriptor, device seam and a host implementation
use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::error::Result;
use crate::geometry::MeshGeometry;

/// One per-vertex attribute stream of the derived buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub name: &'static str,
    /// Shader input location.
    pub location: u32,
    /// Number of `f32` components per vertex.
    pub components: u32,
}

/// Attribute layout of a derived buffer.
///
/// Each attribute lives in its own tightly packed `f32` stream; indices are
/// `u32` and describe a triangle list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub position: VertexAttribute,
    pub tex_coord: VertexAttribute,
    pub normal: VertexAttribute,
}

impl VertexLayout {
    pub const STANDARD: VertexLayout = VertexLayout {
        position: VertexAttribute {
            name: "position",
            location: 0,
            components: 3,
        },
        tex_coord: VertexAttribute {
            name: "texCoord",
            location: 1,
            components: 2,
        },
        normal: VertexAttribute {
            name: "normal",
            location: 2,
            components: 3,
        },
    };

    pub fn attributes(&self) -> [VertexAttribute; 3] {
        [self.position, self.tex_coord, self.normal]
    }
}

impl Default for VertexLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// A device that owns derived mesh buffers.
///
/// Buffers are created whole from a [`MeshGeometry`] and released whole;
/// there is no partial update path. Implementations must not leak device
/// resources when `upload` fails part way.
pub trait BufferDevice {
    type Buffer;

    /// Copy the geometry's four arrays to the device.
    fn upload(&mut self, geometry: &MeshGeometry, layout: &VertexLayout) -> Result<Self::Buffer>;

    /// Issue an indexed triangle-list draw of `buffer`.
    fn draw(&mut self, buffer: &Self::Buffer) -> Result<()>;

    /// Free the device resources behind `buffer`.
    fn release(&mut self, buffer: Self::Buffer);
}

impl<D: BufferDevice + ?Sized> BufferDevice for &mut D {
    type Buffer = D::Buffer;

    fn upload(&mut self, geometry: &MeshGeometry, layout: &VertexLayout) -> Result<Self::Buffer> {
        (**self).upload(geometry, layout)
    }

    fn draw(&mut self, buffer: &Self::Buffer) -> Result<()> {
        (**self).draw(buffer)
    }

    fn release(&mut self, buffer: Self::Buffer) {
        (**self).release(buffer)
    }
}

/// Buffer resident in host memory.
#[derive(Debug, Clone, PartialEq)]
pub struct HostBuffer {
    id: u64,
    layout: VertexLayout,
    positions: Vec<f32>,
    tex_coords: Vec<f32>,
    normals: Vec<f32>,
    indices: Vec<u32>,
}

impl HostBuffer {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
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

    /// Corner positions of triangle `face`.
    pub fn triangle(&self, face: usize) -> [Point3<f32>; 3] {
        let corner = |k: usize| {
            let v = self.indices[face * 3 + k] as usize * 3;
            Point3::new(self.positions[v], self.positions[v + 1], self.positions[v + 2])
        };
        [corner(0), corner(1), corner(2)]
    }

    /// Mean of the stored corner normals of triangle `face`, if any are set.
    pub fn vertex_normal(&self, face: usize) -> Option<Vector3<f32>> {
        let mut sum = Vector3::zeros();
        for k in 0..3 {
            let v = self.indices[face * 3 + k] as usize * 3;
            sum += Vector3::new(self.normals[v], self.normals[v + 1], self.normals[v + 2]);
        }
        sum.try_normalize(f32::EPSILON)
    }
}

/// Host-memory [`BufferDevice`].
///
/// Keeps counters of uploads, releases and draws so callers can check that
/// every buffer it hands out is returned.
#[derive(Debug, Default)]
pub struct HostDevice {
    next_id: u64,
    uploads: usize,
    releases: usize,
    draws: usize,
}

impl HostDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers uploaded and not yet released.
    pub fn live_buffers(&self) -> usize {
        self.uploads - self.releases
    }

    pub fn uploads(&self) -> usize {
        self.uploads
    }

    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl BufferDevice for HostDevice {
    type Buffer = HostBuffer;

    fn upload(&mut self, geometry: &MeshGeometry, layout: &VertexLayout) -> Result<HostBuffer> {
        let id = self.next_id;
        self.next_id += 1;
        self.uploads += 1;

        debug!(id, vertices = geometry.vertex_count(), "host buffer uploaded");
        Ok(HostBuffer {
            id,
            layout: *layout,
            positions: geometry.positions().to_vec(),
            tex_coords: geometry.tex_coords().to_vec(),
            normals: geometry.normals().to_vec(),
            indices: geometry.indices().to_vec(),
        })
    }

    fn draw(&mut self, _buffer: &HostBuffer) -> Result<()> {
        self.draws += 1;
        Ok(())
    }

    fn release(&mut self, buffer: HostBuffer) {
        self.releases += 1;
        debug!(id = buffer.id, "host buffer released");
    }
}
