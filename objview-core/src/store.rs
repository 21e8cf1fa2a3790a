/// Geometry store: owns mesh arrays and keeps the derived buffer in sync
use nalgebra::{Point3, Rotation3, Unit, Vector3};
use tracing::debug;

use crate::buffer::{BufferDevice, VertexLayout};
use crate::error::{MeshError, Result};
use crate::geometry::MeshGeometry;

/// Axes and normals shorter than this are rejected as degenerate.
pub const AXIS_EPSILON: f32 = 1e-6;

/// Sole owner of a [`MeshGeometry`] and of the device buffer derived from it.
///
/// Every edit rewrites the position array and then rebuilds the buffer from
/// scratch. The buffer is released when the store is disposed or dropped,
/// whichever comes first.
pub struct MeshStore<D: BufferDevice> {
    geometry: MeshGeometry,
    layout: VertexLayout,
    device: D,
    buffer: Option<D::Buffer>,
}

impl<D: BufferDevice> MeshStore<D> {
    /// Take ownership of `geometry` and upload its first buffer.
    pub fn new(geometry: MeshGeometry, device: D) -> Result<Self> {
        Self::with_layout(geometry, device, VertexLayout::STANDARD)
    }

    pub fn with_layout(geometry: MeshGeometry, device: D, layout: VertexLayout) -> Result<Self> {
        let mut store = Self {
            geometry,
            layout,
            device,
            buffer: None,
        };
        store.rebuild()?;
        Ok(store)
    }

    pub fn geometry(&self) -> &MeshGeometry {
        &self.geometry
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// The current derived buffer; `None` only after a failed rebuild.
    pub fn buffer(&self) -> Option<&D::Buffer> {
        self.buffer.as_ref()
    }

    /// Multiply every position componentwise by `(sx, sy, sz)`.
    pub fn scale(&mut self, sx: f32, sy: f32, sz: f32) -> Result<()> {
        self.geometry
            .map_positions(|p| Point3::new(p.x * sx, p.y * sy, p.z * sz));
        self.rebuild()
    }

    /// Add `delta` to every position.
    pub fn translate(&mut self, delta: Vector3<f32>) -> Result<()> {
        self.geometry.map_positions(|p| p + delta);
        self.rebuild()
    }

    /// Rotate every position counterclockwise about `axis` through the origin.
    ///
    /// The pivot is always the coordinate origin, not the mesh centroid.
    pub fn rotate(&mut self, axis: Vector3<f32>, angle_degrees: f32) -> Result<()> {
        let axis = Unit::try_new(axis, AXIS_EPSILON).ok_or(MeshError::DegenerateAxis {
            what: "rotation axis",
        })?;
        let rotation = Rotation3::from_axis_angle(&axis, angle_degrees.to_radians());

        self.geometry.map_positions(|p| rotation * p);
        self.rebuild()
    }

    /// Mirror every position across the plane through `point` with `normal`.
    pub fn reflect(&mut self, point: Point3<f32>, normal: Vector3<f32>) -> Result<()> {
        let n = normal
            .try_normalize(AXIS_EPSILON)
            .ok_or(MeshError::DegenerateAxis {
                what: "reflection normal",
            })?;

        self.geometry.map_positions(|p| {
            let distance = (p - point).dot(&n);
            p - n * (2.0 * distance)
        });
        self.rebuild()
    }

    /// Issue an indexed draw of the current buffer.
    pub fn draw(&mut self) -> Result<()> {
        match &self.buffer {
            Some(buffer) => self.device.draw(buffer),
            None => Err(MeshError::Device("no derived buffer to draw".to_string())),
        }
    }

    /// Replace the derived buffer with a fresh upload of the geometry.
    ///
    /// The old buffer is released before the upload, so a failed upload
    /// leaves the store without a buffer rather than with a stale one.
    pub fn rebuild(&mut self) -> Result<()> {
        self.release();
        let buffer = self.device.upload(&self.geometry, &self.layout)?;
        debug!(
            vertices = self.geometry.vertex_count(),
            faces = self.geometry.face_count(),
            "derived buffer rebuilt"
        );
        self.buffer = Some(buffer);
        Ok(())
    }

    /// Release the device buffer and drop the store.
    pub fn dispose(mut self) {
        self.release();
    }

    /// Release the device buffer and hand back the geometry.
    pub fn into_geometry(mut self) -> MeshGeometry {
        self.release();
        std::mem::take(&mut self.geometry)
    }

    fn release(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.device.release(buffer);
            debug!("derived buffer released");
        }
    }
}

impl<D: BufferDevice> Drop for MeshStore<D> {
    fn drop(&mut self) {
        self.release();
    }
}
