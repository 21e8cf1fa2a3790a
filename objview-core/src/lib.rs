/// objview Core Library - OBJ import and editable, upload-ready geometry
///
/// This library turns face-indexed OBJ text into unified vertex/index
/// arrays, owns those arrays behind a store that applies positional edits,
/// and keeps a derived device buffer rebuilt after every edit.

pub mod buffer;
pub mod error;
pub mod geometry;
pub mod obj;
pub mod projection;
pub mod store;
pub mod transform;

// Re-export commonly used types
pub use buffer::{BufferDevice, HostBuffer, HostDevice, VertexAttribute, VertexLayout};
pub use error::{MeshError, Result};
pub use geometry::{triangle_normal, MeshGeometry};
pub use obj::{import_mesh, import_mesh_with, parse_obj, ImportOptions};
pub use projection::Camera;
pub use store::MeshStore;
pub use transform::{ModelTransform, Transform};

// Re-export nalgebra for callers building vectors and points
pub use nalgebra;
