/// objview Web - WebGL2 buffer device and WASM bindings
///
/// The derived buffer of a mesh lives in a vertex array object with one
/// buffer per attribute plus an index buffer. Shader setup and uniform
/// binding stay on the JavaScript side; this crate hands over the matrices.

use objview_core::nalgebra::{Point3, Vector3};
use objview_core::{
    parse_obj, BufferDevice, Camera, MeshError, MeshGeometry, MeshStore, ModelTransform,
    VertexAttribute, VertexLayout,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as Gl, WebGlBuffer, WebGlVertexArrayObject,
};

/// Derived buffer resident on a WebGL2 context
pub struct GlBuffer {
    vao: WebGlVertexArrayObject,
    buffers: Vec<WebGlBuffer>,
    index_count: i32,
}

/// [`BufferDevice`] backed by a WebGL2 rendering context
pub struct GlDevice {
    gl: Gl,
}

impl GlDevice {
    pub fn new(gl: Gl) -> Self {
        Self { gl }
    }
}

/// GL objects created during an upload; deleted on drop unless finished.
struct PendingUpload<'a> {
    gl: &'a Gl,
    vao: Option<WebGlVertexArrayObject>,
    buffers: Vec<WebGlBuffer>,
}

impl<'a> PendingUpload<'a> {
    fn new(gl: &'a Gl) -> Self {
        Self {
            gl,
            vao: None,
            buffers: Vec::with_capacity(4),
        }
    }

    fn create_buffer(&mut self) -> objview_core::Result<WebGlBuffer> {
        let buffer = self
            .gl
            .create_buffer()
            .ok_or_else(|| MeshError::Device("failed to create WebGL buffer".to_string()))?;
        self.buffers.push(buffer.clone());
        Ok(buffer)
    }

    fn finish(mut self, index_count: i32) -> objview_core::Result<GlBuffer> {
        let vao = self.vao.take().ok_or_else(|| {
            MeshError::Device("upload finished without a vertex array".to_string())
        })?;
        Ok(GlBuffer {
            vao,
            buffers: std::mem::take(&mut self.buffers),
            index_count,
        })
    }
}

impl Drop for PendingUpload<'_> {
    fn drop(&mut self) {
        self.gl.bind_vertex_array(None);
        for buffer in &self.buffers {
            self.gl.delete_buffer(Some(buffer));
        }
        if let Some(vao) = &self.vao {
            self.gl.delete_vertex_array(Some(vao));
        }
    }
}

fn draw_count(indices: usize) -> objview_core::Result<i32> {
    i32::try_from(indices)
        .map_err(|_| MeshError::Device(format!("{} indices exceed the WebGL draw limit", indices)))
}

impl GlDevice {
    fn upload_attribute(
        &self,
        pending: &mut PendingUpload<'_>,
        attribute: &VertexAttribute,
        data: &[f32],
    ) -> objview_core::Result<()> {
        let buffer = pending.create_buffer()?;
        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));
        self.gl.buffer_data_with_u8_array(
            Gl::ARRAY_BUFFER,
            bytemuck::cast_slice(data),
            Gl::STATIC_DRAW,
        );
        self.gl.vertex_attrib_pointer_with_i32(
            attribute.location,
            attribute.components as i32,
            Gl::FLOAT,
            false,
            0,
            0,
        );
        self.gl.enable_vertex_attrib_array(attribute.location);
        Ok(())
    }
}

impl BufferDevice for GlDevice {
    type Buffer = GlBuffer;

    fn upload(
        &mut self,
        geometry: &MeshGeometry,
        layout: &VertexLayout,
    ) -> objview_core::Result<GlBuffer> {
        let index_count = draw_count(geometry.indices().len())?;
        let mut pending = PendingUpload::new(&self.gl);

        let vao = self
            .gl
            .create_vertex_array()
            .ok_or_else(|| MeshError::Device("failed to create vertex array".to_string()))?;
        self.gl.bind_vertex_array(Some(&vao));
        pending.vao = Some(vao);

        self.upload_attribute(&mut pending, &layout.position, geometry.positions())?;
        self.upload_attribute(&mut pending, &layout.tex_coord, geometry.tex_coords())?;
        self.upload_attribute(&mut pending, &layout.normal, geometry.normals())?;

        // The element binding is recorded in the vertex array
        let index_buffer = pending.create_buffer()?;
        self.gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&index_buffer));
        self.gl.buffer_data_with_u8_array(
            Gl::ELEMENT_ARRAY_BUFFER,
            bytemuck::cast_slice(geometry.indices()),
            Gl::STATIC_DRAW,
        );

        self.gl.bind_buffer(Gl::ARRAY_BUFFER, None);
        self.gl.bind_vertex_array(None);

        tracing::debug!(
            vertices = geometry.vertex_count(),
            indices = index_count,
            "WebGL buffers uploaded"
        );
        pending.finish(index_count)
    }

    fn draw(&mut self, buffer: &GlBuffer) -> objview_core::Result<()> {
        self.gl.bind_vertex_array(Some(&buffer.vao));
        self.gl
            .draw_elements_with_i32(Gl::TRIANGLES, buffer.index_count, Gl::UNSIGNED_INT, 0);
        self.gl.bind_vertex_array(None);
        Ok(())
    }

    fn release(&mut self, buffer: GlBuffer) {
        for vbo in &buffer.buffers {
            self.gl.delete_buffer(Some(vbo));
        }
        self.gl.delete_vertex_array(Some(&buffer.vao));
    }
}

fn to_js(err: MeshError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn context_for(canvas_id: &str) -> Result<(Gl, HtmlCanvasElement), JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document available"))?;
    let canvas = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| JsValue::from_str(&format!("no element with id '{}'", canvas_id)))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str(&format!("'{}' is not a canvas", canvas_id)))?;
    let gl = canvas
        .get_context("webgl2")?
        .ok_or_else(|| JsValue::from_str("WebGL2 is not supported"))?
        .dyn_into::<Gl>()
        .map_err(|_| JsValue::from_str("context is not WebGL2"))?;
    Ok((gl, canvas))
}

/// A mesh loaded from OBJ text and drawn on a WebGL2 canvas
#[wasm_bindgen]
pub struct WebViewer {
    store: MeshStore<GlDevice>,
    model: ModelTransform,
    camera: Camera,
}

#[wasm_bindgen]
impl WebViewer {
    /// Parse `obj_source` and upload it to the canvas' WebGL2 context
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, obj_source: &str) -> Result<WebViewer, JsValue> {
        let (gl, canvas) = context_for(canvas_id)?;
        let geometry = parse_obj(obj_source).map_err(to_js)?;
        let store = MeshStore::new(geometry, GlDevice::new(gl)).map_err(to_js)?;

        Ok(WebViewer {
            store,
            model: ModelTransform::identity(),
            camera: Camera::new(canvas.width(), canvas.height()),
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.store.geometry().vertex_count()
    }

    pub fn face_count(&self) -> usize {
        self.store.geometry().face_count()
    }

    pub fn scale(&mut self, sx: f32, sy: f32, sz: f32) -> Result<(), JsValue> {
        self.store.scale(sx, sy, sz).map_err(to_js)
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) -> Result<(), JsValue> {
        self.store.translate(Vector3::new(x, y, z)).map_err(to_js)
    }

    pub fn rotate(&mut self, ax: f32, ay: f32, az: f32, degrees: f32) -> Result<(), JsValue> {
        self.store
            .rotate(Vector3::new(ax, ay, az), degrees)
            .map_err(to_js)
    }

    pub fn reflect(
        &mut self,
        px: f32,
        py: f32,
        pz: f32,
        nx: f32,
        ny: f32,
        nz: f32,
    ) -> Result<(), JsValue> {
        self.store
            .reflect(Point3::new(px, py, pz), Vector3::new(nx, ny, nz))
            .map_err(to_js)
    }

    /// Place the mesh: position, uniform scale and Euler angles in degrees
    #[allow(clippy::too_many_arguments)]
    pub fn set_model(&mut self, x: f32, y: f32, z: f32, scale: f32, rx: f32, ry: f32, rz: f32) {
        self.model = ModelTransform::new(Point3::new(x, y, z), scale, Vector3::new(rx, ry, rz));
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
    }

    /// Column-major model-view matrix for the shader uniform
    pub fn model_view_matrix(&self) -> Vec<f32> {
        self.model
            .model_view_matrix(&self.camera.view_matrix())
            .as_slice()
            .to_vec()
    }

    /// Column-major projection matrix for the shader uniform
    pub fn projection_matrix(&self) -> Vec<f32> {
        self.camera.projection_matrix().as_slice().to_vec()
    }

    /// Draw the current buffer with whatever program is bound
    pub fn draw(&mut self) -> Result<(), JsValue> {
        self.store.draw().map_err(to_js)
    }

    /// Free the WebGL buffers
    pub fn dispose(self) {
        self.store.dispose();
    }
}
