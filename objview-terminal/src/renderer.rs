/// ASCII rasterizer that draws a derived host buffer in the terminal
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix3, Matrix4, Vector3};
use objview_core::{triangle_normal, Camera, HostBuffer};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// How a triangle's brightness is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ShadingMode {
    /// Lambert term of the geometric face normal.
    #[default]
    Flat,
    /// Lambert term of the stored vertex normals, falling back to the face normal.
    Normal,
    /// Nearer surfaces are brighter.
    Depth,
}

impl ShadingMode {
    pub fn next(self) -> Self {
        match self {
            ShadingMode::Flat => ShadingMode::Normal,
            ShadingMode::Normal => ShadingMode::Depth,
            ShadingMode::Depth => ShadingMode::Flat,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShadingMode::Flat => "flat",
            ShadingMode::Normal => "normal",
            ShadingMode::Depth => "depth",
        }
    }
}

/// ASCII renderer that converts indexed triangle buffers to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Character at cell `(x, y)` of the last frame.
    pub fn cell(&self, x: usize, y: usize) -> char {
        self.char_buffer[y * self.width + x]
    }

    pub fn render_buffer(
        &mut self,
        buffer: &HostBuffer,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
        shading: ShadingMode,
    ) {
        let normal_matrix: Matrix3<f32> = model_matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let light_dir = (camera.position - camera.target)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);

        for face in 0..buffer.face_count() {
            self.render_triangle(
                buffer,
                face,
                model_matrix,
                &normal_matrix,
                &light_dir,
                camera,
                shading,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn render_triangle(
        &mut self,
        buffer: &HostBuffer,
        face: usize,
        model_matrix: &Matrix4<f32>,
        normal_matrix: &Matrix3<f32>,
        light_dir: &Vector3<f32>,
        camera: &Camera,
        shading: ShadingMode,
    ) {
        let corners = buffer.triangle(face);

        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (coord, corner) in screen_coords.iter_mut().zip(&corners) {
            let projected = camera.project_to_screen(
                corner,
                model_matrix,
                self.width as u32,
                self.height as u32,
            );
            match projected {
                Some(projected) => *coord = projected,
                None => return, // Triangle is clipped
            }
        }

        let face_normal = triangle_normal(&corners);
        let brightness = match shading {
            ShadingMode::Flat => lambert(normal_matrix * face_normal, light_dir),
            ShadingMode::Normal => {
                let normal = buffer.vertex_normal(face).unwrap_or(face_normal);
                lambert(normal_matrix * normal, light_dir)
            }
            ShadingMode::Depth => {
                let depth = (screen_coords[0].2 + screen_coords[1].2 + screen_coords[2].2) / 3.0;
                (1.0 - (depth + 1.0) * 0.5).clamp(0.0, 1.0)
            }
        };

        // Map brightness to character
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let char_index = char_index.clamp(1, LUMINOSITY_RAMP.len() - 1);
        let character = LUMINOSITY_RAMP[char_index];

        // Rasterize triangle using scanline algorithm
        self.rasterize_triangle(&screen_coords, character);
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates
                if let Some((w0, w1, w2)) = barycentric(
                    (v0.0, v0.1),
                    (v1.0, v1.1),
                    (v2.0, v2.1),
                    (px, py),
                ) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        // Interpolate depth
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;

                        let idx = y as usize * self.width + x as usize;
                        if depth < self.depth_buffer[idx] {
                            self.depth_buffer[idx] = depth;
                            self.char_buffer[idx] = character;
                        }
                    }
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.cell(x, y);

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Two-sided Lambert term
fn lambert(normal: Vector3<f32>, light_dir: &Vector3<f32>) -> f32 {
    normal
        .try_normalize(f32::EPSILON)
        .map(|n| n.dot(light_dir).abs())
        .unwrap_or(0.0)
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use objview_core::{BufferDevice, HostDevice, MeshGeometry, ModelTransform, VertexLayout};

    fn cube_buffer() -> HostBuffer {
        HostDevice::new()
            .upload(&MeshGeometry::cube(2.0), &VertexLayout::STANDARD)
            .unwrap()
    }

    #[test]
    fn test_barycentric_center() {
        let (w0, w1, w2) = barycentric((0.0, 0.0), (3.0, 0.0), (0.0, 3.0), (1.0, 1.0)).unwrap();
        assert!((w0 - 1.0 / 3.0).abs() < 1e-6);
        assert!((w1 - 1.0 / 3.0).abs() < 1e-6);
        assert!((w2 - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_barycentric_degenerate() {
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.5, 0.5)).is_none());
    }

    #[test]
    fn test_cube_covers_center_cell() {
        let mut renderer = AsciiRenderer::new(40, 20);
        let camera = Camera::new(40, 20);
        let model = ModelTransform::identity().model_matrix();

        for shading in [ShadingMode::Flat, ShadingMode::Normal, ShadingMode::Depth] {
            renderer.clear();
            renderer.render_buffer(&cube_buffer(), &model, &camera, shading);
            assert_ne!(renderer.cell(20, 10), ' ', "{} left the center empty", shading.name());
        }
    }

    #[test]
    fn test_clear_empties_frame() {
        let mut renderer = AsciiRenderer::new(10, 5);
        let camera = Camera::new(10, 5);
        renderer.render_buffer(&cube_buffer(), &Matrix4::identity(), &camera, ShadingMode::Flat);
        renderer.clear();
        assert!((0..5).all(|y| (0..10).all(|x| renderer.cell(x, y) == ' ')));
    }

    #[test]
    fn test_shading_modes_cycle() {
        let mut mode = ShadingMode::Flat;
        for _ in 0..3 {
            mode = mode.next();
        }
        assert_eq!(mode, ShadingMode::Flat);
    }
}
