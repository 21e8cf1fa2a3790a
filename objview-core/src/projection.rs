/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

use crate::transform::Transform;

/// Camera configuration for 3D rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: 60f32.to_radians(),
            aspect: aspect_ratio(width, height),
            near: 0.01,
            far: 1000.0,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    /// Move the eye and the target together, keeping the view direction.
    pub fn move_position(&mut self, dx: f32, dy: f32, dz: f32) {
        let offset = Vector3::new(dx, dy, dz);
        self.position += offset;
        self.target += offset;
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the perspective projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    /// Project a 3D point to 2D screen space.
    ///
    /// Returns `(x, y, depth)` with the origin at the top-left corner, or
    /// `None` when the point is behind the camera or outside the viewport.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let mvp =
            Transform::mvp_matrix(model_matrix, &self.view_matrix(), &self.projection_matrix());
        let clip = mvp * point.to_homogeneous();

        // Points at or behind the eye have no meaningful projection
        if clip.w < 1e-6 {
            return None;
        }

        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        let depth = clip.z / clip.w;

        // Clip test
        if !(-1.0..=1.0).contains(&ndc_x) || !(-1.0..=1.0).contains(&ndc_y) {
            return None;
        }

        // Convert to screen space
        let screen_x = (ndc_x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc_y) * 0.5 * height as f32;

        Some((screen_x, screen_y, depth))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(800, 600);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert!((camera.fov - std::f32::consts::FRAC_PI_3).abs() < 1e-6);
    }

    #[test]
    fn test_zero_height_viewport() {
        let camera = Camera::new(80, 0);
        assert!(camera.aspect.is_finite());
    }

    #[test]
    fn test_view_matrix_moves_target_to_negative_z() {
        let camera = Camera::new(800, 600);
        let p = camera.view_matrix().transform_point(&camera.target);
        assert!((p - Point3::new(0.0, 0.0, -5.0)).norm() < 1e-5);
    }

    #[test]
    fn test_target_projects_to_center() {
        let camera = Camera::new(100, 50);
        let (x, y, depth) = camera
            .project_to_screen(&Point3::origin(), &Matrix4::identity(), 100, 50)
            .unwrap();
        assert!((x - 50.0).abs() < 1e-3);
        assert!((y - 25.0).abs() < 1e-3);
        assert!(depth > -1.0 && depth < 1.0);
    }

    #[test]
    fn test_model_matrix_moves_projected_point() {
        let camera = Camera::new(100, 100);
        let model = Transform::translation_matrix(0.5, 0.0, 0.0);
        let (x, y, _) = camera
            .project_to_screen(&Point3::origin(), &model, 100, 100)
            .unwrap();

        let clip = Transform::mvp_matrix(&model, &camera.view_matrix(), &camera.projection_matrix())
            * Point3::<f32>::origin().to_homogeneous();
        let expected_x = (clip.x / clip.w + 1.0) * 0.5 * 100.0;
        assert!(x > 50.0);
        assert!((x - expected_x).abs() < 1e-3);
        assert!((y - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_point_behind_camera_is_rejected() {
        let camera = Camera::default();
        let behind = Point3::new(0.0, 0.0, 10.0);
        assert!(camera
            .project_to_screen(&behind, &Matrix4::identity(), 800, 600)
            .is_none());
    }

    #[test]
    fn test_move_position_keeps_direction() {
        let mut camera = Camera::default();
        let before = camera.target - camera.position;
        camera.move_position(1.0, 2.0, 3.0);
        assert_eq!(camera.target - camera.position, before);
        assert_eq!(camera.position, Point3::new(1.0, 2.0, 8.0));
    }
}
