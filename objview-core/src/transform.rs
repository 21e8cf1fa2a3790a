/// Model transforms for placing a mesh in the scene
use nalgebra::{Matrix4, Point3, Vector3};

/// Placement of a mesh in the scene.
///
/// Unlike the edits on [`crate::MeshStore`], these never touch geometry;
/// they only feed the model matrix handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    pub position: Point3<f32>,
    /// Uniform scale factor.
    pub scale: f32,
    /// Euler angles in degrees about x, y and z.
    pub rotation: Vector3<f32>,
}

impl ModelTransform {
    pub fn new(position: Point3<f32>, scale: f32, rotation: Vector3<f32>) -> Self {
        Self {
            position,
            scale,
            rotation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Point3::origin(), 1.0, Vector3::zeros())
    }

    pub fn translate_by(&mut self, dx: f32, dy: f32, dz: f32) {
        self.position += Vector3::new(dx, dy, dz);
    }

    pub fn scale_by(&mut self, delta: f32) {
        self.scale += delta;
    }

    /// Rotate by delta amounts (in degrees)
    pub fn rotate_by(&mut self, dx: f32, dy: f32, dz: f32) {
        self.rotation += Vector3::new(dx, dy, dz);
    }

    /// `T(position) · Rx(-rx) · Ry(-ry) · Rz(-rz) · S(scale)`
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Transform::translation_matrix(self.position.x, self.position.y, self.position.z)
            * Transform::rotation_matrix(&self.rotation)
            * Transform::scale_matrix(self.scale)
    }

    pub fn model_view_matrix(&self, view: &Matrix4<f32>) -> Matrix4<f32> {
        view * self.model_matrix()
    }
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Rotation from Euler angles in degrees, applied with negated angles
    /// in x, y, z order.
    pub fn rotation_matrix(degrees: &Vector3<f32>) -> Matrix4<f32> {
        let rx = Matrix4::from_axis_angle(&Vector3::x_axis(), (-degrees.x).to_radians());
        let ry = Matrix4::from_axis_angle(&Vector3::y_axis(), (-degrees.y).to_radians());
        let rz = Matrix4::from_axis_angle(&Vector3::z_axis(), (-degrees.z).to_radians());

        rx * ry * rz
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a uniform scale matrix
    pub fn scale_matrix(scale: f32) -> Matrix4<f32> {
        Matrix4::new_scaling(scale)
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_close(a: Point3<f32>, b: Point3<f32>) {
        assert!((a - b).norm() < 1e-5, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_identity_model_matrix() {
        let model = ModelTransform::identity().model_matrix();
        assert!((model - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_rotation_angles_are_negated() {
        let mut transform = ModelTransform::identity();
        transform.rotate_by(0.0, 0.0, 90.0);
        let p = transform.model_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_point_close(p, Point3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_x_rotation_applies_last() {
        // Rz is applied to the point before Rx
        let rotation = Transform::rotation_matrix(&Vector3::new(90.0, 0.0, 90.0));
        let p = rotation.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_point_close(p, Point3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_scale_then_translate() {
        let mut transform = ModelTransform::new(Point3::new(1.0, 2.0, 3.0), 1.0, Vector3::zeros());
        transform.scale_by(1.0);
        let p = transform.model_matrix().transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert_point_close(p, Point3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn test_translate_by_accumulates() {
        let mut transform = ModelTransform::identity();
        transform.translate_by(0.5, 0.0, 0.0);
        transform.translate_by(0.5, -1.0, 0.0);
        assert_eq!(transform.position, Point3::new(1.0, -1.0, 0.0));
    }

    #[test]
    fn test_mvp_applies_model_then_view_then_projection() {
        let model = Transform::translation_matrix(1.0, 0.0, 0.0);
        let view = Transform::translation_matrix(0.0, 0.0, -5.0);
        let projection = Transform::scale_matrix(2.0);

        let mvp = Transform::mvp_matrix(&model, &view, &projection);
        let p = mvp.transform_point(&Point3::origin());
        assert_point_close(p, Point3::new(2.0, 0.0, -10.0));
    }

    #[test]
    fn test_model_view_composes_view_first() {
        let transform = ModelTransform::new(Point3::new(1.0, 0.0, 0.0), 1.0, Vector3::zeros());
        let view = Transform::translation_matrix(0.0, 0.0, -5.0);
        let p = transform
            .model_view_matrix(&view)
            .transform_point(&Point3::origin());
        assert_point_close(p, Point3::new(1.0, 0.0, -5.0));
    }
}
