//! Root transforms handed to the traverser.
//!
//! Scaling lives here as its own step instead of being baked into vertex
//! buffers; callers compose it into the root transform.

use cgmath::{Deg, Matrix4, Point3, SquareMatrix, Vector3};

/// cgmath produces OpenGL clip space (z in -1..1); wgpu expects z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub fn identity() -> Matrix4<f32> {
    Matrix4::identity()
}

pub fn uniform_scale(factor: f32) -> Matrix4<f32> {
    Matrix4::from_scale(factor)
}

/// Rotation about the Y axis after `seconds` at `degrees_per_second`,
/// followed by a uniform scale. This is the demo spin.
pub fn spin(seconds: f32, degrees_per_second: f32, scale: f32) -> Matrix4<f32> {
    let angle = Deg((seconds * degrees_per_second) % 360.0);
    Matrix4::from_angle_y(angle) * uniform_scale(scale)
}

/// Perspective camera at `distance` on +Z looking at the origin.
pub fn view_projection(aspect: f32, distance: f32) -> Matrix4<f32> {
    let view = Matrix4::look_at_rh(
        Point3::new(0.0, 0.0, distance),
        Point3::new(0.0, 0.0, 0.0),
        Vector3::unit_y(),
    );
    let projection = cgmath::perspective(Deg(45.0), aspect.max(f32::EPSILON), 0.1, 100.0);
    OPENGL_TO_WGPU_MATRIX * projection * view
}
