//! Perspective camera shared between the scene and the pipeline.
//!
//! The scene side moves the camera freely; only viewport resizing changes its aspect
//! ratio, and with it the projection.

use glam::{Mat4, Vec3};

/// Construction parameters for [`PerspectiveCamera`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
        }
    }
}

pub struct PerspectiveCamera {
    fov_y: f32,
    near: f32,
    far: f32,
    aspect: f32,
    position: Vec3,
    target: Vec3,
    projection: Mat4,
}

impl PerspectiveCamera {
    /// Aspect starts at 1.0 until the first viewport resize.
    pub fn new(config: CameraConfig) -> Self {
        let mut camera = Self {
            fov_y: config.fov_y_degrees.to_radians(),
            near: config.near,
            far: config.far,
            aspect: 1.0,
            position: config.position,
            target: config.target,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    #[inline]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view()
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Written by viewport resizing only.
    pub(crate) fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection();
    }

    fn update_projection(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
    }
}
