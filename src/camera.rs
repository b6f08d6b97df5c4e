use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::components::{Camera, Projection, Transform};

/// Camera block uploaded to the camera storage buffer (272 bytes).
///
/// Matrices are column-major, matching WGSL `mat4x4<f32>`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    /// World-space eye position; `w` is always 1.
    pub position: [f32; 4],
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub mvp: [[f32; 4]; 4],
}

/// Steepest pitch the resolver will look at; straight up or down would make
/// the forward vector parallel to world-up.
const PITCH_LIMIT_DEG: f32 = 89.9;

/// Forward vector for Euler rotation in degrees: yaw is `rotation.y`,
/// pitch is `rotation.x`, roll is ignored.
pub fn forward_from_euler(rotation: Vec3) -> Vec3 {
    let yaw = rotation.y.to_radians();
    let pitch = rotation.x.clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG).to_radians();
    Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
}

pub fn projection_matrix(projection: &Projection) -> Mat4 {
    match *projection {
        Projection::Perspective { fov, aspect, near, far } => {
            Mat4::perspective_rh(fov.to_radians(), aspect, near, far)
        }
        Projection::Orthographic { left, right, top, bottom, near, far } => {
            Mat4::orthographic_rh(left, right, bottom, top, near, far)
        }
    }
}

// ── RenderCamera ──────────────────────────────────────────────────────────────

/// Matrices derived from a camera's transform and projection parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderCamera {
    pub position: Vec3,
    pub forward: Vec3,
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub mvp: Mat4,
}

impl Default for RenderCamera {
    fn default() -> Self {
        Self::from_eye(Vec3::ZERO, Vec3::ZERO, &Projection::DEFAULT_PERSPECTIVE)
    }
}

impl RenderCamera {
    pub fn calculate(transform: &Transform, camera: &Camera) -> Self {
        Self::from_eye(transform.position, transform.rotation, &camera.projection)
    }

    /// Looks from `position` along the direction given by `rotation` (degrees).
    pub fn from_eye(position: Vec3, rotation: Vec3, projection: &Projection) -> Self {
        let forward = forward_from_euler(rotation);
        let view = Mat4::look_at_rh(position, position + forward, Vec3::Y);
        let projection = projection_matrix(projection);
        let model = Mat4::IDENTITY;
        Self {
            position,
            forward,
            model,
            view,
            projection,
            mvp: projection * view,
        }
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            position: self.position.extend(1.0).to_array(),
            model: self.model.to_cols_array_2d(),
            view: self.view.to_cols_array_2d(),
            projection: self.projection.to_cols_array_2d(),
            mvp: self.mvp.to_cols_array_2d(),
        }
    }
}

// ── Scene mode ────────────────────────────────────────────────────────────────

/// Mode of the surrounding editor/runtime.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneMode {
    #[default]
    Editor,
    Play,
    Pause,
}

/// Which camera drives the GPU camera buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CameraSource {
    /// The scene's main camera entity.
    Game,
    /// The editor's fly camera.
    Editor,
}

/// Play and Pause always use the game camera; Editor uses the fly camera
/// unless the user asked to look through the game camera.
pub fn resolve_camera_source(mode: SceneMode, use_game_camera: bool) -> CameraSource {
    match mode {
        SceneMode::Play | SceneMode::Pause => CameraSource::Game,
        SceneMode::Editor if use_game_camera => CameraSource::Game,
        SceneMode::Editor => CameraSource::Editor,
    }
}

// ── EditorCamera ──────────────────────────────────────────────────────────────

/// Free-flying camera the editor views the scene through.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EditorCamera {
    pub position: Vec3,
    /// Degrees around world-up.
    pub yaw: f32,
    /// Degrees above the horizon.
    pub pitch: f32,
    pub projection: Projection,
}

impl Default for EditorCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            yaw: -90.0,
            pitch: 0.0,
            projection: Projection::DEFAULT_PERSPECTIVE,
        }
    }
}

impl EditorCamera {
    pub fn forward(&self) -> Vec3 {
        forward_from_euler(Vec3::new(self.pitch, self.yaw, 0.0))
    }

    pub fn look(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch = (self.pitch + pitch_delta).clamp(-89.0, 89.0);
    }

    pub fn render_camera(&self) -> RenderCamera {
        RenderCamera::from_eye(self.position, Vec3::new(self.pitch, self.yaw, 0.0), &self.projection)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_272_bytes() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 272);
    }

    #[test]
    fn zero_rotation_looks_down_positive_x() {
        let f = forward_from_euler(Vec3::ZERO);
        assert!((f - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn vertical_pitch_stays_finite() {
        let cam = RenderCamera::from_eye(Vec3::ZERO, Vec3::new(90.0, 0.0, 0.0), &Projection::DEFAULT_PERSPECTIVE);
        assert!(cam.view.is_finite());
    }

    #[test]
    fn orthographic_maps_bounds_to_clip_edges() {
        let p = projection_matrix(&Projection::DEFAULT_ORTHOGRAPHIC);
        let clip = p.project_point3(Vec3::new(10.0, 10.0, -1.0));
        assert!((clip.x - 1.0).abs() < 1e-5);
        assert!((clip.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn editor_default_faces_negative_z() {
        let cam = EditorCamera::default();
        assert!((cam.forward() - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn editor_look_clamps_pitch() {
        let mut cam = EditorCamera::default();
        cam.look(0.0, 200.0);
        assert_eq!(cam.pitch, 89.0);
    }
}
