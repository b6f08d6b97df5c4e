//! Components the renderer reads from scene entities, plus the engine-only
//! membership records it writes back after submission.

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::ecs::Entity;
use crate::geometry::{Shape, Vertex};

// ── Scene components ──────────────────────────────────────────────────────────

/// Display name of an entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag(pub String);

/// Position, Euler rotation in degrees, and scale.
///
/// The matrix is always derived from these three vectors.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Self::default() }
    }

    pub fn with_rotation(mut self, degrees: Vec3) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn quaternion(&self) -> Quat {
        let r = self.rotation;
        Quat::from_euler(EulerRot::XYZ, r.x.to_radians(), r.y.to_radians(), r.z.to_radians())
    }

    /// `translate * rotate * scale`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quaternion(), self.position)
    }
}

/// Geometry of one entity. `name` is the shape or asset it came from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Renderable {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Renderable {
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { name: name.into(), vertices, indices }
    }

    pub fn from_shape(shape: Shape) -> Self {
        Self::new(shape.name(), shape.vertices(), shape.indices())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

/// Flat RGBA material.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color(pub [f32; 4]);

impl Default for Color {
    fn default() -> Self {
        Color([0.5, 0.5, 0.5, 1.0])
    }
}

/// 2D texture material, identified by file path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Texture2D {
    pub path: String,
}

/// Cubemap material, identified by the directory holding its six faces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureCubemap {
    pub path: String,
}

/// Phong point light. Position comes from the entity's [`Transform`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub shininess: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            ambient: Vec3::splat(0.5),
            diffuse: Vec3::splat(0.9),
            specular: Vec3::splat(0.5),
            constant: 1.0,
            linear: 0.045,
            quadratic: 0.0075,
            shininess: 64.0,
        }
    }
}

/// Projection parameters of a camera.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    Perspective {
        /// Vertical field of view in degrees.
        fov: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    pub const DEFAULT_PERSPECTIVE: Projection = Projection::Perspective {
        fov: 45.0,
        aspect: 4.0 / 3.0,
        near: 0.01,
        far: 100.0,
    };

    pub const DEFAULT_ORTHOGRAPHIC: Projection = Projection::Orthographic {
        left: -10.0,
        right: 10.0,
        top: 10.0,
        bottom: -10.0,
        near: 0.01,
        far: 100.0,
    };
}

/// Marker substring that makes a camera the scene's main camera.
pub const MAIN_CAMERA_MARKER: &str = "main";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub id: String,
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            id: "secondary".to_string(),
            projection: Projection::DEFAULT_PERSPECTIVE,
        }
    }
}

impl Camera {
    pub fn main(projection: Projection) -> Self {
        Self { id: MAIN_CAMERA_MARKER.to_string(), projection }
    }

    pub fn is_main(&self) -> bool {
        self.id.contains(MAIN_CAMERA_MARKER)
    }
}

/// Path of a script attached to an entity. Never read by the renderer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub path: String,
}

/// Child handles owned by a parent entity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Children(pub Vec<Entity>);

// ── Engine-only records ───────────────────────────────────────────────────────

/// Which family of mesh batch an entity was placed in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    Color,
    Texture2D,
    Cubemap,
}

/// Where an entity's data lives inside a mesh batch.
///
/// Written during submission; only valid while `epoch` matches the
/// pipeline's current submission epoch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeshBatchMembership {
    pub kind: MaterialKind,
    pub batch: usize,
    pub slot: usize,
    pub vertices: std::ops::Range<usize>,
    pub indices: std::ops::Range<usize>,
    pub epoch: u64,
}

/// Slot of an entity inside the light batch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LightBatchMembership {
    pub slot: usize,
    pub epoch: u64,
}
