// =============================================================================
// GEOMETRY.RS: Vertex layout and built-in primitive shapes
//
// Every mesh that reaches a batch is expressed as a list of `Vertex` plus a
// `u32` index list. The built-in shapes below are pure data; meshes loaded
// from elsewhere only need to produce the same two arrays.
// =============================================================================

use serde::{Deserialize, Serialize};

/// One vertex as laid out in a batch's vertex buffer (36 bytes, 9 floats).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    /// Which sub-mesh of a batch this vertex belongs to. Overwritten on submit.
    pub shape_id: f32,
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,  // position
        1 => Float32x3,  // normal
        2 => Float32x2,  // uv
        3 => Float32,    // shape_id
    ];

    /// Number of `f32` values per vertex.
    pub const STRIDE: usize = 9;

    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, normal, uv, shape_id: 0.0 }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

// =============================================================================
// BUILT-IN SHAPES
// =============================================================================

/// Primitive shapes the engine can generate without any asset on disk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Cube,
    Pyramid,
    Wall,
    Surface,
}

impl Shape {
    pub const ALL: [Shape; 4] = [Shape::Cube, Shape::Pyramid, Shape::Wall, Shape::Surface];

    pub fn name(self) -> &'static str {
        match self {
            Shape::Cube => "Cube",
            Shape::Pyramid => "Pyramid",
            Shape::Wall => "Wall",
            Shape::Surface => "Surface",
        }
    }

    /// Case-sensitive lookup by the name returned from [`Shape::name`].
    pub fn from_name(name: &str) -> Option<Shape> {
        Shape::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn vertices(self) -> Vec<Vertex> {
        match self {
            Shape::Cube => CUBE_VERTICES.to_vec(),
            Shape::Pyramid => PYRAMID_VERTICES.to_vec(),
            Shape::Wall => WALL_VERTICES.to_vec(),
            Shape::Surface => SURFACE_VERTICES.to_vec(),
        }
    }

    pub fn indices(self) -> Vec<u32> {
        match self {
            Shape::Cube | Shape::Wall => BOX_INDICES.to_vec(),
            Shape::Pyramid => PYRAMID_INDICES.to_vec(),
            Shape::Surface => SURFACE_INDICES.to_vec(),
        }
    }
}

const fn v(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Vertex {
    Vertex::new(position, normal, uv)
}

#[rustfmt::skip]
const CUBE_VERTICES: [Vertex; 8] = [
    // front
    v([-1.0, -1.0,  1.0], [-1.0, -1.0,  2.0], [0.0, 0.0]),
    v([ 1.0, -1.0,  1.0], [ 2.0, -2.0,  1.0], [1.0, 0.0]),
    v([ 1.0,  1.0,  1.0], [ 1.0,  1.0,  2.0], [1.0, 1.0]),
    v([-1.0,  1.0,  1.0], [-2.0,  2.0,  1.0], [0.0, 1.0]),
    // back
    v([-1.0, -1.0, -1.0], [-2.0, -2.0, -1.0], [0.0, 0.0]),
    v([ 1.0, -1.0, -1.0], [ 1.0, -1.0, -2.0], [1.0, 0.0]),
    v([ 1.0,  1.0, -1.0], [ 2.0,  2.0, -1.0], [1.0, 1.0]),
    v([-1.0,  1.0, -1.0], [-1.0,  1.0, -2.0], [0.0, 1.0]),
];

#[rustfmt::skip]
const WALL_VERTICES: [Vertex; 8] = [
    v([-0.2, -1.0,  10.0], [-1.0, -1.0,  3.0], [0.0, 0.0]),
    v([ 0.2, -1.0,  10.0], [ 2.0, -2.0,  2.0], [0.0, 0.0]),
    v([ 0.2,  5.0,  10.0], [ 1.0,  1.0,  3.0], [1.0, 0.0]),
    v([-0.2,  5.0,  10.0], [-2.0,  2.0,  2.0], [1.0, 0.0]),
    v([-0.2, -1.0, -10.0], [-2.0, -2.0,  0.0], [0.0, 1.0]),
    v([ 0.2, -1.0, -10.0], [ 1.0, -1.0, -1.0], [0.0, 1.0]),
    v([ 0.2,  5.0, -10.0], [ 2.0,  2.0,  0.0], [1.0, 1.0]),
    v([-0.2,  5.0, -10.0], [-1.0,  1.0, -1.0], [1.0, 1.0]),
];

/// Shared by the cube and the wall: both are eight-corner boxes.
#[rustfmt::skip]
const BOX_INDICES: [u32; 36] = [
    0, 1, 2,  7, 6, 5, // front, back
    2, 3, 0,  5, 4, 7,
    1, 5, 6,  4, 0, 3, // right, left
    6, 2, 1,  3, 7, 4,
    4, 5, 1,  3, 2, 6, // bottom, top
    1, 0, 4,  6, 7, 3,
];

#[rustfmt::skip]
const SURFACE_VERTICES: [Vertex; 4] = [
    v([-15.0, -1.0,  15.0], [0.0, 2.0, 1.0], [0.0, 0.0]),
    v([ 15.0, -1.0,  15.0], [0.0, 1.0, 1.0], [0.0, 1.0]),
    v([ 15.0, -1.0, -15.0], [0.0, 2.0, 1.0], [1.0, 1.0]),
    v([-15.0, -1.0, -15.0], [0.0, 1.0, 1.0], [1.0, 0.0]),
];

const SURFACE_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

#[rustfmt::skip]
const PYRAMID_VERTICES: [Vertex; 5] = [
    v([-1.0, -1.0,  1.0], [-0.894427, 2.89443, 1.89443 ], [0.0, 0.0]),
    v([ 1.0, -1.0,  1.0], [ 0.894427, 1.89443, 1.89443 ], [0.0, 1.0]),
    v([ 1.0, -1.0, -1.0], [ 0.894427, 2.89443, 0.105573], [0.0, 0.0]),
    v([-1.0, -1.0, -1.0], [-0.894427, 1.89443, 0.105573], [0.0, 1.0]),
    v([ 0.0,  1.0,  0.0], [ 0.0,      1.78885, 1.0     ], [0.5, 0.5]),
];

#[rustfmt::skip]
const PYRAMID_INDICES: [u32; 18] = [
    0, 1, 2,  2, 3, 0, // base
    0, 1, 4,  1, 2, 4,
    2, 3, 4,  3, 0, 4,
];

// =============================================================================
// TESTS
// =============================================================================
