//! GPU buffer lifecycle for batches, the light list, and the camera.
//!
//! Mesh buffers are sized to the capacity ceilings rather than the current
//! contents, so every later patch is a write at `slot * element_size` and
//! never a reallocation.

use glam::Mat4;
use log::{debug, info, warn};

use crate::camera::CameraUniform;
use crate::error::RenderError;
use crate::geometry::Vertex;

use super::backend::{BufferDesc, BufferId, BufferUsage, GpuBackend};
use super::light_batch::{GpuPointLight, LightHeader, PointLightBatch};
use super::mesh_batch::{BatchEntry, BatchMaterial, MeshBatch};

pub const VERTEX_SIZE: u64 = std::mem::size_of::<Vertex>() as u64;
pub const INDEX_SIZE: u64 = std::mem::size_of::<u32>() as u64;
pub const TRANSFORM_SIZE: u64 = std::mem::size_of::<[f32; 16]>() as u64;
pub const COLOR_SIZE: u64 = std::mem::size_of::<[f32; 4]>() as u64;
pub const LIGHT_HEADER_SIZE: u64 = std::mem::size_of::<LightHeader>() as u64;
pub const LIGHT_SIZE: u64 = std::mem::size_of::<GpuPointLight>() as u64;
pub const CAMERA_SIZE: u64 = std::mem::size_of::<CameraUniform>() as u64;

/// Buffers backing one mesh batch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MeshBatchBuffers {
    pub vertex: BufferId,
    pub index: BufferId,
    pub transforms: BufferId,
    /// Only color batches carry a color buffer.
    pub colors: Option<BufferId>,
}

impl MeshBatchBuffers {
    pub fn ids(&self) -> impl Iterator<Item = BufferId> {
        [Some(self.vertex), Some(self.index), Some(self.transforms), self.colors]
            .into_iter()
            .flatten()
    }
}

fn matrix_bytes(m: &Mat4) -> [f32; 16] {
    m.to_cols_array()
}

// ── Mesh batches ──────────────────────────────────────────────────────────────

/// Allocates the buffers for `batch` and uploads its current contents.
///
/// On failure every buffer created by this call is destroyed again.
pub fn create_mesh_batch_buffers<B: GpuBackend, M: BatchMaterial>(
    backend: &mut B,
    batch: &MeshBatch<M>,
    label: &str,
) -> Result<MeshBatchBuffers, RenderError> {
    let mut created = Vec::with_capacity(4);
    let result = allocate_mesh_batch_buffers(backend, batch, label, &mut created)
        .and_then(|buffers| upload_mesh_batch(backend, &buffers, batch).map(|()| buffers));

    match result {
        Ok(buffers) => {
            info!(
                "created buffers for `{label}` ({} entities, {} verts, {} idx)",
                batch.len(),
                batch.vertices().len(),
                batch.indices().len()
            );
            Ok(buffers)
        }
        Err(e) => {
            warn!("buffers for `{label}` not created: {e}");
            for id in created {
                backend.destroy_buffer(id);
            }
            Err(e)
        }
    }
}

fn allocate_mesh_batch_buffers<B: GpuBackend, M: BatchMaterial>(
    backend: &mut B,
    batch: &MeshBatch<M>,
    label: &str,
    created: &mut Vec<BufferId>,
) -> Result<MeshBatchBuffers, RenderError> {
    let limits = batch.limits();
    let mut create = |suffix: &str, size: u64, usage: BufferUsage| -> Result<BufferId, RenderError> {
        let id = backend.create_buffer(&BufferDesc { label: format!("{label}_{suffix}"), size, usage })?;
        created.push(id);
        Ok(id)
    };

    let vertex = create("vertices", limits.max_vertices as u64 * VERTEX_SIZE, BufferUsage::Vertex)?;
    let index = create("indices", limits.max_indices as u64 * INDEX_SIZE, BufferUsage::Index)?;
    let transforms = create("transforms", limits.max_transforms as u64 * TRANSFORM_SIZE, BufferUsage::Storage)?;
    let colors = match batch.material_storage() {
        Some(_) => Some(create("colors", limits.max_transforms as u64 * COLOR_SIZE, BufferUsage::Storage)?),
        None => None,
    };
    Ok(MeshBatchBuffers { vertex, index, transforms, colors })
}

/// Writes the whole logical content of `batch` into `buffers`.
pub fn upload_mesh_batch<B: GpuBackend, M: BatchMaterial>(
    backend: &mut B,
    buffers: &MeshBatchBuffers,
    batch: &MeshBatch<M>,
) -> Result<(), RenderError> {
    backend.write_buffer(buffers.vertex, 0, bytemuck::cast_slice(batch.vertices()))?;
    backend.write_buffer(buffers.index, 0, bytemuck::cast_slice(batch.indices()))?;
    let transforms: Vec<[f32; 16]> = batch.transforms().iter().map(matrix_bytes).collect();
    backend.write_buffer(buffers.transforms, 0, bytemuck::cast_slice(&transforms))?;
    if let (Some(colors), Some(values)) = (buffers.colors, batch.material_storage()) {
        backend.write_buffer(colors, 0, bytemuck::cast_slice(&values))?;
    }
    Ok(())
}

pub fn release_mesh_batch_buffers<B: GpuBackend>(backend: &mut B, buffers: MeshBatchBuffers) {
    for id in buffers.ids() {
        backend.destroy_buffer(id);
    }
}

pub fn write_transform_slot<B: GpuBackend>(
    backend: &mut B,
    buffers: &MeshBatchBuffers,
    slot: usize,
    matrix: &Mat4,
) -> Result<(), RenderError> {
    let offset = slot as u64 * TRANSFORM_SIZE;
    debug!("patch transform slot {slot} at byte {offset}");
    backend.write_buffer(buffers.transforms, offset, bytemuck::cast_slice(&matrix_bytes(matrix)))
}

/// No-op for batches without a color buffer.
pub fn write_color_slot<B: GpuBackend>(
    backend: &mut B,
    buffers: &MeshBatchBuffers,
    slot: usize,
    color: [f32; 4],
) -> Result<(), RenderError> {
    let Some(colors) = buffers.colors else {
        return Ok(());
    };
    let offset = slot as u64 * COLOR_SIZE;
    debug!("patch color slot {slot} at byte {offset}");
    backend.write_buffer(colors, offset, bytemuck::cast_slice(&color))
}

/// Rewrites the vertex and index ranges of one batch entry.
pub fn write_geometry_range<B: GpuBackend>(
    backend: &mut B,
    buffers: &MeshBatchBuffers,
    entry: &BatchEntry,
    vertices: &[Vertex],
    indices: &[u32],
) -> Result<(), RenderError> {
    let v_offset = entry.vertices.start as u64 * VERTEX_SIZE;
    let i_offset = entry.indices.start as u64 * INDEX_SIZE;
    backend.write_buffer(buffers.vertex, v_offset, bytemuck::cast_slice(&vertices[entry.vertices.clone()]))?;
    backend.write_buffer(buffers.index, i_offset, bytemuck::cast_slice(&indices[entry.indices.clone()]))
}

// ── Lights ────────────────────────────────────────────────────────────────────

pub fn light_buffer_size(max_lights: usize) -> u64 {
    LIGHT_HEADER_SIZE + max_lights as u64 * LIGHT_SIZE
}

pub fn create_light_buffer<B: GpuBackend>(
    backend: &mut B,
    lights: &PointLightBatch,
    label: &str,
) -> Result<BufferId, RenderError> {
    let id = backend.create_buffer(&BufferDesc {
        label: format!("{label}_lights"),
        size: light_buffer_size(lights.capacity()),
        usage: BufferUsage::Storage,
    })?;
    if let Err(e) = upload_lights(backend, id, lights) {
        backend.destroy_buffer(id);
        return Err(e);
    }
    Ok(id)
}

/// Writes the header and every live light.
pub fn upload_lights<B: GpuBackend>(
    backend: &mut B,
    id: BufferId,
    lights: &PointLightBatch,
) -> Result<(), RenderError> {
    backend.write_buffer(id, 0, bytemuck::bytes_of(&lights.header()))?;
    backend.write_buffer(id, LIGHT_HEADER_SIZE, bytemuck::cast_slice(lights.lights()))
}

pub fn write_light_slot<B: GpuBackend>(
    backend: &mut B,
    id: BufferId,
    slot: usize,
    light: &GpuPointLight,
) -> Result<(), RenderError> {
    let offset = LIGHT_HEADER_SIZE + slot as u64 * LIGHT_SIZE;
    debug!("patch light slot {slot} at byte {offset}");
    backend.write_buffer(id, offset, bytemuck::bytes_of(light))
}

// ── Camera ────────────────────────────────────────────────────────────────────

pub fn create_camera_buffer<B: GpuBackend>(
    backend: &mut B,
    camera: &CameraUniform,
    label: &str,
) -> Result<BufferId, RenderError> {
    let id = backend.create_buffer(&BufferDesc {
        label: format!("{label}_camera"),
        size: CAMERA_SIZE,
        usage: BufferUsage::Storage,
    })?;
    if let Err(e) = write_camera(backend, id, camera) {
        backend.destroy_buffer(id);
        return Err(e);
    }
    Ok(id)
}

pub fn write_camera<B: GpuBackend>(
    backend: &mut B,
    id: BufferId,
    camera: &CameraUniform,
) -> Result<(), RenderError> {
    backend.write_buffer(id, 0, bytemuck::bytes_of(camera))
}
