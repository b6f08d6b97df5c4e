//! Batch selection and ownership of every batch's GPU buffers.

use glam::Mat4;
use log::{debug, info, warn};

use crate::camera::{CameraUniform, RenderCamera};
use crate::components::{
    Camera, Color, LightBatchMembership, MaterialKind, MeshBatchMembership, Renderable, Texture2D,
    TextureCubemap, Transform,
};
use crate::ecs::{ComponentAccess, Entity};
use crate::error::RenderError;

use super::backend::{BufferId, GpuBackend};
use super::buffers;
use super::light_batch::PointLightBatch;
use super::limits::BatchLimits;
use super::mesh_batch::{
    BatchMaterial, ColorBatch, ColorMaterial, CubemapBatch, CubemapMaterial, MeshBatch,
    Texture2DBatch, TextureMaterial,
};

/// Material batch an entity belongs in, by priority Color > Texture2D > Cubemap.
/// `None` when it has no renderable or no material.
pub fn material_kind_of<S: ComponentAccess>(store: &S, entity: Entity) -> Option<MaterialKind> {
    if !store.has::<Renderable>(entity) {
        return None;
    }
    if store.has::<Color>(entity) {
        Some(MaterialKind::Color)
    } else if store.has::<Texture2D>(entity) {
        Some(MaterialKind::Texture2D)
    } else if store.has::<TextureCubemap>(entity) {
        Some(MaterialKind::Cubemap)
    } else {
        None
    }
}

// ── BatchSet ──────────────────────────────────────────────────────────────────

/// All batches of one material kind, in creation order.
pub struct BatchSet<M: BatchMaterial> {
    limits: BatchLimits,
    batches: Vec<MeshBatch<M>>,
}

impl<M: BatchMaterial> BatchSet<M> {
    fn new(limits: BatchLimits) -> Self {
        Self { limits, batches: Vec::new() }
    }

    pub fn batches(&self) -> &[MeshBatch<M>] {
        &self.batches
    }

    /// First batch that accepts `entity`, or a freshly appended one.
    pub fn find_or_create<S: ComponentAccess>(&mut self, store: &S, entity: Entity) -> (usize, &mut MeshBatch<M>) {
        let index = match self.batches.iter().position(|b| b.can_accept(store, entity)) {
            Some(i) => i,
            None => {
                debug!("opening {:?} batch #{}", M::KIND, self.batches.len());
                self.batches.push(MeshBatch::new(self.limits));
                self.batches.len() - 1
            }
        };
        (index, &mut self.batches[index])
    }

    fn submit<S: ComponentAccess>(&mut self, store: &S, entity: Entity, epoch: u64) -> Option<MeshBatchMembership> {
        let (batch_index, batch) = self.find_or_create(store, entity);
        if !batch.can_accept(store, entity) {
            warn!("{:?} entity {:?} exceeds the capacity of an empty batch; skipped", M::KIND, entity);
            if batch.is_empty() {
                self.batches.pop();
            }
            return None;
        }
        let slot = batch.submit_entity(store, entity)?;
        let entry = batch.entry(slot)?.clone();
        Some(MeshBatchMembership {
            kind: M::KIND,
            batch: batch_index,
            slot,
            vertices: entry.vertices,
            indices: entry.indices,
            epoch,
        })
    }

    fn create_buffers<B: GpuBackend>(&mut self, backend: &mut B, label: &str) -> Result<(), RenderError> {
        for (i, batch) in self.batches.iter_mut().enumerate() {
            let label = format!("{label}_{:?}{i}", M::KIND).to_lowercase();
            batch.buffers = Some(buffers::create_mesh_batch_buffers(backend, batch, &label)?);
        }
        Ok(())
    }

    fn release_buffers<B: GpuBackend>(&mut self, backend: &mut B) {
        for batch in &mut self.batches {
            if let Some(b) = batch.buffers.take() {
                buffers::release_mesh_batch_buffers(backend, b);
            }
        }
    }

    fn batch_mut(&mut self, membership: &MeshBatchMembership) -> Option<&mut MeshBatch<M>> {
        self.batches.get_mut(membership.batch)
    }

    fn patch_transform<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        membership: &MeshBatchMembership,
        matrix: Mat4,
    ) -> Result<bool, RenderError> {
        let Some(batch) = self.batch_mut(membership) else {
            return Ok(false);
        };
        if !batch.update_transform(membership.slot, matrix) {
            return Ok(false);
        }
        if let Some(gpu) = batch.buffers {
            buffers::write_transform_slot(backend, &gpu, membership.slot, &matrix)?;
        }
        Ok(true)
    }

    fn patch_geometry<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        membership: &MeshBatchMembership,
        renderable: &Renderable,
    ) -> Result<bool, RenderError> {
        let Some(batch) = self.batch_mut(membership) else {
            return Ok(false);
        };
        if !batch.update_geometry(membership.slot, renderable) {
            return Ok(false);
        }
        if let (Some(gpu), Some(entry)) = (batch.buffers, batch.entry(membership.slot)) {
            buffers::write_geometry_range(backend, &gpu, entry, batch.vertices(), batch.indices())?;
        }
        Ok(true)
    }
}

/// Material kinds the pipeline keeps a [`BatchSet`] for.
pub trait PipelineMaterial: BatchMaterial + Sized {
    fn batch_set(pipeline: &mut RenderPipeline) -> &mut BatchSet<Self>;
}

impl PipelineMaterial for ColorMaterial {
    fn batch_set(pipeline: &mut RenderPipeline) -> &mut BatchSet<Self> {
        &mut pipeline.color
    }
}

impl PipelineMaterial for TextureMaterial {
    fn batch_set(pipeline: &mut RenderPipeline) -> &mut BatchSet<Self> {
        &mut pipeline.texture2d
    }
}

impl PipelineMaterial for CubemapMaterial {
    fn batch_set(pipeline: &mut RenderPipeline) -> &mut BatchSet<Self> {
        &mut pipeline.cubemap
    }
}

// ── RenderPipeline ────────────────────────────────────────────────────────────

/// Owns every batch, the light list, and the resolved render camera.
///
/// Each full submission bumps `epoch`; membership records from an older
/// epoch no longer address anything.
pub struct RenderPipeline {
    limits: BatchLimits,
    epoch: u64,
    color: BatchSet<ColorMaterial>,
    texture2d: BatchSet<TextureMaterial>,
    cubemap: BatchSet<CubemapMaterial>,
    lights: PointLightBatch,
    camera: RenderCamera,
    main_camera: Option<Entity>,
    game_camera: Option<RenderCamera>,
    camera_buffer: Option<BufferId>,
}

impl RenderPipeline {
    pub fn new(limits: BatchLimits) -> Self {
        Self {
            limits,
            epoch: 0,
            color: BatchSet::new(limits),
            texture2d: BatchSet::new(limits),
            cubemap: BatchSet::new(limits),
            lights: PointLightBatch::new(limits.max_lights),
            camera: RenderCamera::default(),
            main_camera: None,
            game_camera: None,
            camera_buffer: None,
        }
    }

    pub fn limits(&self) -> &BatchLimits {
        &self.limits
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Drops every batch and light and starts a new epoch. GPU buffers must
    /// have been released first.
    pub fn reset(&mut self) {
        debug_assert!(!self.has_gpu_buffers(), "reset with live GPU buffers");
        self.color.batches.clear();
        self.texture2d.batches.clear();
        self.cubemap.batches.clear();
        self.lights.reset();
        self.main_camera = None;
        self.game_camera = None;
        self.epoch += 1;
        info!("render pipeline reset (epoch {})", self.epoch);
    }

    /// First batch of material `M` that accepts `entity`, or a new empty
    /// one appended for it. The caller submits into the returned batch.
    pub fn find_or_create_batch<M: PipelineMaterial, S: ComponentAccess>(
        &mut self,
        store: &S,
        entity: Entity,
    ) -> (usize, &mut MeshBatch<M>) {
        M::batch_set(self).find_or_create(store, entity)
    }

    /// Places a renderable entity in a batch. `None` if it has no material
    /// or cannot fit even an empty batch.
    pub fn submit_entity<S: ComponentAccess>(&mut self, store: &S, entity: Entity) -> Option<MeshBatchMembership> {
        let epoch = self.epoch;
        match material_kind_of(store, entity)? {
            MaterialKind::Color => self.color.submit(store, entity, epoch),
            MaterialKind::Texture2D => self.texture2d.submit(store, entity, epoch),
            MaterialKind::Cubemap => self.cubemap.submit(store, entity, epoch),
        }
    }

    /// Adds a point light. `None` once the light batch is full.
    pub fn submit_light<S: ComponentAccess>(&mut self, store: &S, entity: Entity) -> Option<LightBatchMembership> {
        if !self.lights.can_accept(store, entity) {
            if self.lights.is_full() {
                warn!("light batch full ({}), light {:?} not submitted", self.lights.capacity(), entity);
            }
            return None;
        }
        let slot = self.lights.submit_entity(store, entity)?;
        Some(LightBatchMembership { slot, epoch: self.epoch })
    }

    /// Takes `entity` as the scene's main camera if none was adopted yet.
    pub fn adopt_main_camera(&mut self, entity: Entity, transform: &Transform, camera: &Camera) -> bool {
        if self.main_camera.is_some() || !camera.is_main() {
            return false;
        }
        self.main_camera = Some(entity);
        self.game_camera = Some(RenderCamera::calculate(transform, camera));
        true
    }

    /// Recomputes the main camera's matrices. Ignored for any other entity.
    pub fn update_game_camera(&mut self, entity: Entity, transform: &Transform, camera: &Camera) -> bool {
        if self.main_camera != Some(entity) {
            return false;
        }
        self.game_camera = Some(RenderCamera::calculate(transform, camera));
        true
    }

    /// Matrices of the adopted main camera, if the scene has one.
    pub fn game_camera(&self) -> Option<&RenderCamera> {
        self.game_camera.as_ref()
    }

    pub fn set_render_camera(&mut self, camera: RenderCamera) {
        self.camera = camera;
    }

    // -- GPU buffers ----------------------------------------------------------

    pub fn has_gpu_buffers(&self) -> bool {
        self.camera_buffer.is_some()
            || self.lights.buffer.is_some()
            || self.color.batches.iter().any(|b| b.buffers.is_some())
            || self.texture2d.batches.iter().any(|b| b.buffers.is_some())
            || self.cubemap.batches.iter().any(|b| b.buffers.is_some())
    }

    /// Allocates and fills the buffers of every batch, then the shared light
    /// and camera buffers.
    pub fn create_gpu_buffers<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        label: &str,
        camera: &CameraUniform,
    ) -> Result<(), RenderError> {
        self.release_gpu_buffers(backend);
        self.color.create_buffers(backend, label)?;
        self.texture2d.create_buffers(backend, label)?;
        self.cubemap.create_buffers(backend, label)?;
        self.lights.buffer = Some(buffers::create_light_buffer(backend, &self.lights, label)?);
        self.camera_buffer = Some(buffers::create_camera_buffer(backend, camera, label)?);
        Ok(())
    }

    pub fn release_gpu_buffers<B: GpuBackend>(&mut self, backend: &mut B) {
        self.color.release_buffers(backend);
        self.texture2d.release_buffers(backend);
        self.cubemap.release_buffers(backend);
        for id in [self.lights.buffer.take(), self.camera_buffer.take()].into_iter().flatten() {
            backend.destroy_buffer(id);
        }
    }

    // -- In-place patches -----------------------------------------------------

    pub fn patch_transform<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        membership: &MeshBatchMembership,
        matrix: Mat4,
    ) -> Result<bool, RenderError> {
        match membership.kind {
            MaterialKind::Color => self.color.patch_transform(backend, membership, matrix),
            MaterialKind::Texture2D => self.texture2d.patch_transform(backend, membership, matrix),
            MaterialKind::Cubemap => self.cubemap.patch_transform(backend, membership, matrix),
        }
    }

    pub fn patch_geometry<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        membership: &MeshBatchMembership,
        renderable: &Renderable,
    ) -> Result<bool, RenderError> {
        match membership.kind {
            MaterialKind::Color => self.color.patch_geometry(backend, membership, renderable),
            MaterialKind::Texture2D => self.texture2d.patch_geometry(backend, membership, renderable),
            MaterialKind::Cubemap => self.cubemap.patch_geometry(backend, membership, renderable),
        }
    }

    pub fn patch_color<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        membership: &MeshBatchMembership,
        color: &Color,
    ) -> Result<bool, RenderError> {
        if membership.kind != MaterialKind::Color {
            return Ok(false);
        }
        let Some(batch) = self.color.batch_mut(membership) else {
            return Ok(false);
        };
        if !batch.update_material(membership.slot, ColorMaterial::from_component(color, membership.slot)) {
            return Ok(false);
        }
        if let Some(gpu) = batch.buffers {
            buffers::write_color_slot(backend, &gpu, membership.slot, color.0)?;
        }
        Ok(true)
    }

    /// Texture residency is resolved at draw time, so only the host path changes.
    pub fn patch_texture(&mut self, membership: &MeshBatchMembership, texture: &Texture2D) -> bool {
        if membership.kind != MaterialKind::Texture2D {
            return false;
        }
        self.texture2d
            .batch_mut(membership)
            .is_some_and(|b| b.update_material(membership.slot, TextureMaterial::from_component(texture, membership.slot)))
    }

    pub fn patch_light<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        membership: &LightBatchMembership,
        light: &crate::components::PointLight,
        position: glam::Vec3,
    ) -> Result<bool, RenderError> {
        if !self.lights.update_at(membership.slot, light, position) {
            return Ok(false);
        }
        if let Some(id) = self.lights.buffer {
            buffers::write_light_slot(backend, id, membership.slot, &self.lights.lights()[membership.slot])?;
        }
        Ok(true)
    }

    /// Replaces the render camera and rewrites the camera buffer if it exists.
    pub fn upload_camera<B: GpuBackend>(&mut self, backend: &mut B, camera: RenderCamera) -> Result<(), RenderError> {
        self.camera = camera;
        if let Some(id) = self.camera_buffer {
            buffers::write_camera(backend, id, &camera.uniform())?;
        }
        Ok(())
    }

    // -- Accessors ------------------------------------------------------------

    pub fn color_batches(&self) -> &[ColorBatch] {
        self.color.batches()
    }

    pub fn texture2d_batches(&self) -> &[Texture2DBatch] {
        self.texture2d.batches()
    }

    pub fn cubemap_batches(&self) -> &[CubemapBatch] {
        self.cubemap.batches()
    }

    pub fn light_batch(&self) -> &PointLightBatch {
        &self.lights
    }

    pub fn render_camera(&self) -> &RenderCamera {
        &self.camera
    }

    pub fn main_camera(&self) -> Option<Entity> {
        self.main_camera
    }

    pub fn camera_buffer(&self) -> Option<BufferId> {
        self.camera_buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Shape;
    use crate::scene::Scene;

    #[test]
    fn oversized_mesh_is_skipped_without_leaving_an_empty_batch() {
        let limits = BatchLimits { max_vertices: 4, ..BatchLimits::DEFAULT };
        let mut pipeline = RenderPipeline::new(limits);
        let mut scene = Scene::new("t");
        let e = scene.spawn("cube");
        scene.insert(e, Renderable::from_shape(Shape::Cube));
        scene.insert(e, Color::default());

        assert!(pipeline.submit_entity(&scene, e).is_none());
        assert!(pipeline.color_batches().is_empty());
    }

    #[test]
    fn material_priority_prefers_color() {
        let mut scene = Scene::new("t");
        let e = scene.spawn("e");
        scene.insert(e, Renderable::from_shape(Shape::Cube));
        scene.insert(e, Texture2D { path: "a.png".into() });
        assert_eq!(material_kind_of(&scene, e), Some(MaterialKind::Texture2D));
        scene.insert(e, Color::default());
        assert_eq!(material_kind_of(&scene, e), Some(MaterialKind::Color));
        scene.remove::<Renderable>(e);
        assert_eq!(material_kind_of(&scene, e), None);
    }

    #[test]
    fn only_first_main_camera_is_adopted() {
        let mut pipeline = RenderPipeline::new(BatchLimits::DEFAULT);
        let mut scene = Scene::new("t");
        let a = scene.spawn("a");
        let b = scene.spawn("b");
        let cam = Camera::main(crate::components::Projection::DEFAULT_PERSPECTIVE);
        assert!(pipeline.adopt_main_camera(a, &Transform::default(), &cam));
        assert!(!pipeline.adopt_main_camera(b, &Transform::default(), &cam));
        assert_eq!(pipeline.main_camera(), Some(a));
    }
}
