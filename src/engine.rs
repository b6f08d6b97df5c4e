//! The explicit render context a host loop owns and passes around.

use log::{debug, info};

use crate::camera::{CameraSource, EditorCamera, RenderCamera, SceneMode, resolve_camera_source};
use crate::components::{Camera, LightBatchMembership, MeshBatchMembership, PointLight, Renderable, Transform};
use crate::config::EngineConfig;
use crate::ecs::{ComponentAccess, Entity};
use crate::error::RenderError;
use crate::renderer::backend::GpuBackend;
use crate::renderer::light_batch::PointLightBatch;
use crate::renderer::mesh_batch::{ColorBatch, CubemapBatch, Texture2DBatch};
use crate::renderer::pipeline::RenderPipeline;
use crate::scene::Scene;
use crate::stats::RenderStatistics;

// ── RenderEngine ──────────────────────────────────────────────────────────────

/// Batches, GPU buffers, and camera state for one scene at a time.
pub struct RenderEngine<B: GpuBackend> {
    config: EngineConfig,
    backend: B,
    pipeline: RenderPipeline,
    mode: SceneMode,
    use_game_camera: bool,
    editor_camera: EditorCamera,
    draw_calls: u32,
}

impl<B: GpuBackend> RenderEngine<B> {
    pub fn new(config: EngineConfig, backend: B) -> Self {
        let pipeline = RenderPipeline::new(config.limits);
        Self {
            config,
            backend,
            pipeline,
            mode: SceneMode::Editor,
            use_game_camera: false,
            editor_camera: EditorCamera::default(),
            draw_calls: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut RenderPipeline, &mut B) {
        (&mut self.pipeline, &mut self.backend)
    }

    // -- Submission -----------------------------------------------------------

    /// Re-batches the whole scene from scratch.
    ///
    /// Entities are visited depth-first from the roots, so slots are stable
    /// until the next call. Membership records of the previous submission
    /// become stale.
    pub fn submit_scene(&mut self, scene: &mut Scene) {
        self.pipeline.release_gpu_buffers(&mut self.backend);
        self.pipeline.reset();

        for entity in scene.walk() {
            match self.pipeline.submit_entity(&*scene, entity) {
                Some(membership) => {
                    scene.insert(entity, membership);
                }
                None => {
                    scene.remove::<MeshBatchMembership>(entity);
                }
            }

            match self.pipeline.submit_light(&*scene, entity) {
                Some(membership) => {
                    scene.insert(entity, membership);
                }
                None => {
                    scene.remove::<LightBatchMembership>(entity);
                }
            }

            if let Some(camera) = scene.get::<Camera>(entity) {
                let transform = scene.get::<Transform>(entity).copied().unwrap_or_default();
                if self.pipeline.adopt_main_camera(entity, &transform, camera) {
                    debug!("main camera {:?} `{}`", entity, camera.id);
                }
            }
        }

        let camera = self.active_camera();
        self.pipeline.set_render_camera(camera);
        info!("submitted scene `{}`: {}", scene.name, self.statistics());
    }

    /// Creates and fills the GPU buffers of every batch, the light list, and
    /// the camera.
    pub fn on_batches_ready_to_draw(&mut self) -> Result<(), RenderError> {
        let camera = self.active_camera().uniform();
        let label = self.config.label_prefix.clone();
        self.pipeline.create_gpu_buffers(&mut self.backend, &label, &camera)
    }

    /// Full re-submission; recreates GPU buffers if they existed before.
    pub(crate) fn resubmit(&mut self, scene: &mut Scene) -> Result<(), RenderError> {
        let had_buffers = self.pipeline.has_gpu_buffers();
        self.submit_scene(scene);
        if had_buffers {
            self.on_batches_ready_to_draw()?;
        }
        Ok(())
    }

    // -- Camera ---------------------------------------------------------------

    pub fn camera_source(&self) -> CameraSource {
        resolve_camera_source(self.mode, self.use_game_camera)
    }

    /// Camera that should drive the GPU for the current mode. Falls back to
    /// the editor camera while the scene has no main camera.
    pub fn active_camera(&self) -> RenderCamera {
        match (self.camera_source(), self.pipeline.game_camera()) {
            (CameraSource::Game, Some(camera)) => *camera,
            _ => self.editor_camera.render_camera(),
        }
    }

    pub(crate) fn refresh_camera(&mut self) -> Result<(), RenderError> {
        let camera = self.active_camera();
        self.pipeline.upload_camera(&mut self.backend, camera)
    }

    pub fn scene_mode(&self) -> SceneMode {
        self.mode
    }

    pub fn set_scene_mode(&mut self, mode: SceneMode) -> Result<(), RenderError> {
        self.mode = mode;
        self.refresh_camera()
    }

    pub fn use_game_camera(&self) -> bool {
        self.use_game_camera
    }

    pub fn set_use_game_camera(&mut self, enabled: bool) -> Result<(), RenderError> {
        self.use_game_camera = enabled;
        self.refresh_camera()
    }

    pub fn editor_camera(&self) -> &EditorCamera {
        &self.editor_camera
    }

    pub fn set_editor_camera(&mut self, camera: EditorCamera) -> Result<(), RenderError> {
        self.editor_camera = camera;
        self.refresh_camera()
    }

    // -- Accessors ------------------------------------------------------------

    pub fn color_batches(&self) -> &[ColorBatch] {
        self.pipeline.color_batches()
    }

    pub fn texture2d_batches(&self) -> &[Texture2DBatch] {
        self.pipeline.texture2d_batches()
    }

    pub fn cubemap_batches(&self) -> &[CubemapBatch] {
        self.pipeline.cubemap_batches()
    }

    pub fn light_batch(&self) -> &PointLightBatch {
        self.pipeline.light_batch()
    }

    pub fn render_camera(&self) -> &RenderCamera {
        self.pipeline.render_camera()
    }

    /// Membership of `entity` if it belongs to the current submission.
    pub fn mesh_membership<S: ComponentAccess>(&self, store: &S, entity: Entity) -> Option<MeshBatchMembership> {
        store
            .get::<MeshBatchMembership>(entity)
            .filter(|m| m.epoch == self.pipeline.epoch())
            .cloned()
    }

    pub fn light_membership<S: ComponentAccess>(&self, store: &S, entity: Entity) -> Option<LightBatchMembership> {
        store
            .get::<LightBatchMembership>(entity)
            .filter(|m| m.epoch == self.pipeline.epoch())
            .copied()
    }

    // -- Statistics -----------------------------------------------------------

    /// Adds to the draw-call counter of the current frame.
    pub fn record_draw_calls(&mut self, count: u32) {
        self.draw_calls += count;
    }

    pub fn begin_frame(&mut self) {
        self.draw_calls = 0;
    }

    pub fn statistics(&self) -> RenderStatistics {
        RenderStatistics::collect(&self.pipeline, self.draw_calls)
    }
}

/// World-space position of a light, taken from the entity's transform.
pub(crate) fn light_state<S: ComponentAccess>(store: &S, entity: Entity) -> Option<(PointLight, glam::Vec3)> {
    let light = *store.get::<PointLight>(entity)?;
    let position = store.get::<Transform>(entity).map_or(glam::Vec3::ZERO, |t| t.position);
    Some((light, position))
}

/// Current renderable of `entity`, cloned so the scene can be borrowed again.
pub(crate) fn renderable_of<S: ComponentAccess>(store: &S, entity: Entity) -> Option<Renderable> {
    store.get::<Renderable>(entity).cloned()
}
