//! Reacting to component edits after a scene has been submitted.
//!
//! Value edits are patched into the slot recorded at submission time.
//! Structural edits (a component added or removed, geometry changing size)
//! invalidate every slot and re-submit the scene.

use log::{debug, warn};

use crate::components::{Camera, Color, Texture2D, Transform};
use crate::ecs::{ComponentAccess, Entity};
use crate::engine::{RenderEngine, light_state, renderable_of};
use crate::error::RenderError;
use crate::renderer::backend::GpuBackend;
use crate::scene::Scene;

/// Component families the dispatcher knows about.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Tag,
    Transform,
    Renderable,
    Color,
    Texture2D,
    TextureCubemap,
    PointLight,
    Camera,
    Script,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ComponentEvent {
    Added,
    Updated,
    Removed,
}

/// What a dispatched event did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Only the entity's own slots were rewritten.
    Patched,
    /// The scene was re-batched from scratch.
    Resubmitted,
    /// Nothing the renderer tracks was affected.
    Ignored,
    /// The edit is not allowed; the caller should undo it.
    Refused,
}

impl<B: GpuBackend> RenderEngine<B> {
    pub fn on_add(&mut self, scene: &mut Scene, entity: Entity, kind: ComponentKind) -> Result<DispatchOutcome, RenderError> {
        self.dispatch(scene, entity, kind, ComponentEvent::Added)
    }

    pub fn on_update(&mut self, scene: &mut Scene, entity: Entity, kind: ComponentKind) -> Result<DispatchOutcome, RenderError> {
        self.dispatch(scene, entity, kind, ComponentEvent::Updated)
    }

    pub fn on_remove(&mut self, scene: &mut Scene, entity: Entity, kind: ComponentKind) -> Result<DispatchOutcome, RenderError> {
        self.dispatch(scene, entity, kind, ComponentEvent::Removed)
    }

    /// Routes one component event. Must be called right after the edit,
    /// with `scene` already reflecting it.
    pub fn dispatch(
        &mut self,
        scene: &mut Scene,
        entity: Entity,
        kind: ComponentKind,
        event: ComponentEvent,
    ) -> Result<DispatchOutcome, RenderError> {
        use ComponentEvent::*;
        use ComponentKind as K;

        let outcome = match (kind, event) {
            (K::Tag | K::Script, _) => DispatchOutcome::Ignored,

            (K::Transform, Updated) => self.transform_updated(scene, entity)?,
            (K::Color, Updated) => self.color_updated(scene, entity)?,
            (K::Texture2D, Updated) => self.texture_updated(scene, entity),
            (K::Renderable, Updated) => self.renderable_updated(scene, entity)?,
            (K::PointLight, Updated) => self.light_updated(scene, entity)?,
            (K::Camera, Updated) => self.camera_updated(scene, entity)?,

            (K::Camera, Removed) if self.pipeline().main_camera() == Some(entity) => {
                warn!("main camera {:?} cannot be removed", entity);
                DispatchOutcome::Refused
            }
            (K::Camera, Removed) => DispatchOutcome::Ignored,

            // Cubemap edits swap GPU textures, which are rebuilt with the batches.
            (K::TextureCubemap, Updated) | (_, Added) | (_, Removed) => {
                self.resubmit(scene)?;
                DispatchOutcome::Resubmitted
            }
        };
        debug!("{:?} {:?} on {:?}: {:?}", kind, event, entity, outcome);
        Ok(outcome)
    }

    fn transform_updated(&mut self, scene: &mut Scene, entity: Entity) -> Result<DispatchOutcome, RenderError> {
        let Some(transform) = scene.get::<Transform>(entity).copied() else {
            return Ok(DispatchOutcome::Ignored);
        };
        let mut patched = false;

        if let Some(membership) = self.mesh_membership(&*scene, entity) {
            let (pipeline, backend) = self.parts_mut();
            patched |= pipeline.patch_transform(backend, &membership, transform.matrix())?;
        }

        if let (Some(membership), Some((light, position))) =
            (self.light_membership(&*scene, entity), light_state(&*scene, entity))
        {
            let (pipeline, backend) = self.parts_mut();
            patched |= pipeline.patch_light(backend, &membership, &light, position)?;
        }

        if let Some(camera) = scene.get::<Camera>(entity) {
            patched |= self.game_camera_changed(entity, &transform, camera)?;
        }

        Ok(patched_or_ignored(patched))
    }

    fn color_updated(&mut self, scene: &mut Scene, entity: Entity) -> Result<DispatchOutcome, RenderError> {
        let (Some(membership), Some(color)) = (self.mesh_membership(&*scene, entity), scene.get::<Color>(entity)) else {
            return Ok(DispatchOutcome::Ignored);
        };
        let (pipeline, backend) = self.parts_mut();
        Ok(patched_or_ignored(pipeline.patch_color(backend, &membership, color)?))
    }

    fn texture_updated(&mut self, scene: &mut Scene, entity: Entity) -> DispatchOutcome {
        let (Some(membership), Some(texture)) = (self.mesh_membership(&*scene, entity), scene.get::<Texture2D>(entity))
        else {
            return DispatchOutcome::Ignored;
        };
        let (pipeline, _) = self.parts_mut();
        patched_or_ignored(pipeline.patch_texture(&membership, texture))
    }

    fn renderable_updated(&mut self, scene: &mut Scene, entity: Entity) -> Result<DispatchOutcome, RenderError> {
        let (Some(membership), Some(renderable)) = (self.mesh_membership(&*scene, entity), renderable_of(&*scene, entity))
        else {
            return Ok(DispatchOutcome::Ignored);
        };
        let same_size = membership.vertices.len() == renderable.vertex_count()
            && membership.indices.len() == renderable.index_count();
        if !same_size {
            self.resubmit(scene)?;
            return Ok(DispatchOutcome::Resubmitted);
        }
        let (pipeline, backend) = self.parts_mut();
        Ok(patched_or_ignored(pipeline.patch_geometry(backend, &membership, &renderable)?))
    }

    fn light_updated(&mut self, scene: &mut Scene, entity: Entity) -> Result<DispatchOutcome, RenderError> {
        let (Some(membership), Some((light, position))) =
            (self.light_membership(&*scene, entity), light_state(&*scene, entity))
        else {
            return Ok(DispatchOutcome::Ignored);
        };
        let (pipeline, backend) = self.parts_mut();
        Ok(patched_or_ignored(pipeline.patch_light(backend, &membership, &light, position)?))
    }

    fn camera_updated(&mut self, scene: &mut Scene, entity: Entity) -> Result<DispatchOutcome, RenderError> {
        let Some(camera) = scene.get::<Camera>(entity).cloned() else {
            return Ok(DispatchOutcome::Ignored);
        };
        let transform = scene.get::<Transform>(entity).copied().unwrap_or_default();

        // A camera renamed into or out of the main role changes which entity
        // the pipeline adopts.
        let main = self.pipeline().main_camera();
        let adopted = main == Some(entity);
        if camera.is_main() != adopted && (adopted || main.is_none()) {
            self.resubmit(scene)?;
            return Ok(DispatchOutcome::Resubmitted);
        }

        Ok(patched_or_ignored(self.game_camera_changed(entity, &transform, &camera)?))
    }

    /// Recomputes the main camera, then re-uploads whichever camera drives the GPU.
    fn game_camera_changed(&mut self, entity: Entity, transform: &Transform, camera: &Camera) -> Result<bool, RenderError> {
        let (pipeline, _) = self.parts_mut();
        if !pipeline.update_game_camera(entity, transform, camera) {
            return Ok(false);
        }
        self.refresh_camera()?;
        Ok(true)
    }
}

fn patched_or_ignored(patched: bool) -> DispatchOutcome {
    if patched { DispatchOutcome::Patched } else { DispatchOutcome::Ignored }
}
