use glam::Vec3;
use log::trace;

use crate::components::{PointLight, Transform};
use crate::ecs::{ComponentAccess, Entity};

use super::backend::BufferId;

/// Point light as laid out in the light storage buffer (80 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuPointLight {
    pub position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub shininess: f32,
}

impl GpuPointLight {
    pub fn new(light: &PointLight, position: Vec3) -> Self {
        Self {
            position: position.extend(1.0).to_array(),
            ambient: light.ambient.extend(0.0).to_array(),
            diffuse: light.diffuse.extend(0.0).to_array(),
            specular: light.specular.extend(0.0).to_array(),
            constant: light.constant,
            linear: light.linear,
            quadratic: light.quadratic,
            shininess: light.shininess,
        }
    }
}

/// Header preceding the light array in the storage buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightHeader {
    pub count: u32,
    pub _pad: [u32; 3],
}

/// Fixed-capacity list of point lights shared by the whole scene.
pub struct PointLightBatch {
    max_lights: usize,
    lights: Vec<GpuPointLight>,
    pub(crate) buffer: Option<BufferId>,
}

impl PointLightBatch {
    pub fn new(max_lights: usize) -> Self {
        Self { max_lights, lights: Vec::with_capacity(max_lights), buffer: None }
    }

    pub fn capacity(&self) -> usize {
        self.max_lights
    }

    pub fn is_full(&self) -> bool {
        self.lights.len() >= self.max_lights
    }

    /// True iff the batch has a free slot and `entity` carries a point light.
    pub fn can_accept<S: ComponentAccess>(&self, store: &S, entity: Entity) -> bool {
        let accepted = !self.is_full() && store.has::<PointLight>(entity);
        trace!("light batch {} {:?}", if accepted { "accepts" } else { "refuses" }, entity);
        accepted
    }

    pub fn submit(&mut self, light: &PointLight, position: Vec3) -> usize {
        debug_assert!(!self.is_full(), "light batch is full and cannot accept another light");
        self.lights.push(GpuPointLight::new(light, position));
        self.lights.len() - 1
    }

    pub fn submit_entity<S: ComponentAccess>(&mut self, store: &S, entity: Entity) -> Option<usize> {
        debug_assert!(self.can_accept(store, entity));
        let light = store.get::<PointLight>(entity)?;
        let position = store.get::<Transform>(entity).map_or(Vec3::ZERO, |t| t.position);
        Some(self.submit(light, position))
    }

    /// Overwrites the light at `slot`. Returns false for an unknown slot.
    pub fn update_at(&mut self, slot: usize, light: &PointLight, position: Vec3) -> bool {
        match self.lights.get_mut(slot) {
            Some(l) => {
                *l = GpuPointLight::new(light, position);
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.lights.clear();
    }

    pub fn lights(&self) -> &[GpuPointLight] {
        &self.lights
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn header(&self) -> LightHeader {
        LightHeader { count: self.lights.len() as u32, _pad: [0; 3] }
    }

    pub fn buffer(&self) -> Option<BufferId> {
        self.buffer
    }
}
