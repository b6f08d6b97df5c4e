//! Capacity-checked mesh batches.
//!
//! A batch concatenates the geometry of many same-material entities so they
//! can be drawn with one call. Every submission gets a slot; the slot indexes
//! the transform and material arrays and tags the entity's vertices, which is
//! what lets later edits patch one entity without re-batching.

use std::fmt::Debug;
use std::ops::Range;

use glam::Mat4;
use log::trace;

use crate::components::{Color, MaterialKind, Renderable, Texture2D, TextureCubemap, Transform};
use crate::ecs::{ComponentAccess, Entity};
use crate::geometry::Vertex;

use super::buffers::MeshBatchBuffers;
use super::limits::BatchLimits;

// ── Materials ─────────────────────────────────────────────────────────────────

/// Per-entity material attribute stored alongside each transform.
pub trait BatchMaterial: Clone + Debug {
    const KIND: MaterialKind;

    /// Component an entity must carry to enter this kind of batch.
    type Component: 'static;

    fn from_component(component: &Self::Component, slot: usize) -> Self;

    /// Element written to the batch's color storage buffer, if it has one.
    fn storage_element(&self) -> Option<[f32; 4]> {
        None
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColorMaterial(pub [f32; 4]);

impl BatchMaterial for ColorMaterial {
    const KIND: MaterialKind = MaterialKind::Color;
    type Component = Color;

    fn from_component(component: &Color, _slot: usize) -> Self {
        ColorMaterial(component.0)
    }

    fn storage_element(&self) -> Option<[f32; 4]> {
        Some(self.0)
    }
}

/// Texture path plus the sampler binding the shader reads it through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureMaterial {
    pub path: String,
    pub binding: u32,
}

impl BatchMaterial for TextureMaterial {
    const KIND: MaterialKind = MaterialKind::Texture2D;
    type Component = Texture2D;

    fn from_component(component: &Texture2D, slot: usize) -> Self {
        TextureMaterial { path: component.path.clone(), binding: slot as u32 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CubemapMaterial {
    pub path: String,
    pub binding: u32,
}

impl BatchMaterial for CubemapMaterial {
    const KIND: MaterialKind = MaterialKind::Cubemap;
    type Component = TextureCubemap;

    fn from_component(component: &TextureCubemap, slot: usize) -> Self {
        CubemapMaterial { path: component.path.clone(), binding: slot as u32 }
    }
}

// ── MeshBatch ─────────────────────────────────────────────────────────────────

/// Ranges one submission occupies in the concatenated arrays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchEntry {
    pub vertices: Range<usize>,
    pub indices: Range<usize>,
}

pub struct MeshBatch<M: BatchMaterial> {
    limits: BatchLimits,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    transforms: Vec<Mat4>,
    materials: Vec<M>,
    entries: Vec<BatchEntry>,
    next_shape_id: u32,
    index_base: u32,
    pub(crate) buffers: Option<MeshBatchBuffers>,
}

pub type ColorBatch = MeshBatch<ColorMaterial>;
pub type Texture2DBatch = MeshBatch<TextureMaterial>;
pub type CubemapBatch = MeshBatch<CubemapMaterial>;

impl<M: BatchMaterial> MeshBatch<M> {
    pub fn new(limits: BatchLimits) -> Self {
        Self {
            limits,
            vertices: Vec::new(),
            indices: Vec::new(),
            transforms: Vec::new(),
            materials: Vec::new(),
            entries: Vec::new(),
            next_shape_id: 0,
            index_base: 0,
            buffers: None,
        }
    }

    pub fn kind(&self) -> MaterialKind {
        M::KIND
    }

    pub fn limits(&self) -> &BatchLimits {
        &self.limits
    }

    /// Whether geometry of the given size still fits and a transform slot is free.
    pub fn fits(&self, vertex_count: usize, index_count: usize) -> bool {
        self.transforms.len() < self.limits.max_transforms
            && self.vertices.len() + vertex_count <= self.limits.max_vertices
            && self.indices.len() + index_count <= self.limits.max_indices
    }

    /// True iff `entity` carries a renderable and this batch's material
    /// component, and its geometry fits. Never mutates the batch.
    pub fn can_accept<S: ComponentAccess>(&self, store: &S, entity: Entity) -> bool {
        let Some(renderable) = store.get::<Renderable>(entity) else {
            return false;
        };
        if !store.has::<M::Component>(entity) {
            return false;
        }
        let accepted = self.fits(renderable.vertex_count(), renderable.index_count());
        trace!(
            "{:?} batch {} entity {:?} ({} verts, {} idx, slot {}/{})",
            M::KIND,
            if accepted { "accepts" } else { "refuses" },
            entity,
            renderable.vertex_count(),
            renderable.index_count(),
            self.transforms.len(),
            self.limits.max_transforms,
        );
        accepted
    }

    /// Appends one entity's geometry, transform, and material; returns its slot.
    ///
    /// The caller must have checked [`fits`](Self::fits) first.
    pub fn submit(&mut self, renderable: &Renderable, transform: &Transform, material: M) -> usize {
        debug_assert!(
            self.fits(renderable.vertex_count(), renderable.index_count()),
            "submitted to a {:?} batch that cannot accept it",
            M::KIND
        );

        let slot = self.transforms.len();
        let shape_id = self.next_shape_id as f32;
        let base = self.index_base;
        let vertex_start = self.vertices.len();
        let index_start = self.indices.len();

        self.vertices.extend(renderable.vertices.iter().map(|v| Vertex { shape_id, ..*v }));
        self.indices.extend(renderable.indices.iter().map(|i| i + base));
        self.transforms.push(transform.matrix());
        self.materials.push(material);
        self.entries.push(BatchEntry {
            vertices: vertex_start..self.vertices.len(),
            indices: index_start..self.indices.len(),
        });

        self.index_base += renderable.vertex_count() as u32;
        self.next_shape_id += 1;
        slot
    }

    /// Reads the entity's components and submits them. Returns `None` when a
    /// required component is missing.
    pub fn submit_entity<S: ComponentAccess>(&mut self, store: &S, entity: Entity) -> Option<usize> {
        debug_assert!(self.can_accept(store, entity));
        let renderable = store.get::<Renderable>(entity)?;
        let component = store.get::<M::Component>(entity)?;
        let transform = store.get::<Transform>(entity).copied().unwrap_or_default();
        let material = M::from_component(component, self.transforms.len());
        Some(self.submit(renderable, &transform, material))
    }

    /// Overwrites the transform at `slot`. Returns false for an unknown slot.
    pub fn update_transform(&mut self, slot: usize, matrix: Mat4) -> bool {
        match self.transforms.get_mut(slot) {
            Some(t) => {
                *t = matrix;
                true
            }
            None => false,
        }
    }

    pub fn update_material(&mut self, slot: usize, material: M) -> bool {
        match self.materials.get_mut(slot) {
            Some(m) => {
                *m = material;
                true
            }
            None => false,
        }
    }

    /// Replaces the geometry at `slot` in place. Only succeeds when the new
    /// vertex and index counts equal the old ones.
    pub fn update_geometry(&mut self, slot: usize, renderable: &Renderable) -> bool {
        let Some(entry) = self.entries.get(slot).cloned() else {
            return false;
        };
        if entry.vertices.len() != renderable.vertex_count()
            || entry.indices.len() != renderable.index_count()
        {
            return false;
        }

        let shape_id = slot as f32;
        let base = entry.vertices.start as u32;
        for (dst, src) in self.vertices[entry.vertices].iter_mut().zip(&renderable.vertices) {
            *dst = Vertex { shape_id, ..*src };
        }
        for (dst, src) in self.indices[entry.indices].iter_mut().zip(&renderable.indices) {
            *dst = src + base;
        }
        true
    }

    /// Empties the batch and zeroes its counters.
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.transforms.clear();
        self.materials.clear();
        self.entries.clear();
        self.next_shape_id = 0;
        self.index_base = 0;
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    pub fn materials(&self) -> &[M] {
        &self.materials
    }

    pub fn entry(&self, slot: usize) -> Option<&BatchEntry> {
        self.entries.get(slot)
    }

    /// Number of entities submitted since the last reset.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn next_shape_id(&self) -> u32 {
        self.next_shape_id
    }

    pub fn index_base(&self) -> u32 {
        self.index_base
    }

    pub fn buffers(&self) -> Option<&MeshBatchBuffers> {
        self.buffers.as_ref()
    }

    /// Color storage contents, or `None` for batches without a color buffer.
    pub fn material_storage(&self) -> Option<Vec<[f32; 4]>> {
        if M::KIND != MaterialKind::Color {
            return None;
        }
        Some(self.materials.iter().filter_map(M::storage_element).collect())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
