//! Minimal component store the batching core reads from.
//!
//! Entities are generational handles; components are any `'static` type kept
//! in one sparse set per type. The renderer only talks to the store through
//! [`ComponentAccess`], so another store can stand in for [`World`].

mod sparse_set;

use std::any::TypeId;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use sparse_set::{ErasedColumn, SparseSet};

// ── Entity ────────────────────────────────────────────────────────────────────

/// Opaque handle: an index plus the generation it was allocated in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

// ── ComponentAccess ───────────────────────────────────────────────────────────

/// Capability interface the renderer consumes from an entity store.
pub trait ComponentAccess {
    fn contains(&self, entity: Entity) -> bool;
    fn has<T: 'static>(&self, entity: Entity) -> bool;
    fn get<T: 'static>(&self, entity: Entity) -> Option<&T>;
    fn get_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T>;
    fn insert<T: 'static>(&mut self, entity: Entity, component: T) -> Option<T>;
    fn remove<T: 'static>(&mut self, entity: Entity) -> Option<T>;
}

// ── Allocator ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Allocator {
    generations: Vec<u32>,
    recycled: Vec<u32>,
}

impl Allocator {
    fn allocate(&mut self) -> Entity {
        match self.recycled.pop() {
            Some(index) => Entity { index, generation: self.generations[index as usize] },
            None => {
                let index = self.generations.len() as u32;
                self.generations.push(0);
                Entity { index, generation: 0 }
            }
        }
    }

    fn free(&mut self, entity: Entity) -> bool {
        if !self.is_live(entity) {
            return false;
        }
        self.generations[entity.index as usize] += 1;
        self.recycled.push(entity.index);
        true
    }

    fn is_live(&self, entity: Entity) -> bool {
        self.generations.get(entity.index as usize) == Some(&entity.generation)
    }

    fn live_count(&self) -> usize {
        self.generations.len() - self.recycled.len()
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

/// Sparse-set entity/component store.
#[derive(Default)]
pub struct World {
    allocator: Allocator,
    columns: HashMap<TypeId, Box<dyn ErasedColumn>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> Entity {
        self.allocator.allocate()
    }

    /// Frees the handle and drops every component it carried.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.allocator.free(entity) {
            return false;
        }
        for column in self.columns.values_mut() {
            column.evict(entity.index);
        }
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_live(entity)
    }

    pub fn len(&self) -> usize {
        self.allocator.live_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entities currently carrying a `T`.
    pub fn count<T: 'static>(&self) -> usize {
        self.columns.get(&TypeId::of::<T>()).map_or(0, |c| c.len())
    }

    pub fn query<T: 'static>(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        let generations = &self.allocator.generations;
        self.column::<T>()
            .into_iter()
            .flat_map(|set| set.iter())
            .map(move |(index, value)| {
                (Entity { index, generation: generations[index as usize] }, value)
            })
    }

    fn column<T: 'static>(&self) -> Option<&SparseSet<T>> {
        self.columns
            .get(&TypeId::of::<T>())
            .and_then(|c| c.as_any().downcast_ref::<SparseSet<T>>())
    }

    fn column_mut<T: 'static>(&mut self) -> Option<&mut SparseSet<T>> {
        self.columns
            .get_mut(&TypeId::of::<T>())
            .and_then(|c| c.as_any_mut().downcast_mut::<SparseSet<T>>())
    }
}

impl ComponentAccess for World {
    fn contains(&self, entity: Entity) -> bool {
        self.is_alive(entity)
    }

    fn has<T: 'static>(&self, entity: Entity) -> bool {
        self.is_alive(entity) && self.column::<T>().is_some_and(|c| c.contains(entity.index))
    }

    fn get<T: 'static>(&self, entity: Entity) -> Option<&T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.column::<T>()?.get(entity.index)
    }

    fn get_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.column_mut::<T>()?.get_mut(entity.index)
    }

    /// Panics when `entity` has been despawned.
    fn insert<T: 'static>(&mut self, entity: Entity, component: T) -> Option<T> {
        assert!(self.is_alive(entity), "cannot insert component on dead entity");
        if self.column::<T>().is_none() {
            self.columns.insert(TypeId::of::<T>(), Box::new(SparseSet::<T>::new()));
        }
        self.column_mut::<T>()?.insert(entity.index, component)
    }

    fn remove<T: 'static>(&mut self, entity: Entity) -> Option<T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.column_mut::<T>()?.remove(entity.index)
    }
}
