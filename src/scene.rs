use crate::components::{Children, Tag, Transform};
use crate::ecs::{ComponentAccess, Entity, World};

/// Entity arena plus the parent/child structure the renderer walks.
///
/// Parents own their children through a [`Children`] list of handles; the
/// scene itself owns the list of roots.
pub struct Scene {
    pub name: String,
    world: World,
    roots: Vec<Entity>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), world: World::new(), roots: Vec::new() }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// New root entity with a [`Tag`] and a default [`Transform`].
    pub fn spawn(&mut self, tag: &str) -> Entity {
        let entity = self.spawn_bare(tag);
        self.roots.push(entity);
        entity
    }

    /// New entity nested under `parent`. Returns `None` if `parent` is dead.
    pub fn spawn_child(&mut self, parent: Entity, tag: &str) -> Option<Entity> {
        if !self.world.is_alive(parent) {
            return None;
        }
        let child = self.spawn_bare(tag);
        match self.world.get_mut::<Children>(parent) {
            Some(children) => children.0.push(child),
            None => {
                self.world.insert(parent, Children(vec![child]));
            }
        }
        Some(child)
    }

    fn spawn_bare(&mut self, tag: &str) -> Entity {
        let entity = self.world.spawn();
        self.world.insert(entity, Tag(tag.to_string()));
        self.world.insert(entity, Transform::default());
        entity
    }

    /// Removes `entity` and everything nested under it.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.world.is_alive(entity) {
            return false;
        }
        self.roots.retain(|&e| e != entity);
        let parents: Vec<Entity> = self.world.query::<Children>().map(|(e, _)| e).collect();
        for parent in parents {
            if let Some(children) = self.world.get_mut::<Children>(parent) {
                children.0.retain(|&e| e != entity);
            }
        }
        for e in self.subtree(entity) {
            self.world.despawn(e);
        }
        true
    }

    pub fn roots(&self) -> &[Entity] {
        &self.roots
    }

    pub fn children(&self, entity: Entity) -> &[Entity] {
        self.world.get::<Children>(entity).map(|c| c.0.as_slice()).unwrap_or(&[])
    }

    /// `entity` followed by its descendants, depth-first.
    pub fn subtree(&self, entity: Entity) -> Vec<Entity> {
        let mut out = Vec::new();
        let mut stack = vec![entity];
        while let Some(e) = stack.pop() {
            if !self.world.is_alive(e) {
                continue;
            }
            out.push(e);
            stack.extend(self.children(e).iter().rev());
        }
        out
    }

    /// Every live entity reachable from the roots, depth-first in spawn order.
    pub fn walk(&self) -> Vec<Entity> {
        self.roots.iter().flat_map(|&root| self.subtree(root)).collect()
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<Entity> {
        self.walk()
            .into_iter()
            .find(|&e| self.world.get::<Tag>(e).is_some_and(|t| t.0 == tag))
    }
}

impl ComponentAccess for Scene {
    fn contains(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    fn has<T: 'static>(&self, entity: Entity) -> bool {
        self.world.has::<T>(entity)
    }

    fn get<T: 'static>(&self, entity: Entity) -> Option<&T> {
        self.world.get::<T>(entity)
    }

    fn get_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        self.world.get_mut::<T>(entity)
    }

    fn insert<T: 'static>(&mut self, entity: Entity, component: T) -> Option<T> {
        self.world.insert(entity, component)
    }

    fn remove<T: 'static>(&mut self, entity: Entity) -> Option<T> {
        self.world.remove::<T>(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_is_depth_first_preorder() {
        let mut scene = Scene::new("test");
        let a = scene.spawn("a");
        let b = scene.spawn("b");
        let a1 = scene.spawn_child(a, "a1").unwrap();
        let a2 = scene.spawn_child(a, "a2").unwrap();
        let a1x = scene.spawn_child(a1, "a1x").unwrap();
        assert_eq!(scene.walk(), vec![a, a1, a1x, a2, b]);
    }

    #[test]
    fn despawn_removes_subtree_and_link() {
        let mut scene = Scene::new("test");
        let a = scene.spawn("a");
        let a1 = scene.spawn_child(a, "a1").unwrap();
        let a1x = scene.spawn_child(a1, "a1x").unwrap();
        assert!(scene.despawn(a1));
        assert!(!scene.world().is_alive(a1x));
        assert!(scene.children(a).is_empty());
        assert_eq!(scene.walk(), vec![a]);
    }

    #[test]
    fn spawned_entities_have_tag_and_transform() {
        let mut scene = Scene::new("test");
        let e = scene.spawn("cube");
        assert!(scene.has::<Transform>(e));
        assert_eq!(scene.find_by_tag("cube"), Some(e));
    }
}
