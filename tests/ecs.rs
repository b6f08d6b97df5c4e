use marbatch::ecs::*;

#[derive(Debug, PartialEq, Clone)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, PartialEq)]
struct Label(&'static str);

// -- lifecycle ------------------------------------------------------------------

#[test]
fn spawn_returns_unique_entities() {
    let mut world = World::new();
    let a = world.spawn();
    let b = world.spawn();
    assert_ne!(a, b);
}

#[test]
fn despawn_twice_returns_false() {
    let mut world = World::new();
    let e = world.spawn();
    assert!(world.despawn(e));
    assert!(!world.despawn(e));
    assert!(!world.contains(e));
}

#[test]
fn despawn_drops_every_component() {
    let mut world = World::new();
    let e = world.spawn();
    world.insert(e, Position { x: 0.0, y: 0.0 });
    world.insert(e, Label("crate"));
    world.despawn(e);

    let recycled = world.spawn();
    assert!(!world.has::<Position>(recycled));
    assert!(!world.has::<Label>(recycled));
    assert_eq!(world.count::<Position>(), 0);
}

// -- component access -----------------------------------------------------------

#[test]
fn insert_get_remove() {
    let mut world = World::new();
    let e = world.spawn();
    assert_eq!(world.insert(e, Position { x: 1.0, y: 2.0 }), None);
    assert!(world.has::<Position>(e));
    assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: 2.0 }));

    world.get_mut::<Position>(e).unwrap().x = 4.0;
    assert_eq!(world.remove::<Position>(e), Some(Position { x: 4.0, y: 2.0 }));
    assert!(world.get::<Position>(e).is_none());
    assert!(world.remove::<Position>(e).is_none());
}

#[test]
fn insert_overwrites_and_returns_previous() {
    let mut world = World::new();
    let e = world.spawn();
    world.insert(e, Label("a"));
    assert_eq!(world.insert(e, Label("b")), Some(Label("a")));
    assert_eq!(world.get::<Label>(e), Some(&Label("b")));
}

#[test]
#[should_panic(expected = "cannot insert component on dead entity")]
fn insert_on_dead_entity_panics() {
    let mut world = World::new();
    let e = world.spawn();
    world.despawn(e);
    world.insert(e, Label("ghost"));
}

#[test]
fn stale_handle_cannot_reach_new_entity() {
    let mut world = World::new();
    let old = world.spawn();
    world.despawn(old);
    let new = world.spawn();
    world.insert(new, Label("new"));

    assert_eq!(old.index(), new.index());
    assert!(world.get::<Label>(old).is_none());
    assert!(!world.has::<Label>(old));
}

// -- queries --------------------------------------------------------------------

#[test]
fn query_visits_each_owner_once() {
    let mut world = World::new();
    let a = world.spawn();
    let b = world.spawn();
    let c = world.spawn();
    world.insert(a, Label("a"));
    world.insert(b, Label("b"));
    world.insert(c, Label("c"));
    world.remove::<Label>(b);

    let mut seen: Vec<_> = world.query::<Label>().collect();
    seen.sort_by_key(|(e, _)| e.index());
    assert_eq!(seen, vec![(a, &Label("a")), (c, &Label("c"))]);
}

#[test]
fn query_on_unknown_type_is_empty() {
    let world = World::new();
    assert_eq!(world.query::<Position>().count(), 0);
}
