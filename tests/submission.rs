use glam::Vec3;

use marbatch::RenderEngine;
use marbatch::components::{
    Camera, Color, LightBatchMembership, MaterialKind, MeshBatchMembership, PointLight, Projection, Renderable,
    Texture2D, TextureCubemap, Transform,
};
use marbatch::config::EngineConfig;
use marbatch::ecs::ComponentAccess;
use marbatch::geometry::Shape;
use marbatch::renderer::{BatchLimits, HostBackend};
use marbatch::scene::Scene;
use marbatch::RenderError;

fn engine_with(limits: BatchLimits) -> RenderEngine<HostBackend> {
    let config = EngineConfig { limits, ..EngineConfig::default() };
    RenderEngine::new(config, HostBackend::new())
}

#[test]
fn entities_are_routed_by_material() {
    let mut scene = Scene::new("t");
    let colored = scene.spawn("colored");
    scene.insert(colored, Renderable::from_shape(Shape::Cube));
    scene.insert(colored, Color::default());
    let textured = scene.spawn("textured");
    scene.insert(textured, Renderable::from_shape(Shape::Surface));
    scene.insert(textured, Texture2D { path: "floor.png".into() });
    let sky = scene.spawn("sky");
    scene.insert(sky, Renderable::from_shape(Shape::Cube));
    scene.insert(sky, TextureCubemap { path: "skybox".into() });
    let bare = scene.spawn("bare");
    scene.insert(bare, Renderable::from_shape(Shape::Wall));

    let mut engine = engine_with(BatchLimits::DEFAULT);
    engine.submit_scene(&mut scene);

    assert_eq!(engine.color_batches().len(), 1);
    assert_eq!(engine.texture2d_batches().len(), 1);
    assert_eq!(engine.cubemap_batches().len(), 1);
    assert_eq!(scene.get::<MeshBatchMembership>(textured).unwrap().kind, MaterialKind::Texture2D);
    assert_eq!(scene.get::<MeshBatchMembership>(sky).unwrap().kind, MaterialKind::Cubemap);
    assert!(scene.get::<MeshBatchMembership>(bare).is_none());
}

#[test]
fn nested_entities_are_submitted_depth_first() {
    let mut scene = Scene::new("t");
    let parent = scene.spawn("parent");
    let child = scene.spawn_child(parent, "child").unwrap();
    let sibling = scene.spawn("sibling");
    for e in [sibling, child, parent] {
        scene.insert(e, Renderable::from_shape(Shape::Pyramid));
        scene.insert(e, Color::default());
    }

    let mut engine = engine_with(BatchLimits::DEFAULT);
    engine.submit_scene(&mut scene);

    let slot = |e| scene.get::<MeshBatchMembership>(e).unwrap().slot;
    assert_eq!((slot(parent), slot(child), slot(sibling)), (0, 1, 2));
}

#[test]
fn lights_and_first_main_camera_are_collected() {
    let mut scene = Scene::new("t");
    let lamp = scene.spawn("lamp");
    scene.insert(lamp, Transform::from_position(Vec3::new(0.0, 4.0, 0.0)));
    scene.insert(lamp, PointLight::default());
    let first = scene.spawn("cam_a");
    scene.insert(first, Camera::main(Projection::DEFAULT_PERSPECTIVE));
    let second = scene.spawn("cam_b");
    scene.insert(second, Camera::main(Projection::DEFAULT_ORTHOGRAPHIC));

    let mut engine = engine_with(BatchLimits::DEFAULT);
    engine.submit_scene(&mut scene);

    assert_eq!(engine.light_batch().len(), 1);
    assert_eq!(engine.light_batch().lights()[0].position, [0.0, 4.0, 0.0, 1.0]);
    assert_eq!(scene.get::<LightBatchMembership>(lamp).unwrap().slot, 0);
    assert_eq!(engine.pipeline().main_camera(), Some(first));
}

#[test]
fn resubmission_is_deterministic() {
    let mut scene = Scene::new("t");
    for i in 0..40 {
        let e = scene.spawn(&format!("e{i}"));
        scene.insert(e, Renderable::from_shape(Shape::ALL[i % 4]));
        scene.insert(e, Color::default());
    }
    let mut engine = engine_with(BatchLimits::DEFAULT);
    engine.submit_scene(&mut scene);
    let first: Vec<_> = scene.walk().iter().map(|&e| scene.get::<MeshBatchMembership>(e).unwrap().clone()).collect();
    engine.submit_scene(&mut scene);
    let second: Vec<_> = scene.walk().iter().map(|&e| scene.get::<MeshBatchMembership>(e).unwrap().clone()).collect();

    for (a, b) in first.iter().zip(&second) {
        assert_eq!((a.kind, a.batch, a.slot, &a.vertices, &a.indices), (b.kind, b.batch, b.slot, &b.vertices, &b.indices));
        assert_eq!(b.epoch, a.epoch + 1);
    }
    assert_eq!(engine.color_batches().len(), 2);
}

#[test]
fn statistics_summarise_the_pipeline() {
    let mut scene = Scene::new("t");
    for _ in 0..3 {
        let e = scene.spawn("cube");
        scene.insert(e, Renderable::from_shape(Shape::Cube));
        scene.insert(e, Color::default());
    }
    let mut engine = engine_with(BatchLimits::DEFAULT);
    engine.submit_scene(&mut scene);
    engine.record_draw_calls(1);

    let stats = engine.statistics();
    assert_eq!(stats.color_batches, 1);
    assert_eq!(stats.entities, 3);
    assert_eq!(stats.vertices, 24);
    assert_eq!(stats.triangles, 36);
    assert_eq!(stats.draw_calls, 1);

    engine.begin_frame();
    assert_eq!(engine.statistics().draw_calls, 0);
}

#[test]
fn buffer_creation_failure_is_reported() {
    let mut scene = Scene::new("t");
    let e = scene.spawn("cube");
    scene.insert(e, Renderable::from_shape(Shape::Cube));
    scene.insert(e, Color::default());

    let backend = HostBackend::with_max_buffer_size(1024);
    let mut engine = RenderEngine::new(EngineConfig::default(), backend);
    engine.submit_scene(&mut scene);
    assert!(matches!(engine.on_batches_ready_to_draw(), Err(RenderError::BufferAllocation { .. })));
}

#[test]
fn failed_buffer_creation_leaves_nothing_allocated() {
    let mut scene = Scene::new("t");
    let e = scene.spawn("quad");
    scene.insert(e, Renderable::from_shape(Shape::Surface));
    scene.insert(e, Color::default());

    let limits = BatchLimits { max_vertices: 100, max_indices: 10_000, ..BatchLimits::DEFAULT };
    let config = EngineConfig { limits, ..EngineConfig::default() };
    let mut engine = RenderEngine::new(config, HostBackend::with_max_buffer_size(4096));
    engine.submit_scene(&mut scene);

    assert!(engine.on_batches_ready_to_draw().is_err());
    assert_eq!(engine.backend().live_buffers(), 0);
    assert!(!engine.pipeline().has_gpu_buffers());

    engine.submit_scene(&mut scene);
    assert_eq!(engine.backend().live_buffers(), 0);
}

#[test]
fn main_camera_without_transform_is_adopted_at_the_origin() {
    let mut scene = Scene::new("t");
    let camera = scene.spawn("camera");
    scene.insert(camera, Camera::main(Projection::DEFAULT_PERSPECTIVE));
    scene.remove::<Transform>(camera);

    let mut engine = engine_with(BatchLimits::DEFAULT);
    engine.submit_scene(&mut scene);

    assert_eq!(engine.pipeline().main_camera(), Some(camera));
    assert_eq!(engine.pipeline().game_camera().unwrap().position, Vec3::ZERO);
}
