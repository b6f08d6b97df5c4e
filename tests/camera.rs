use glam::{Mat4, Vec3};

use marbatch::RenderEngine;
use marbatch::camera::{CameraSource, EditorCamera, RenderCamera, SceneMode, resolve_camera_source};
use marbatch::components::{Camera, Projection, Transform};
use marbatch::config::EngineConfig;
use marbatch::ecs::ComponentAccess;
use marbatch::renderer::HostBackend;
use marbatch::scene::Scene;

const EPS: f32 = 1e-5;

fn perspective_45() -> Camera {
    Camera::main(Projection::Perspective { fov: 45.0, aspect: 1.33, near: 0.01, far: 100.0 })
}

// ── Matrices ──────────────────────────────────────────────────────────────────

#[test]
fn ninety_degree_yaw_looks_down_positive_z() {
    let transform = Transform::default().with_rotation(Vec3::new(0.0, 90.0, 0.0));
    let cam = RenderCamera::calculate(&transform, &perspective_45());

    assert!(cam.forward.x.abs() < EPS);
    assert!(cam.forward.y.abs() < EPS);
    assert!((cam.forward.z - 1.0).abs() < EPS);

    // Row 2 of a right-handed view matrix is the negated forward axis.
    let view_forward = -cam.view.row(2).truncate();
    assert!((view_forward - cam.forward).length() < EPS);
}

#[test]
fn mvp_is_projection_times_view_with_identity_model() {
    let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0)).with_rotation(Vec3::new(20.0, 45.0, 0.0));
    let cam = RenderCamera::calculate(&transform, &perspective_45());
    assert_eq!(cam.model, Mat4::IDENTITY);
    assert_eq!(cam.mvp, cam.projection * cam.view);
    assert!(cam.view.transform_point3(transform.position).length() < EPS);
}

#[test]
fn projection_kind_follows_the_camera() {
    let transform = Transform::default();
    let ortho = Camera::main(Projection::DEFAULT_ORTHOGRAPHIC);
    let cam = RenderCamera::calculate(&transform, &ortho);
    // Orthographic projections keep w = 1.
    assert_eq!(cam.projection.row(3), glam::Vec4::new(0.0, 0.0, 0.0, 1.0));

    let cam = RenderCamera::calculate(&transform, &perspective_45());
    assert_eq!(cam.projection.row(3), glam::Vec4::new(0.0, 0.0, -1.0, 0.0));
}

#[test]
fn uniform_carries_position_and_matrices() {
    let transform = Transform::from_position(Vec3::new(4.0, 5.0, 6.0));
    let cam = RenderCamera::calculate(&transform, &perspective_45());
    let uniform = cam.uniform();
    assert_eq!(uniform.position, [4.0, 5.0, 6.0, 1.0]);
    assert_eq!(uniform.mvp, cam.mvp.to_cols_array_2d());
}

// ── Mode resolution ───────────────────────────────────────────────────────────

#[test]
fn camera_source_per_mode() {
    assert_eq!(resolve_camera_source(SceneMode::Play, false), CameraSource::Game);
    assert_eq!(resolve_camera_source(SceneMode::Pause, false), CameraSource::Game);
    assert_eq!(resolve_camera_source(SceneMode::Editor, false), CameraSource::Editor);
    assert_eq!(resolve_camera_source(SceneMode::Editor, true), CameraSource::Game);
}

fn scene_with_camera_at(position: Vec3) -> Scene {
    let mut scene = Scene::new("t");
    let cam = scene.spawn("camera");
    scene.insert(cam, Transform::from_position(position));
    scene.insert(cam, perspective_45());
    scene
}

#[test]
fn editor_mode_renders_through_the_fly_camera() {
    let mut scene = scene_with_camera_at(Vec3::new(0.0, 50.0, 0.0));
    let mut engine = RenderEngine::new(EngineConfig::default(), HostBackend::new());
    engine.submit_scene(&mut scene);

    assert_eq!(engine.render_camera().position, EditorCamera::default().position);
    engine.set_use_game_camera(true).unwrap();
    assert_eq!(engine.render_camera().position, Vec3::new(0.0, 50.0, 0.0));
}

#[test]
fn switching_to_play_uploads_the_game_camera() {
    let mut scene = scene_with_camera_at(Vec3::new(0.0, 50.0, 0.0));
    let mut engine = RenderEngine::new(EngineConfig::default(), HostBackend::new());
    engine.submit_scene(&mut scene);
    engine.on_batches_ready_to_draw().unwrap();

    let id = engine.pipeline().camera_buffer().unwrap();
    let editor_bytes = engine.backend().contents(id).unwrap().to_vec();
    assert_eq!(&editor_bytes[..16], bytemuck::cast_slice::<f32, u8>(&[0.0, 0.0, 10.0, 1.0]));

    engine.set_scene_mode(SceneMode::Play).unwrap();
    let bytes = engine.backend().contents(id).unwrap();
    assert_eq!(&bytes[..16], bytemuck::cast_slice::<f32, u8>(&[0.0, 50.0, 0.0, 1.0]));

    engine.set_scene_mode(SceneMode::Editor).unwrap();
    assert_eq!(engine.backend().contents(id).unwrap(), editor_bytes.as_slice());
}

#[test]
fn scene_without_main_camera_falls_back_to_editor() {
    let mut scene = Scene::new("t");
    let mut engine = RenderEngine::new(EngineConfig::default(), HostBackend::new());
    engine.set_scene_mode(SceneMode::Play).unwrap();
    engine.submit_scene(&mut scene);
    assert_eq!(engine.pipeline().main_camera(), None);
    assert_eq!(engine.render_camera().position, EditorCamera::default().position);
}
