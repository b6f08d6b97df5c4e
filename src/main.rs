//! Headless demo: builds a small scene, batches it, uploads it, and patches a
//! few edits in place. Pass a JSON config path as the first argument to
//! override the default limits.

use glam::Vec3;
use log::{error, info, warn};

use marbatch::components::{Camera, Color, PointLight, Projection, Renderable, Texture2D, Transform};
use marbatch::config::EngineConfig;
use marbatch::ecs::ComponentAccess;
use marbatch::events::ComponentKind;
use marbatch::geometry::Shape;
use marbatch::renderer::mesh_pipeline::create_mesh_pipeline;
use marbatch::renderer::{GpuBackend, HostBackend, WgpuBackend};
use marbatch::scene::Scene;
use marbatch::{RenderEngine, RenderError};

const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

fn build_scene() -> Scene {
    let mut scene = Scene::new("demo");

    let floor = scene.spawn("floor");
    scene.insert(floor, Renderable::from_shape(Shape::Surface));
    scene.insert(floor, Texture2D { path: "resources/floor.png".into() });

    let props = scene.spawn("props");
    for i in 0..40 {
        let shape = Shape::ALL[i % 3];
        let Some(prop) = scene.spawn_child(props, &format!("prop_{i}")) else { continue };
        let x = (i % 8) as f32 * 3.0 - 10.5;
        let z = (i / 8) as f32 * -3.0;
        scene.insert(prop, Transform::from_position(Vec3::new(x, 0.0, z)).with_scale(Vec3::splat(0.5)));
        scene.insert(prop, Renderable::from_shape(shape));
        scene.insert(prop, Color([0.2 + 0.02 * i as f32, 0.5, 0.8, 1.0]));
    }

    let lamp = scene.spawn("lamp");
    scene.insert(lamp, Transform::from_position(Vec3::new(0.0, 4.0, 2.0)));
    scene.insert(lamp, PointLight::default());

    let camera = scene.spawn("camera");
    scene.insert(camera, Transform::from_position(Vec3::new(0.0, 2.0, 12.0)).with_rotation(Vec3::new(-10.0, -90.0, 0.0)));
    scene.insert(camera, Camera::main(Projection::DEFAULT_PERSPECTIVE));

    scene
}

/// Moves the first prop and recolors it, the way an editor gizmo would.
fn apply_edits<B: GpuBackend>(engine: &mut RenderEngine<B>, scene: &mut Scene) -> Result<(), RenderError> {
    let Some(prop) = scene.find_by_tag("prop_0") else {
        return Ok(());
    };
    if let Some(t) = scene.get_mut::<Transform>(prop) {
        t.position.y += 1.0;
    }
    let moved = engine.on_update(scene, prop, ComponentKind::Transform)?;

    scene.insert(prop, Color([1.0, 0.2, 0.2, 1.0]));
    let recolored = engine.on_update(scene, prop, ComponentKind::Color)?;
    info!("edits on prop_0: transform {moved:?}, color {recolored:?}");
    Ok(())
}

fn run_headless(config: EngineConfig, scene: &mut Scene) -> Result<(), RenderError> {
    let mut engine = RenderEngine::new(config, HostBackend::new());
    engine.submit_scene(scene);
    engine.on_batches_ready_to_draw()?;
    apply_edits(&mut engine, scene)?;
    info!("host backend: {} buffers, {} writes", engine.backend().live_buffers(), engine.backend().write_count());
    info!("{}", engine.statistics());
    Ok(())
}

fn run_gpu(config: EngineConfig, scene: &mut Scene) -> Result<(), RenderError> {
    let backend = pollster::block_on(WgpuBackend::new_headless())?;
    let mesh = create_mesh_pipeline(backend.device(), OFFSCREEN_FORMAT);

    let mut engine = RenderEngine::new(config, backend);
    engine.submit_scene(scene);
    engine.on_batches_ready_to_draw()?;
    apply_edits(&mut engine, scene)?;

    engine.begin_frame();
    let draws = engine.backend().render_color_batches(engine.pipeline(), &mesh, OFFSCREEN_FORMAT, 1280, 720)?;
    engine.record_draw_calls(draws);
    info!("{}", engine.statistics());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("{path}: {e}");
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    let mut scene = build_scene();
    if let Err(e) = run_gpu(config.clone(), &mut scene) {
        warn!("GPU path unavailable ({e}); falling back to host buffers");
        if let Err(e) = run_headless(config, &mut scene) {
            error!("{e}");
            std::process::exit(1);
        }
    }
}
