pub mod camera;
pub mod components;
pub mod config;
pub mod ecs;
pub mod engine;
pub mod error;
pub mod events;
pub mod geometry;
pub mod renderer;
pub mod scene;
pub mod stats;

pub use engine::RenderEngine;
pub use error::{ConfigError, RenderError};
