//! Batching core: mesh and light batches, the pipeline that owns them, and
//! the GPU buffers behind them.

pub mod backend;
pub mod buffers;
pub mod light_batch;
pub mod limits;
pub mod mesh_batch;
pub mod mesh_pipeline;
pub mod pipeline;
pub mod wgpu_backend;

pub use backend::{BufferDesc, BufferId, BufferUsage, GpuBackend, HostBackend};
pub use limits::BatchLimits;
pub use pipeline::RenderPipeline;
pub use wgpu_backend::WgpuBackend;
