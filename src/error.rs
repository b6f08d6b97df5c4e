use thiserror::Error;

use crate::renderer::backend::BufferId;

/// Failures surfaced by GPU initialization and buffer management.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no suitable GPU adapter found: {0}")]
    AdapterUnavailable(String),

    #[error("failed to create device: {0}")]
    DeviceRequest(String),

    #[error("buffer `{label}` needs {size} bytes but the backend allows at most {max}")]
    BufferAllocation { label: String, size: u64, max: u64 },

    #[error("unknown buffer {0:?}")]
    UnknownBuffer(BufferId),

    #[error("write of {len} bytes at offset {offset} overruns buffer {id:?} of {size} bytes")]
    WriteOutOfBounds {
        id: BufferId,
        offset: u64,
        len: u64,
        size: u64,
    },
}

/// Failures while reading an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
