use serde::{Deserialize, Serialize};

/// Capacity ceilings shared by every batch an engine creates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchLimits {
    /// Vertices per mesh batch.
    pub max_vertices: usize,
    /// Indices per mesh batch.
    pub max_indices: usize,
    /// Entities (transform slots) per mesh batch.
    pub max_transforms: usize,
    /// Point lights in the light batch.
    pub max_lights: usize,
}

impl BatchLimits {
    pub const MAX_TRIANGLES: usize = 100_000;

    pub const DEFAULT: BatchLimits = BatchLimits {
        max_vertices: Self::MAX_TRIANGLES * 3,
        max_indices: Self::MAX_TRIANGLES * 3,
        max_transforms: 32,
        max_lights: 32,
    };
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}
