use std::fmt;

use crate::renderer::mesh_batch::{BatchMaterial, MeshBatch};
use crate::renderer::pipeline::RenderPipeline;

/// Snapshot of what the pipeline currently holds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStatistics {
    pub color_batches: usize,
    pub texture2d_batches: usize,
    pub cubemap_batches: usize,
    pub entities: usize,
    pub vertices: usize,
    pub indices: usize,
    pub triangles: usize,
    pub lights: usize,
    pub draw_calls: u32,
}

impl RenderStatistics {
    pub fn collect(pipeline: &RenderPipeline, draw_calls: u32) -> Self {
        let mut stats = RenderStatistics {
            color_batches: pipeline.color_batches().len(),
            texture2d_batches: pipeline.texture2d_batches().len(),
            cubemap_batches: pipeline.cubemap_batches().len(),
            lights: pipeline.light_batch().len(),
            draw_calls,
            ..Default::default()
        };
        stats.add_batches(pipeline.color_batches());
        stats.add_batches(pipeline.texture2d_batches());
        stats.add_batches(pipeline.cubemap_batches());
        stats.triangles = stats.indices / 3;
        stats
    }

    fn add_batches<M: BatchMaterial>(&mut self, batches: &[MeshBatch<M>]) {
        for batch in batches {
            self.entities += batch.len();
            self.vertices += batch.vertices().len();
            self.indices += batch.indices().len();
        }
    }

    pub fn batches(&self) -> usize {
        self.color_batches + self.texture2d_batches + self.cubemap_batches
    }
}

impl fmt::Display for RenderStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} batches ({} color, {} texture, {} cubemap), {} entities, {} verts, {} tris, {} lights, {} draw calls",
            self.batches(),
            self.color_batches,
            self.texture2d_batches,
            self.cubemap_batches,
            self.entities,
            self.vertices,
            self.triangles,
            self.lights,
            self.draw_calls,
        )
    }
}
