use log::info;

use crate::error::RenderError;

use super::backend::{BufferDesc, BufferId, BufferUsage, GpuBackend};
use super::mesh_pipeline::{DEPTH_FORMAT, MeshPipeline};
use super::pipeline::RenderPipeline;

/// [`GpuBackend`] on a real wgpu device.
pub struct WgpuBackend {
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    buffers: Vec<Option<wgpu::Buffer>>,
}

impl WgpuBackend {
    /// Opens the default adapter without a surface.
    pub async fn new_headless() -> Result<Self, RenderError> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .map_err(|e| RenderError::AdapterUnavailable(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .map_err(|e| RenderError::DeviceRequest(e.to_string()))?;

        info!("wgpu adapter: {}", adapter.get_info().name);
        Ok(Self::from_device(device, queue))
    }

    pub fn from_device(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue, buffers: Vec::new() }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffers.get(id.0 as usize)?.as_ref()
    }

    fn buffer_or_err(&self, id: BufferId) -> Result<&wgpu::Buffer, RenderError> {
        self.buffer(id).ok_or(RenderError::UnknownBuffer(id))
    }

    /// Records one indexed draw per color batch into an offscreen target of
    /// `width` × `height` and submits it. Returns the number of draws issued.
    pub fn render_color_batches(
        &self,
        pipeline: &RenderPipeline,
        mesh: &MeshPipeline,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<u32, RenderError> {
        let (Some(camera), Some(lights)) = (pipeline.camera_buffer(), pipeline.light_batch().buffer()) else {
            return Ok(0);
        };

        let size = wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 };
        let target = |label: &str, format: wgpu::TextureFormat| {
            self.device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };
        let color_view = target("offscreen_color", format);
        let depth_view = target("offscreen_depth", DEPTH_FORMAT);

        let scene_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh_scene_bg"),
            layout: &mesh.scene_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: self.buffer_or_err(camera)?.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: self.buffer_or_err(lights)?.as_entire_binding() },
            ],
        });

        let mut batch_bind_groups = Vec::new();
        for batch in pipeline.color_batches() {
            let Some(gpu) = batch.buffers() else { continue };
            let Some(colors) = gpu.colors else { continue };
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("mesh_batch_bg"),
                layout: &mesh.batch_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: self.buffer_or_err(gpu.transforms)?.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 1, resource: self.buffer_or_err(colors)?.as_entire_binding() },
                ],
            });
            let vertex = self.buffer_or_err(gpu.vertex)?;
            let index = self.buffer_or_err(gpu.index)?;
            batch_bind_groups.push((bind_group, vertex, index, batch.indices().len() as u32));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("mesh_encoder") });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mesh_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color_view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_pipeline(&mesh.render_pipeline);
            pass.set_bind_group(0, &scene_bind_group, &[]);
            for (bind_group, vertex, index, count) in &batch_bind_groups {
                pass.set_bind_group(1, bind_group, &[]);
                pass.set_vertex_buffer(0, vertex.slice(..));
                pass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..*count, 0, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(batch_bind_groups.len() as u32)
    }
}

impl GpuBackend for WgpuBackend {
    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferId, RenderError> {
        let max = self.device.limits().max_buffer_size;
        if desc.size > max {
            return Err(RenderError::BufferAllocation { label: desc.label.clone(), size: desc.size, max });
        }
        let usage = match desc.usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
            BufferUsage::Storage => wgpu::BufferUsages::STORAGE,
        } | wgpu::BufferUsages::COPY_DST;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&desc.label),
            size: desc.size,
            usage,
            mapped_at_creation: false,
        });
        let id = match self.buffers.iter().position(Option::is_none) {
            Some(free) => {
                self.buffers[free] = Some(buffer);
                free
            }
            None => {
                self.buffers.push(Some(buffer));
                self.buffers.len() - 1
            }
        };
        Ok(BufferId(id as u32))
    }

    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), RenderError> {
        let buffer = self.buffer_or_err(id)?;
        let size = buffer.size();
        let len = data.len() as u64;
        if offset.checked_add(len).is_none_or(|end| end > size) {
            return Err(RenderError::WriteOutOfBounds { id, offset, len, size });
        }
        self.queue.write_buffer(buffer, offset, data);
        Ok(())
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        if let Some(buffer) = self.buffers.get_mut(id.0 as usize).and_then(Option::take) {
            buffer.destroy();
        }
    }
}
