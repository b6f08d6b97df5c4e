//! The narrow "allocate / upload bytes at offset / free" surface every GPU
//! buffer mutation goes through.

use std::collections::HashMap;

use log::debug;

use crate::error::RenderError;

/// Handle to a buffer owned by a [`GpuBackend`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Vertex,
    Index,
    Storage,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferDesc {
    pub label: String,
    pub size: u64,
    pub usage: BufferUsage,
}

pub trait GpuBackend {
    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferId, RenderError>;

    /// Copies `data` into the buffer starting at byte `offset`.
    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), RenderError>;

    fn destroy_buffer(&mut self, id: BufferId);
}

fn check_write(id: BufferId, offset: u64, len: usize, size: u64) -> Result<(), RenderError> {
    let len = len as u64;
    if offset.checked_add(len).is_none_or(|end| end > size) {
        return Err(RenderError::WriteOutOfBounds { id, offset, len, size });
    }
    Ok(())
}

// ── HostBackend ───────────────────────────────────────────────────────────────

struct HostBuffer {
    desc: BufferDesc,
    bytes: Vec<u8>,
}

/// Keeps every buffer in host memory. Used headless and by tests to read
/// back exactly which bytes were written.
pub struct HostBackend {
    max_buffer_size: u64,
    next_id: u32,
    buffers: HashMap<BufferId, HostBuffer>,
    writes: usize,
}

impl HostBackend {
    /// Same ceiling wgpu's default limits place on a single buffer.
    pub const DEFAULT_MAX_BUFFER_SIZE: u64 = 256 << 20;

    pub fn new() -> Self {
        Self::with_max_buffer_size(Self::DEFAULT_MAX_BUFFER_SIZE)
    }

    pub fn with_max_buffer_size(max_buffer_size: u64) -> Self {
        Self { max_buffer_size, next_id: 0, buffers: HashMap::new(), writes: 0 }
    }

    pub fn contents(&self, id: BufferId) -> Option<&[u8]> {
        self.buffers.get(&id).map(|b| b.bytes.as_slice())
    }

    pub fn desc(&self, id: BufferId) -> Option<&BufferDesc> {
        self.buffers.get(&id).map(|b| &b.desc)
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Total `write_buffer` calls that succeeded.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl Default for HostBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuBackend for HostBackend {
    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferId, RenderError> {
        if desc.size > self.max_buffer_size {
            return Err(RenderError::BufferAllocation {
                label: desc.label.clone(),
                size: desc.size,
                max: self.max_buffer_size,
            });
        }
        let id = BufferId(self.next_id);
        self.next_id += 1;
        debug!("host buffer {:?} `{}` ({} bytes)", id, desc.label, desc.size);
        self.buffers.insert(id, HostBuffer { desc: desc.clone(), bytes: vec![0; desc.size as usize] });
        Ok(id)
    }

    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), RenderError> {
        let buffer = self.buffers.get_mut(&id).ok_or(RenderError::UnknownBuffer(id))?;
        check_write(id, offset, data.len(), buffer.desc.size)?;
        let start = offset as usize;
        buffer.bytes[start..start + data.len()].copy_from_slice(data);
        self.writes += 1;
        Ok(())
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        self.buffers.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(size: u64) -> BufferDesc {
        BufferDesc { label: "test".into(), size, usage: BufferUsage::Storage }
    }

    #[test]
    fn write_lands_at_offset() {
        let mut backend = HostBackend::new();
        let id = backend.create_buffer(&storage(8)).unwrap();
        backend.write_buffer(id, 4, &[1, 2, 3, 4]).unwrap();
        assert_eq!(backend.contents(id).unwrap(), &[0, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn overrun_is_rejected() {
        let mut backend = HostBackend::new();
        let id = backend.create_buffer(&storage(8)).unwrap();
        let err = backend.write_buffer(id, 6, &[0; 4]).unwrap_err();
        assert!(matches!(err, RenderError::WriteOutOfBounds { offset: 6, len: 4, size: 8, .. }));
    }

    #[test]
    fn oversized_allocation_fails() {
        let mut backend = HostBackend::with_max_buffer_size(16);
        assert!(matches!(
            backend.create_buffer(&storage(17)),
            Err(RenderError::BufferAllocation { size: 17, max: 16, .. })
        ));
    }

    #[test]
    fn destroyed_buffer_is_unknown() {
        let mut backend = HostBackend::new();
        let id = backend.create_buffer(&storage(4)).unwrap();
        backend.destroy_buffer(id);
        assert!(matches!(backend.write_buffer(id, 0, &[0]), Err(RenderError::UnknownBuffer(_))));
    }
}
