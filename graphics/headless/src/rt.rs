use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use tracereplay_core::gpu::AccelerationStructure;

use crate::buffer::BufferInner;

/// Instance record as the hardware consumes it, 64 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceDescriptor {
    pub transform: [f32; 12],
    pub id_and_mask: u32,
    pub hit_group_offset_and_flags: u32,
    pub acceleration_structure: u64,
}

impl InstanceDescriptor {
    pub const SIZE: u64 = std::mem::size_of::<InstanceDescriptor>() as u64;

    pub fn new(transform: &[[f32; 4]; 3], id: u32, mask: u8, hit_group_offset: u32, flags: u32, acceleration_structure: u64) -> Self {
        let mut flat = [0f32; 12];
        for (row_index, row) in transform.iter().enumerate() {
            flat[row_index * 4..row_index * 4 + 4].copy_from_slice(row);
        }
        Self {
            transform: flat,
            id_and_mask: (id & 0xFF_FFFF) | ((mask as u32) << 24),
            hit_group_offset_and_flags: (hit_group_offset & 0xFF_FFFF) | ((flags & 0xFF) << 24),
            acceleration_structure,
        }
    }

    pub fn id(&self) -> u32 {
        self.id_and_mask & 0xFF_FFFF
    }

    pub fn mask(&self) -> u8 {
        (self.id_and_mask >> 24) as u8
    }

    pub fn hit_group_offset(&self) -> u32 {
        self.hit_group_offset_and_flags & 0xFF_FFFF
    }

    pub fn flags(&self) -> u32 {
        self.hit_group_offset_and_flags >> 24
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccelerationStructureKind {
    BottomLevel,
    TopLevel,
}

pub(crate) struct AccelerationStructureInner {
    va: u64,
    kind: AccelerationStructureKind,
    built: AtomicBool,
    _buffer: Arc<BufferInner>,
}

impl AccelerationStructureInner {
    pub(crate) fn va(&self) -> u64 {
        self.va
    }

    pub(crate) fn kind(&self) -> AccelerationStructureKind {
        self.kind
    }

    pub(crate) fn is_built(&self) -> bool {
        self.built.load(Ordering::Acquire)
    }

    pub(crate) fn mark_built(&self) {
        self.built.store(true, Ordering::Release);
    }
}

pub struct HeadlessAccelerationStructure {
    inner: Arc<AccelerationStructureInner>,
}

impl HeadlessAccelerationStructure {
    pub(crate) fn new(kind: AccelerationStructureKind, buffer: &Arc<BufferInner>, offset: u64) -> Self {
        Self {
            inner: Arc::new(AccelerationStructureInner {
                va: buffer.va() + offset,
                kind,
                built: AtomicBool::new(false),
                _buffer: buffer.clone(),
            }),
        }
    }

    pub(crate) fn inner(&self) -> &Arc<AccelerationStructureInner> {
        &self.inner
    }

    /// Whether the queue thread has executed the build.
    pub fn is_built(&self) -> bool {
        self.inner.is_built()
    }

    pub fn is_top_level(&self) -> bool {
        self.inner.kind == AccelerationStructureKind::TopLevel
    }
}

impl AccelerationStructure for HeadlessAccelerationStructure {
    fn va(&self) -> u64 {
        self.inner.va
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_packs_id_mask_and_flags() {
        let transform = [[1.0, 0.0, 0.0, 2.0], [0.0, 1.0, 0.0, 3.0], [0.0, 0.0, 1.0, 4.0]];
        let descriptor = InstanceDescriptor::new(&transform, 7, 0xFF, 0, 0, 0x1_0000_0100);
        assert_eq!(InstanceDescriptor::SIZE, 64);
        assert_eq!(descriptor.id(), 7);
        assert_eq!(descriptor.mask(), 0xFF);
        assert_eq!(descriptor.hit_group_offset(), 0);
        assert_eq!(descriptor.flags(), 0);
        assert_eq!(descriptor.transform[3], 2.0);
        assert_eq!(descriptor.transform[11], 4.0);
    }
}
