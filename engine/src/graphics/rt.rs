use tracereplay_core::gpu::{AccelerationStructure as _, GPUBackend};

/// A built acceleration structure and the buffer backing it.
pub struct AccelerationStructure<B: GPUBackend> {
    acceleration_structure: B::AccelerationStructure,
    buffer: B::Buffer,
}

impl<B: GPUBackend> AccelerationStructure<B> {
    pub(super) fn new(acceleration_structure: B::AccelerationStructure, buffer: B::Buffer) -> Self {
        Self {
            acceleration_structure,
            buffer,
        }
    }

    #[inline(always)]
    pub fn handle(&self) -> &B::AccelerationStructure {
        &self.acceleration_structure
    }

    #[inline(always)]
    pub fn va(&self) -> u64 {
        self.acceleration_structure.va()
    }

    #[inline(always)]
    pub fn buffer(&self) -> &B::Buffer {
        &self.buffer
    }
}
