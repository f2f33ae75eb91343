use super::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor(pub [f32; 4]);

pub trait CommandPool<B: GPUBackend> : Send {
  unsafe fn create_command_buffer(&mut self) -> B::CommandBuffer;
}

pub trait CommandBuffer<B: GPUBackend> : Send {
  unsafe fn begin(&mut self, frame: u64);
  unsafe fn finish(&mut self);
  unsafe fn reset(&mut self, frame: u64);

  unsafe fn barrier(&mut self, barriers: &[Barrier<B>]);

  unsafe fn clear_backbuffer(&mut self, swapchain: &B::Swapchain, backbuffer_index: u32, color: ClearColor);
  unsafe fn copy_output_to_backbuffer(&mut self, swapchain: &B::Swapchain, backbuffer_index: u32);

  // RT
  unsafe fn create_bottom_level_acceleration_structure(
    &mut self,
    info: &BottomLevelAccelerationStructureInfo<B>,
    size: u64,
    target_buffer: &B::Buffer,
    target_buffer_offset: u64,
    scratch_buffer: &B::Buffer,
    scratch_buffer_offset: u64
  ) -> B::AccelerationStructure;

  unsafe fn upload_top_level_instances(
    &mut self,
    instances: &[AccelerationStructureInstance<B>],
    target_buffer: &B::Buffer,
    target_buffer_offset: u64
  );

  unsafe fn create_top_level_acceleration_structure(
    &mut self,
    info: &TopLevelAccelerationStructureInfo<B>,
    size: u64,
    target_buffer: &B::Buffer,
    target_buffer_offset: u64,
    scratch_buffer: &B::Buffer,
    scratch_buffer_offset: u64
  ) -> B::AccelerationStructure;

  unsafe fn trace_ray(&mut self, binding_table: &B::BindingTable, shader: RayGenerationShader, width: u32, height: u32, depth: u32);
}

bitflags! {
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
  pub struct BarrierSync: u32 {
    const COMPUTE_SHADER               = 0b1;
    const COPY                         = 0b10;
    const HOST                         = 0b100;
    const ACCELERATION_STRUCTURE_BUILD = 0b1000;
    const RAY_TRACING                  = 0b10000;
  }
}

bitflags! {
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
  pub struct BarrierAccess: u32 {
    const CONSTANT_READ                = 0b1;
    const STORAGE_READ                 = 0b10;
    const STORAGE_WRITE                = 0b100;
    const COPY_READ                    = 0b1000;
    const COPY_WRITE                   = 0b10000;
    const SHADER_READ                  = 0b100000;
    const SHADER_WRITE                 = 0b1000000;
    const HOST_READ                    = 0b10000000;
    const HOST_WRITE                   = 0b100000000;
    const ACCELERATION_STRUCTURE_READ  = 0b1000000000;
    const ACCELERATION_STRUCTURE_WRITE = 0b10000000000;
  }
}

pub enum Barrier<'a, B: GPUBackend> {
  BufferBarrier {
    old_sync: BarrierSync,
    new_sync: BarrierSync,
    old_access: BarrierAccess,
    new_access: BarrierAccess,
    buffer: &'a B::Buffer,
    offset: u64,
    length: u64,
  },
  GlobalBarrier {
    old_sync: BarrierSync,
    new_sync: BarrierSync,
    old_access: BarrierAccess,
    new_access: BarrierAccess,
  }
}
