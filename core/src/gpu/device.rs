use super::*;

pub const WHOLE_BUFFER: u64 = u64::MAX;

pub trait Device<B: GPUBackend> {
  unsafe fn create_buffer(&self, info: &BufferInfo, memory_usage: MemoryUsage, name: Option<&str>) -> Result<B::Buffer, OutOfMemoryError>;
  unsafe fn create_fence(&self) -> B::Fence;
  unsafe fn wait_for_idle(&self);
  fn graphics_queue(&self) -> &B::Queue;
  fn supports_ray_tracing(&self) -> bool;
  unsafe fn get_bottom_level_acceleration_structure_size(&self, info: &BottomLevelAccelerationStructureInfo<B>) -> AccelerationStructureSizes;
  unsafe fn get_top_level_acceleration_structure_size(&self, info: &TopLevelAccelerationStructureInfo<B>) -> AccelerationStructureSizes;
  fn get_top_level_instances_buffer_size(&self, instances: &[AccelerationStructureInstance<B>]) -> u64;
}
