use super::*;

pub trait GPUBackend: 'static + Sized {
  type Device: Device<Self> + Send + Sync;
  type Queue: Queue<Self> + Send + Sync;
  type Swapchain: Swapchain + Send + Sync;
  type CommandPool: CommandPool<Self> + Send;
  type CommandBuffer: CommandBuffer<Self> + Send;
  type Buffer: Buffer + Send + Sync;
  type Fence: Fence + Send + Sync;
  type AccelerationStructure: AccelerationStructure + Send + Sync;
  type BindingTable: BindingTable<Self> + Send + Sync;
}
