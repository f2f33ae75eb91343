use tracereplay_core::gpu::GPUBackend;

use crate::*;

pub enum HeadlessBackend {}

impl GPUBackend for HeadlessBackend {
    type Device = HeadlessDevice;
    type Queue = HeadlessQueue;
    type Swapchain = HeadlessSwapchain;
    type CommandPool = HeadlessCommandPool;
    type CommandBuffer = HeadlessCommandBuffer;
    type Buffer = HeadlessBuffer;
    type Fence = HeadlessFence;
    type AccelerationStructure = HeadlessAccelerationStructure;
    type BindingTable = HeadlessBindingTable;
}
