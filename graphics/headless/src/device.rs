use std::io::Result as IOResult;
use std::sync::Arc;

use tracereplay_core::align_up_64;
use tracereplay_core::gpu::{
    AccelerationStructureBuildFlags,
    AccelerationStructureInstance,
    AccelerationStructureSizes,
    BottomLevelAccelerationStructureInfo,
    BufferInfo,
    Device,
    Fence as _,
    MemoryUsage,
    OutOfMemoryError,
    TopLevelAccelerationStructureInfo,
};

use crate::queue::QueueItem;
use crate::*;

const ACCELERATION_STRUCTURE_ALIGNMENT: u64 = 256;
const BOTTOM_LEVEL_BYTES_PER_TRIANGLE: u64 = 64;
const TOP_LEVEL_BYTES_PER_INSTANCE: u64 = 128;
const ACCELERATION_STRUCTURE_HEADER_SIZE: u64 = 128;

#[derive(Debug, Clone)]
pub struct HeadlessDeviceInfo {
    pub supports_ray_tracing: bool,
    /// Total bytes the device may allocate. Allocations beyond fail with `OutOfMemoryError`.
    pub memory_budget: Option<u64>,
    /// Keep every event for `HeadlessDevice::events`. The log is never drained, long running
    /// processes should leave this off.
    pub record_events: bool,
}

impl Default for HeadlessDeviceInfo {
    fn default() -> Self {
        Self {
            supports_ray_tracing: true,
            memory_budget: None,
            record_events: true,
        }
    }
}

pub struct HeadlessDevice {
    shared: Arc<HeadlessShared>,
    queue: HeadlessQueue,
    supports_ray_tracing: bool,
}

impl HeadlessDevice {
    pub fn new(info: HeadlessDeviceInfo) -> IOResult<Self> {
        let shared = Arc::new(HeadlessShared::new(info.memory_budget, info.record_events));
        let queue = HeadlessQueue::new(&shared)?;
        log::info!("Created headless device, ray tracing supported: {}", info.supports_ray_tracing);
        Ok(Self {
            shared,
            queue,
            supports_ray_tracing: info.supports_ray_tracing,
        })
    }

    pub fn create_swapchain(&self, width: u32, height: u32, backbuffer_count: u32) -> HeadlessSwapchain {
        HeadlessSwapchain::new(width, height, backbuffer_count)
    }

    pub fn create_binding_table(&self) -> HeadlessBindingTable {
        HeadlessBindingTable::new(&self.shared)
    }

    /// Everything the timeline and the binding tables did so far, in order. Empty unless
    /// the device was created with `record_events`.
    pub fn events(&self) -> Vec<HeadlessEvent> {
        self.shared.events()
    }

    pub fn allocated_memory(&self) -> u64 {
        self.shared.allocated()
    }
}

impl Device<HeadlessBackend> for HeadlessDevice {
    unsafe fn create_buffer(&self, info: &BufferInfo, memory_usage: MemoryUsage, name: Option<&str>) -> Result<HeadlessBuffer, OutOfMemoryError> {
        HeadlessBuffer::new(&self.shared, info, memory_usage, name)
    }

    unsafe fn create_fence(&self) -> HeadlessFence {
        HeadlessFence::new()
    }

    unsafe fn wait_for_idle(&self) {
        let fence = HeadlessFence::new();
        self.queue.send(QueueItem::Signal {
            fence: fence.inner().clone(),
            value: 1,
        });
        fence.await_value(1);
    }

    fn graphics_queue(&self) -> &HeadlessQueue {
        &self.queue
    }

    fn supports_ray_tracing(&self) -> bool {
        self.supports_ray_tracing
    }

    unsafe fn get_bottom_level_acceleration_structure_size(&self, info: &BottomLevelAccelerationStructureInfo<HeadlessBackend>) -> AccelerationStructureSizes {
        let triangle_count = info.vertex_count as u64 / 3;
        let build_scratch_size = align_up_64(
            info.vertex_count as u64 * info.vertex_stride as u64 + ACCELERATION_STRUCTURE_HEADER_SIZE,
            ACCELERATION_STRUCTURE_ALIGNMENT,
        );
        AccelerationStructureSizes {
            size: align_up_64(
                triangle_count * BOTTOM_LEVEL_BYTES_PER_TRIANGLE + ACCELERATION_STRUCTURE_HEADER_SIZE,
                ACCELERATION_STRUCTURE_ALIGNMENT,
            ),
            build_scratch_size,
            update_scratch_size: if info.build_flags.contains(AccelerationStructureBuildFlags::ALLOW_UPDATE) {
                build_scratch_size
            } else {
                0
            },
        }
    }

    unsafe fn get_top_level_acceleration_structure_size(&self, info: &TopLevelAccelerationStructureInfo<HeadlessBackend>) -> AccelerationStructureSizes {
        let instances = info.instances_count as u64;
        let build_scratch_size = align_up_64(
            instances * InstanceDescriptor::SIZE + ACCELERATION_STRUCTURE_HEADER_SIZE,
            ACCELERATION_STRUCTURE_ALIGNMENT,
        );
        AccelerationStructureSizes {
            size: align_up_64(
                instances * TOP_LEVEL_BYTES_PER_INSTANCE + ACCELERATION_STRUCTURE_HEADER_SIZE,
                ACCELERATION_STRUCTURE_ALIGNMENT,
            ),
            build_scratch_size,
            update_scratch_size: if info.build_flags.contains(AccelerationStructureBuildFlags::ALLOW_UPDATE) {
                build_scratch_size
            } else {
                0
            },
        }
    }

    fn get_top_level_instances_buffer_size(&self, instances: &[AccelerationStructureInstance<HeadlessBackend>]) -> u64 {
        (instances.len() as u64 * InstanceDescriptor::SIZE).max(InstanceDescriptor::SIZE)
    }
}
