use std::sync::Arc;

use tracereplay_core::gpu::{
    AccelerationStructureInstance,
    Barrier,
    BottomLevelAccelerationStructureInfo,
    Buffer,
    BufferUsage,
    ClearColor,
    CommandBuffer,
    CommandPool,
    RayGenerationShader,
    TopLevelAccelerationStructureInfo,
};

use crate::buffer::BufferInner;
use crate::rt::{AccelerationStructureInner, AccelerationStructureKind};
use crate::*;

pub(crate) enum RecordedCommand {
    Barrier {
        count: u32,
    },
    Clear {
        backbuffer_index: u32,
        color: ClearColor,
    },
    CopyToBackbuffer {
        backbuffer_index: u32,
    },
    BuildBottomLevel {
        acceleration_structure: Arc<AccelerationStructureInner>,
        vertex_count: u32,
    },
    UploadInstances {
        target: Arc<BufferInner>,
        offset: u64,
        instances: Vec<(Arc<AccelerationStructureInner>, InstanceDescriptor)>,
    },
    BuildTopLevel {
        acceleration_structure: Arc<AccelerationStructureInner>,
        instances_buffer: Arc<BufferInner>,
        instances_offset: u64,
        instances_count: u32,
    },
    TraceRays {
        shader: RayGenerationShader,
        width: u32,
        height: u32,
        depth: u32,
        bound_acceleration_structures_built: bool,
    },
}

impl RecordedCommand {
    /// Runs on the queue thread.
    pub(crate) fn execute(self, shared: &HeadlessShared) {
        match self {
            RecordedCommand::Barrier { count } => shared.record(HeadlessEvent::Barrier { count }),
            RecordedCommand::Clear { backbuffer_index, color } => {
                shared.record(HeadlessEvent::Clear { backbuffer_index, color })
            }
            RecordedCommand::CopyToBackbuffer { backbuffer_index } => {
                shared.record(HeadlessEvent::CopyToBackbuffer { backbuffer_index })
            }
            RecordedCommand::BuildBottomLevel { acceleration_structure, vertex_count } => {
                acceleration_structure.mark_built();
                shared.record(HeadlessEvent::BottomLevelBuilt {
                    va: acceleration_structure.va(),
                    vertex_count,
                });
            }
            RecordedCommand::UploadInstances { target, offset, instances } => {
                let all_bottom_levels_built = instances.iter().all(|(blas, _)| blas.is_built());
                let descriptors: Vec<InstanceDescriptor> = instances.iter().map(|(_, d)| *d).collect();
                target.write(offset, bytemuck::cast_slice(&descriptors));
                shared.record(HeadlessEvent::InstancesUploaded {
                    instance_count: descriptors.len() as u32,
                    all_bottom_levels_built,
                });
            }
            RecordedCommand::BuildTopLevel { acceleration_structure, instances_buffer, instances_offset, instances_count } => {
                let bytes = instances_buffer.read(instances_offset, instances_count as u64 * InstanceDescriptor::SIZE);
                let instances: Vec<InstanceDescriptor> = bytes
                    .chunks_exact(InstanceDescriptor::SIZE as usize)
                    .map(bytemuck::pod_read_unaligned)
                    .collect();
                acceleration_structure.mark_built();
                shared.record(HeadlessEvent::TopLevelBuilt {
                    va: acceleration_structure.va(),
                    instances,
                });
            }
            RecordedCommand::TraceRays { shader, width, height, depth, bound_acceleration_structures_built } => {
                shared.record(HeadlessEvent::TraceRays {
                    shader,
                    width,
                    height,
                    depth,
                    bound_acceleration_structures_built,
                });
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandBufferState {
    Ready,
    Recording,
    Finished,
    Submitted,
}

pub struct HeadlessCommandPool {}

impl CommandPool<HeadlessBackend> for HeadlessCommandPool {
    unsafe fn create_command_buffer(&mut self) -> HeadlessCommandBuffer {
        HeadlessCommandBuffer {
            commands: Vec::new(),
            state: CommandBufferState::Ready,
            frame: 0,
        }
    }
}

pub struct HeadlessCommandBuffer {
    commands: Vec<RecordedCommand>,
    state: CommandBufferState,
    frame: u64,
}

impl HeadlessCommandBuffer {
    pub(crate) fn take_commands(&mut self) -> Vec<RecordedCommand> {
        assert_eq!(self.state, CommandBufferState::Finished, "Command buffer of frame {} was not finished before submission", self.frame);
        self.state = CommandBufferState::Submitted;
        std::mem::take(&mut self.commands)
    }

    fn push(&mut self, command: RecordedCommand) {
        assert_eq!(self.state, CommandBufferState::Recording);
        self.commands.push(command);
    }
}

impl CommandBuffer<HeadlessBackend> for HeadlessCommandBuffer {
    unsafe fn begin(&mut self, frame: u64) {
        assert_eq!(self.state, CommandBufferState::Ready);
        self.state = CommandBufferState::Recording;
        self.frame = frame;
    }

    unsafe fn finish(&mut self) {
        assert_eq!(self.state, CommandBufferState::Recording);
        self.state = CommandBufferState::Finished;
    }

    unsafe fn reset(&mut self, frame: u64) {
        self.commands.clear();
        self.state = CommandBufferState::Ready;
        self.frame = frame;
    }

    unsafe fn barrier(&mut self, barriers: &[Barrier<HeadlessBackend>]) {
        self.push(RecordedCommand::Barrier {
            count: barriers.len() as u32,
        });
    }

    unsafe fn clear_backbuffer(&mut self, _swapchain: &HeadlessSwapchain, backbuffer_index: u32, color: ClearColor) {
        self.push(RecordedCommand::Clear { backbuffer_index, color });
    }

    unsafe fn copy_output_to_backbuffer(&mut self, _swapchain: &HeadlessSwapchain, backbuffer_index: u32) {
        self.push(RecordedCommand::CopyToBackbuffer { backbuffer_index });
    }

    unsafe fn create_bottom_level_acceleration_structure(
        &mut self,
        info: &BottomLevelAccelerationStructureInfo<HeadlessBackend>,
        size: u64,
        target_buffer: &HeadlessBuffer,
        target_buffer_offset: u64,
        scratch_buffer: &HeadlessBuffer,
        scratch_buffer_offset: u64,
    ) -> HeadlessAccelerationStructure {
        assert!(target_buffer.info().usage.contains(BufferUsage::ACCELERATION_STRUCTURE));
        assert!(target_buffer_offset + size <= target_buffer.info().size);
        assert!(scratch_buffer_offset < scratch_buffer.info().size);
        assert!(info.vertex_count > 0 && info.vertex_count % 3 == 0);

        let acceleration_structure =
            HeadlessAccelerationStructure::new(AccelerationStructureKind::BottomLevel, target_buffer.inner(), target_buffer_offset);
        self.push(RecordedCommand::BuildBottomLevel {
            acceleration_structure: acceleration_structure.inner().clone(),
            vertex_count: info.vertex_count,
        });
        acceleration_structure
    }

    unsafe fn upload_top_level_instances(
        &mut self,
        instances: &[AccelerationStructureInstance<HeadlessBackend>],
        target_buffer: &HeadlessBuffer,
        target_buffer_offset: u64,
    ) {
        assert!(target_buffer_offset + instances.len() as u64 * InstanceDescriptor::SIZE <= target_buffer.info().size);
        let instances = instances
            .iter()
            .map(|instance| {
                let blas = instance.acceleration_structure.inner().clone();
                debug_assert_eq!(blas.kind(), AccelerationStructureKind::BottomLevel);
                let descriptor = InstanceDescriptor::new(
                    &instance.transform,
                    instance.id,
                    instance.mask,
                    instance.hit_group_offset,
                    instance.flags.bits(),
                    blas.va(),
                );
                (blas, descriptor)
            })
            .collect();
        self.push(RecordedCommand::UploadInstances {
            target: target_buffer.inner().clone(),
            offset: target_buffer_offset,
            instances,
        });
    }

    unsafe fn create_top_level_acceleration_structure(
        &mut self,
        info: &TopLevelAccelerationStructureInfo<HeadlessBackend>,
        size: u64,
        target_buffer: &HeadlessBuffer,
        target_buffer_offset: u64,
        scratch_buffer: &HeadlessBuffer,
        scratch_buffer_offset: u64,
    ) -> HeadlessAccelerationStructure {
        assert!(target_buffer.info().usage.contains(BufferUsage::ACCELERATION_STRUCTURE));
        assert!(target_buffer_offset + size <= target_buffer.info().size);
        assert!(scratch_buffer_offset < scratch_buffer.info().size);

        let acceleration_structure =
            HeadlessAccelerationStructure::new(AccelerationStructureKind::TopLevel, target_buffer.inner(), target_buffer_offset);
        self.push(RecordedCommand::BuildTopLevel {
            acceleration_structure: acceleration_structure.inner().clone(),
            instances_buffer: info.instances_buffer.inner().clone(),
            instances_offset: info.instances_buffer_offset,
            instances_count: info.instances_count,
        });
        acceleration_structure
    }

    unsafe fn trace_ray(&mut self, binding_table: &HeadlessBindingTable, shader: RayGenerationShader, width: u32, height: u32, depth: u32) {
        let bound_acceleration_structures_built = binding_table.bound_acceleration_structures_built();
        self.push(RecordedCommand::TraceRays {
            shader,
            width,
            height,
            depth,
            bound_acceleration_structures_built,
        });
    }
}
