use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use log::{debug, trace};
use smallvec::SmallVec;
use tracereplay_core::gpu::{
    AccelerationStructureBuildFlags,
    AccelerationStructureInstance,
    AccelerationStructureInstanceFlags,
    Barrier,
    BarrierAccess,
    BarrierSync,
    BindingTable,
    BottomLevelAccelerationStructureInfo,
    BufferInfo,
    BufferUsage,
    CommandBuffer,
    CommandPool,
    Device,
    Format,
    GPUBackend,
    MemoryUsage,
    OutOfMemoryError,
    Queue,
    Submission,
    TopLevelAccelerationStructureInfo,
};

use super::{slots, upload_buffer, AccelerationStructure, TimelineFence};
use crate::scene::{SceneBuffers, TraceScene, Vertex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    OutOfMemory(OutOfMemoryError),
    RayTracingUnsupported,
    MapFailed(String),
}

impl Display for BuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::OutOfMemory(e) => write!(f, "{}", e),
            BuildError::RayTracingUnsupported => write!(f, "The device does not support hardware ray tracing"),
            BuildError::MapFailed(name) => write!(f, "Failed to map buffer {}", name),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::OutOfMemory(e) => Some(e),
            _ => None,
        }
    }
}

impl From<OutOfMemoryError> for BuildError {
    fn from(e: OutOfMemoryError) -> Self {
        BuildError::OutOfMemory(e)
    }
}

/// Counters the render thread can poll while the build thread works.
#[derive(Debug, Default)]
pub struct BuildProgress {
    bottom_levels_total: AtomicU32,
    bottom_levels_built: AtomicU32,
    top_level_built: AtomicBool,
}

impl BuildProgress {
    pub fn bottom_levels_total(&self) -> u32 {
        self.bottom_levels_total.load(Ordering::Acquire)
    }

    pub fn bottom_levels_built(&self) -> u32 {
        self.bottom_levels_built.load(Ordering::Acquire)
    }

    pub fn top_level_built(&self) -> bool {
        self.top_level_built.load(Ordering::Acquire)
    }
}

/// Everything the ray tracing shaders read for one loaded scene.
pub struct SceneResources<B: GPUBackend> {
    bottom_levels: Vec<AccelerationStructure<B>>,
    top_level: AccelerationStructure<B>,
    instances_buffer: B::Buffer,
    vertex_buffer: B::Buffer,
    instance_offset_buffer: B::Buffer,
    vertex_count: u32,
    instance_count: u32,
}

impl<B: GPUBackend> SceneResources<B> {
    pub fn bottom_levels(&self) -> &[AccelerationStructure<B>] {
        &self.bottom_levels
    }

    pub fn top_level(&self) -> &AccelerationStructure<B> {
        &self.top_level
    }

    pub fn instances_buffer(&self) -> &B::Buffer {
        &self.instances_buffer
    }

    pub fn vertex_buffer(&self) -> &B::Buffer {
        &self.vertex_buffer
    }

    pub fn instance_offset_buffer(&self) -> &B::Buffer {
        &self.instance_offset_buffer
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }
}

/// Builds the acceleration structures of a scene on the queue it shares with the
/// render loop, using its own command buffer and fence.
///
/// Only one build is in flight at a time: every bottom level structure is waited on
/// before the next one is recorded and the top level structure is only submitted after
/// all of them completed.
pub struct AccelerationStructureBuilder<B: GPUBackend> {
    device: Arc<B::Device>,
    _command_pool: B::CommandPool,
    command_buffer: B::CommandBuffer,
    fence: TimelineFence<B>,
    frame: u64,
}

impl<B: GPUBackend> AccelerationStructureBuilder<B> {
    pub fn new(device: &Arc<B::Device>) -> Result<Self, BuildError> {
        if !device.supports_ray_tracing() {
            return Err(BuildError::RayTracingUnsupported);
        }
        let mut command_pool = unsafe { device.graphics_queue().create_command_pool() };
        let command_buffer = unsafe { command_pool.create_command_buffer() };
        let fence = TimelineFence::new(device.as_ref());
        Ok(Self {
            device: device.clone(),
            _command_pool: command_pool,
            command_buffer,
            fence,
            frame: 0,
        })
    }

    pub fn build(
        &mut self,
        scene: &TraceScene,
        buffers: &SceneBuffers,
        binding_table: &B::BindingTable,
        progress: &BuildProgress,
    ) -> Result<SceneResources<B>, BuildError> {
        let geometries = scene.geometries();
        progress.bottom_levels_total.store(geometries.len() as u32, Ordering::Release);

        let mut bottom_levels = Vec::with_capacity(geometries.len());
        for (index, geometry) in geometries.iter().enumerate() {
            let name = format!("BottomLevelVertices{}", index);
            let bottom_level = self.build_bottom_level(geometry.vertices(), &name)?;
            trace!("Built bottom level acceleration structure {} with {} vertices", index, geometry.vertex_count());
            bottom_levels.push(bottom_level);
            progress.bottom_levels_built.fetch_add(1, Ordering::AcqRel);
        }

        let (top_level, instances_buffer) = self.build_top_level(scene, &bottom_levels)?;
        progress.top_level_built.store(true, Ordering::Release);
        debug!(
            "Built top level acceleration structure over {} instances of {} bottom levels",
            scene.instances().len(),
            bottom_levels.len()
        );

        let vertex_buffer = upload_buffer::<B, Vertex>(
            &self.device,
            &buffers.vertices,
            BufferUsage::STORAGE,
            "SceneVertices",
        )?;
        let instance_offset_buffer = upload_buffer::<B, u32>(
            &self.device,
            &buffers.instance_offsets,
            BufferUsage::STORAGE,
            "SceneInstanceOffsets",
        )?;

        let vertex_count = buffers.vertex_count();
        let instance_count = buffers.instance_offsets.len() as u32;
        unsafe {
            binding_table.bind_acceleration_structure(slots::ACCELERATION_STRUCTURE, top_level.handle());
            binding_table.bind_structured_buffer(
                slots::VERTICES,
                &vertex_buffer,
                0,
                vertex_count,
                std::mem::size_of::<Vertex>() as u32,
            );
            binding_table.bind_structured_buffer(
                slots::INSTANCE_OFFSETS,
                &instance_offset_buffer,
                0,
                instance_count,
                std::mem::size_of::<u32>() as u32,
            );
        }

        Ok(SceneResources {
            bottom_levels,
            top_level,
            instances_buffer,
            vertex_buffer,
            instance_offset_buffer,
            vertex_count,
            instance_count,
        })
    }

    fn build_bottom_level(&mut self, vertices: &[Vertex], name: &str) -> Result<AccelerationStructure<B>, BuildError> {
        debug_assert!(!vertices.is_empty() && vertices.len() % 3 == 0);
        let vertex_buffer = upload_buffer::<B, Vertex>(
            &self.device,
            vertices,
            BufferUsage::ACCELERATION_STRUCTURE_BUILD,
            name,
        )?;

        let info = BottomLevelAccelerationStructureInfo::<B> {
            vertex_format: Format::RGB32Float,
            vertex_stride: std::mem::size_of::<Vertex>() as u32,
            vertex_buffer: &vertex_buffer,
            vertex_buffer_offset: 0,
            vertex_count: vertices.len() as u32,
            opaque: true,
            build_flags: AccelerationStructureBuildFlags::PREFER_FAST_TRACE,
        };
        let sizes = unsafe { self.device.get_bottom_level_acceleration_structure_size(&info) };
        let scratch_buffer = self.create_scratch_buffer(sizes.build_scratch_size, "BottomLevelScratch")?;
        let buffer = self.create_result_buffer(sizes.size, "BottomLevelAccelerationStructure")?;

        self.begin();
        let acceleration_structure = unsafe {
            self.command_buffer.create_bottom_level_acceleration_structure(
                &info,
                sizes.size,
                &buffer,
                0,
                &scratch_buffer,
                0,
            )
        };
        self.completion_barrier();
        self.submit_and_wait();

        // The build is complete, neither the inputs nor the scratch memory are needed anymore.
        drop(scratch_buffer);
        drop(vertex_buffer);
        Ok(AccelerationStructure::new(acceleration_structure, buffer))
    }

    fn build_top_level(
        &mut self,
        scene: &TraceScene,
        bottom_levels: &[AccelerationStructure<B>],
    ) -> Result<(AccelerationStructure<B>, B::Buffer), BuildError> {
        let instances: Vec<AccelerationStructureInstance<B>> = scene
            .instances()
            .iter()
            .enumerate()
            .map(|(slot, instance)| AccelerationStructureInstance {
                acceleration_structure: bottom_levels[instance.blas_index as usize].handle(),
                transform: instance.transform,
                id: slot as u32,
                mask: 0xFF,
                hit_group_offset: 0,
                flags: AccelerationStructureInstanceFlags::empty(),
            })
            .collect();

        let instances_buffer_size = self.device.get_top_level_instances_buffer_size(&instances);
        let instances_buffer = unsafe {
            self.device.create_buffer(
                &BufferInfo {
                    size: instances_buffer_size,
                    usage: BufferUsage::ACCELERATION_STRUCTURE_INSTANCES,
                },
                MemoryUsage::MainMemoryWriteCombined,
                Some("TopLevelInstances"),
            )?
        };

        let info = TopLevelAccelerationStructureInfo::<B> {
            instances_buffer: &instances_buffer,
            instances_buffer_offset: 0,
            instances_count: instances.len() as u32,
            build_flags: AccelerationStructureBuildFlags::PREFER_FAST_TRACE,
        };
        let sizes = unsafe { self.device.get_top_level_acceleration_structure_size(&info) };
        let scratch_buffer = self.create_scratch_buffer(sizes.build_scratch_size, "TopLevelScratch")?;
        let buffer = self.create_result_buffer(sizes.size, "TopLevelAccelerationStructure")?;

        self.begin();
        let acceleration_structure = unsafe {
            self.command_buffer.upload_top_level_instances(&instances, &instances_buffer, 0);
            self.command_buffer.barrier(&[Barrier::BufferBarrier {
                old_sync: BarrierSync::HOST,
                new_sync: BarrierSync::ACCELERATION_STRUCTURE_BUILD,
                old_access: BarrierAccess::HOST_WRITE,
                new_access: BarrierAccess::ACCELERATION_STRUCTURE_READ,
                buffer: &instances_buffer,
                offset: 0,
                length: instances_buffer_size,
            }]);
            self.command_buffer.create_top_level_acceleration_structure(
                &info,
                sizes.size,
                &buffer,
                0,
                &scratch_buffer,
                0,
            )
        };
        self.completion_barrier();
        self.submit_and_wait();

        drop(scratch_buffer);
        Ok((AccelerationStructure::new(acceleration_structure, buffer), instances_buffer))
    }

    fn create_scratch_buffer(&self, size: u64, name: &str) -> Result<B::Buffer, BuildError> {
        let buffer = unsafe {
            self.device.create_buffer(
                &BufferInfo {
                    size,
                    usage: BufferUsage::ACCELERATION_STRUCTURE_BUILD | BufferUsage::STORAGE,
                },
                MemoryUsage::GPUMemory,
                Some(name),
            )?
        };
        Ok(buffer)
    }

    fn create_result_buffer(&self, size: u64, name: &str) -> Result<B::Buffer, BuildError> {
        let buffer = unsafe {
            self.device.create_buffer(
                &BufferInfo {
                    size,
                    usage: BufferUsage::ACCELERATION_STRUCTURE,
                },
                MemoryUsage::GPUMemory,
                Some(name),
            )?
        };
        Ok(buffer)
    }

    fn begin(&mut self) {
        self.frame += 1;
        unsafe {
            self.command_buffer.reset(self.frame);
            self.command_buffer.begin(self.frame);
        }
    }

    fn completion_barrier(&mut self) {
        let barriers: SmallVec<[Barrier<B>; 1]> = smallvec::smallvec![Barrier::GlobalBarrier {
            old_sync: BarrierSync::ACCELERATION_STRUCTURE_BUILD,
            new_sync: BarrierSync::ACCELERATION_STRUCTURE_BUILD | BarrierSync::RAY_TRACING,
            old_access: BarrierAccess::ACCELERATION_STRUCTURE_WRITE,
            new_access: BarrierAccess::ACCELERATION_STRUCTURE_READ,
        }];
        unsafe {
            self.command_buffer.barrier(&barriers);
        }
    }

    fn submit_and_wait(&mut self) {
        unsafe {
            self.command_buffer.finish();
        }
        let value = self.fence.next_signal_value();
        {
            let signal = [self.fence.signal_pair(value)];
            let mut command_buffers = [&mut self.command_buffer];
            unsafe {
                self.device.graphics_queue().submit(&mut [Submission {
                    command_buffers: &mut command_buffers,
                    wait_fences: &[],
                    signal_fences: &signal,
                }]);
            }
        }
        self.fence.await_value(value);
    }
}
