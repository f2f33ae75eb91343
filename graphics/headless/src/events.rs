use tracereplay_core::gpu::{ClearColor, MemoryUsage, RayGenerationShader};

use crate::InstanceDescriptor;

#[derive(Debug, Clone, PartialEq)]
pub enum HeadlessEvent {
    BufferCreated {
        name: Option<String>,
        size: u64,
        memory_usage: MemoryUsage,
    },
    BufferDestroyed {
        name: Option<String>,
        size: u64,
    },
    /// Recorded on the CPU when a command buffer containing a top level build is submitted.
    TopLevelSubmitted {
        instance_count: u32,
        all_bottom_levels_complete: bool,
    },
    BottomLevelBuilt {
        va: u64,
        vertex_count: u32,
    },
    InstancesUploaded {
        instance_count: u32,
        all_bottom_levels_built: bool,
    },
    TopLevelBuilt {
        va: u64,
        instances: Vec<InstanceDescriptor>,
    },
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
    TraceRays {
        shader: RayGenerationShader,
        width: u32,
        height: u32,
        depth: u32,
        bound_acceleration_structures_built: bool,
    },
    Present {
        backbuffer_index: u32,
    },
    FenceSignalled {
        value: u64,
    },
    AccelerationStructureBound {
        slot: u32,
        va: u64,
    },
    StructuredBufferBound {
        slot: u32,
        element_count: u32,
        stride: u32,
    },
    ViewConstantsSet,
}
